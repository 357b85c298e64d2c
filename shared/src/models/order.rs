//! Order Model

use serde::{Deserialize, Serialize};

/// Order lifecycle status.
///
/// Orders advance along a fixed forward chain; each status has exactly
/// one successor and `Completed` is terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Preparing,
    Ready,
    Served,
    Completed,
}

impl OrderStatus {
    /// The only status this one may advance to, if any.
    pub fn next(self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Pending => Some(OrderStatus::Preparing),
            OrderStatus::Preparing => Some(OrderStatus::Ready),
            OrderStatus::Ready => Some(OrderStatus::Served),
            OrderStatus::Served => Some(OrderStatus::Completed),
            OrderStatus::Completed => None,
        }
    }

    /// Whether `target` is the immediate successor of `self`.
    pub fn can_advance_to(self, target: OrderStatus) -> bool {
        self.next() == Some(target)
    }

    pub fn is_terminal(self) -> bool {
        self == OrderStatus::Completed
    }

    /// Active orders still occupy a table.
    pub fn is_active(self) -> bool {
        self != OrderStatus::Completed
    }

    /// Wire/storage string, matches the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Served => "served",
            OrderStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order line item
///
/// Snapshot copy of the menu data at order time; later catalog changes
/// never alter a placed order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
    pub name: String,
    /// Unit price in currency unit
    pub price: f64,
    pub quantity: i32,
}

/// Line item as submitted with a place-order command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemInput {
    pub name: String,
    /// Unit price in currency unit
    pub price: f64,
    pub quantity: i32,
}

impl From<OrderItemInput> for OrderItem {
    fn from(input: OrderItemInput) -> Self {
        OrderItem {
            name: input.name,
            price: input.price,
            quantity: input.quantity,
        }
    }
}

/// Order entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub table_number: String,
    pub items: Vec<OrderItem>,
    /// Total amount in currency unit, fixed at creation
    pub total: f64,
    pub status: OrderStatus,
    /// Kitchen estimate in minutes, set by staff after acceptance
    pub estimated_time: Option<u32>,
    /// Server-assigned epoch milliseconds
    pub created_at: i64,
    pub updated_at: i64,
}
