//! Client cart
//!
//! Purely local pre-order state; the cart never touches the store. Lines
//! are snapshot copies of menu data, so a later catalog price change
//! does not silently reprice what the diner already picked.

use shared::{MenuItem, OrderItemInput};

use crate::lifecycle::money;

/// One menu item held in the cart.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    /// Menu item id this line was built from
    pub item_id: String,
    pub name: String,
    pub price: f64,
    pub quantity: i32,
}

impl CartLine {
    /// price × quantity for this line, 2-dp rounded.
    pub fn line_total(&self) -> f64 {
        money::line_total(self.price, self.quantity)
    }
}

/// Pre-order item collection for one table.
#[derive(Debug, Clone, Default)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one unit of a menu item; repeated adds bump the quantity.
    pub fn add(&mut self, item: &MenuItem) {
        if let Some(line) = self.lines.iter_mut().find(|l| l.item_id == item.id) {
            line.quantity += 1;
        } else {
            self.lines.push(CartLine {
                item_id: item.id.clone(),
                name: item.name.clone(),
                price: item.price,
                quantity: 1,
            });
        }
    }

    /// Set a line's quantity directly; zero or less removes the line.
    pub fn set_quantity(&mut self, item_id: &str, quantity: i32) {
        if quantity < 1 {
            self.remove(item_id);
            return;
        }
        if let Some(line) = self.lines.iter_mut().find(|l| l.item_id == item_id) {
            line.quantity = quantity;
        }
    }

    /// Remove the whole line regardless of its quantity.
    pub fn remove(&mut self, item_id: &str) {
        self.lines.retain(|l| l.item_id != item_id);
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Unit count across all lines (cart badge).
    pub fn item_count(&self) -> i32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Grand total over all lines.
    pub fn total(&self) -> f64 {
        money::order_total(&self.to_inputs())
    }

    /// The cart as place-order input.
    pub fn to_inputs(&self) -> Vec<OrderItemInput> {
        self.lines
            .iter()
            .map(|l| OrderItemInput {
                name: l.name.clone(),
                price: l.price,
                quantity: l.quantity,
            })
            .collect()
    }
}
