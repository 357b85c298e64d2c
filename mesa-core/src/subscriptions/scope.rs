//! Role query scopes
//!
//! Each role watches a fixed slice of the store: one orders query plus
//! one requests query. The shapes here are the single source of truth
//! for what a role is allowed to observe.

use shared::{OrderStatus, RequestStatus};

use crate::store::{Filter, Query, collections};

/// A role's interest in the live state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewScope {
    /// One table: its own not-yet-completed orders and still-active
    /// requests. Completed entities drop out of the diner's view.
    Client { table_number: String },
    /// The working set: orders the kitchen or floor still acts on
    /// (pending / preparing / ready) and unfinished requests.
    Staff,
    /// Everything, unfiltered, for all-time aggregates.
    Admin,
}

impl ViewScope {
    pub fn client(table_number: impl Into<String>) -> Self {
        ViewScope::Client {
            table_number: table_number.into(),
        }
    }

    /// Role label used in log fields.
    pub fn role(&self) -> &'static str {
        match self {
            ViewScope::Client { .. } => "client",
            ViewScope::Staff => "staff",
            ViewScope::Admin => "admin",
        }
    }

    pub fn orders_query(&self) -> Query {
        let base = Query::collection(collections::ORDERS).order_by_desc("created_at");
        match self {
            ViewScope::Client { table_number } => base
                .filter(Filter::eq("table_number", table_number.as_str()))
                .filter(Filter::is_in(
                    "status",
                    [
                        OrderStatus::Pending.as_str(),
                        OrderStatus::Preparing.as_str(),
                        OrderStatus::Ready.as_str(),
                        OrderStatus::Served.as_str(),
                    ],
                )),
            // served orders leave the board, completed ones the floor
            ViewScope::Staff => base.filter(Filter::is_in(
                "status",
                [
                    OrderStatus::Pending.as_str(),
                    OrderStatus::Preparing.as_str(),
                    OrderStatus::Ready.as_str(),
                ],
            )),
            ViewScope::Admin => base,
        }
    }

    pub fn requests_query(&self) -> Query {
        let base = Query::collection(collections::REQUESTS).order_by_desc("created_at");
        let active = || {
            Filter::is_in(
                "status",
                [
                    RequestStatus::Pending.as_str(),
                    RequestStatus::InProgress.as_str(),
                ],
            )
        };
        match self {
            ViewScope::Client { table_number } => base
                .filter(Filter::eq("table_number", table_number.as_str()))
                .filter(active()),
            ViewScope::Staff => base.filter(active()),
            ViewScope::Admin => base,
        }
    }
}
