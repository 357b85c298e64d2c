//! Shared types for the Mesa coordination core
//!
//! Domain models (orders, service requests, menu catalog), the command
//! error taxonomy, and small utility helpers used across crates.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use error::{CommandError, CommandResult};
pub use models::{
    MenuCategory, MenuItem, Order, OrderItem, OrderItemInput, OrderStatus, RequestDetails,
    RequestStatus, ServiceRequest, ServiceType,
};
