//! Data models
//!
//! Shared between the coordination core and any presentation layer.
//! Documents are stored as JSON; all timestamps are server-assigned
//! epoch milliseconds.

pub mod menu;
pub mod order;
pub mod request;

// Re-exports
pub use menu::*;
pub use order::*;
pub use request::*;
