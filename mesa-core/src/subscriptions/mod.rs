//! Live query routing
//!
//! [`ViewScope`] pins down what each role may observe; the
//! [`SubscriptionRouter`] turns a scope into live store queries and
//! drives the attached listener.

pub mod router;
pub mod scope;

// Re-exports
pub use router::{ConnectivityStatus, SubscriptionRouter, ViewSubscription};
pub use scope::ViewScope;
