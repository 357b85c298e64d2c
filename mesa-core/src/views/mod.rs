//! Role views - capability-scoped facades over engine and router
//!
//! One engine and one router serve all three roles; what differs per
//! role is the subscription scope and which commands the facade exposes:
//!
//! | View | Scope | Commands |
//! |------|-------|----------|
//! | [`ClientView`] | own table | place order, create requests |
//! | [`StaffView`] | active working set | transition orders, accept / complete requests |
//! | [`AdminView`] | everything | none (read-only) |
//!
//! Visible state always derives from the subscription; a command's
//! return value is immediate feedback only, and the authoritative echo
//! arrives through the router like for every other observer.

pub mod admin;
pub mod cart;
pub mod client;
pub mod staff;

// Re-exports
pub use admin::AdminView;
pub use cart::{Cart, CartLine};
pub use client::ClientView;
pub use staff::StaffView;

use shared::{Order, ServiceRequest};

use crate::lifecycle::stats::DashboardStats;
use crate::subscriptions::ConnectivityStatus;

/// Presentation collaborator, invoked on every subscription delivery.
///
/// All methods default to no-ops so an implementor only overrides what
/// its surface actually renders. Callbacks run on the subscription
/// worker tasks; implementations should hand work off rather than block.
pub trait ViewListener: Send + Sync {
    fn orders_changed(&self, _orders: &[Order]) {}

    fn requests_changed(&self, _requests: &[ServiceRequest]) {}

    /// Aggregates recomputed over the view's current snapshots.
    fn aggregates_changed(&self, _stats: &DashboardStats) {}

    /// Degraded when live reads start failing; Connected again right
    /// before the full recovery snapshot is delivered.
    fn connectivity_changed(&self, _status: ConnectivityStatus) {}
}

/// Listener for embedders without a presentation layer.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopListener;

impl ViewListener for NoopListener {}
