//! Staff view - the active working set plus transition commands
//!
//! The only surface that advances orders and handles requests. Both
//! boards are subscription-fed; a command issued here comes back through
//! the same stream that feeds every other staff terminal.

use std::sync::Arc;

use shared::{CommandResult, Order, OrderStatus, ServiceRequest};

use crate::lifecycle::{LifecycleEngine, stats};
use crate::subscriptions::{SubscriptionRouter, ViewScope, ViewSubscription};

use super::ViewListener;

/// Kitchen / floor surface for one staff member.
pub struct StaffView {
    staff_id: String,
    staff_name: String,
    engine: Arc<LifecycleEngine>,
    subscription: ViewSubscription,
}

impl StaffView {
    /// Attach a staff terminal. Must be called inside a tokio runtime.
    pub fn new(
        engine: Arc<LifecycleEngine>,
        router: &SubscriptionRouter,
        staff_id: impl Into<String>,
        staff_name: impl Into<String>,
        listener: Arc<dyn ViewListener>,
    ) -> Self {
        let subscription = router.attach(ViewScope::Staff, listener);
        Self {
            staff_id: staff_id.into(),
            staff_name: staff_name.into(),
            engine,
            subscription,
        }
    }

    pub fn staff_id(&self) -> &str {
        &self.staff_id
    }

    pub fn staff_name(&self) -> &str {
        &self.staff_name
    }

    // ========== Commands ==========

    /// Advance an order one step, optionally setting the kitchen
    /// estimate (minutes).
    pub async fn update_order_status(
        &self,
        order_id: &str,
        status: OrderStatus,
        estimated_time: Option<u32>,
    ) -> CommandResult<Order> {
        self.engine
            .transition_order(order_id, status, estimated_time)
            .await
    }

    /// Take a pending request. Exactly one staff member wins this; the
    /// loser of a race gets an already-assigned error.
    pub async fn accept_request(&self, request_id: &str) -> CommandResult<ServiceRequest> {
        self.engine.accept_request(request_id, &self.staff_id).await
    }

    /// Finish a request previously accepted.
    pub async fn complete_request(&self, request_id: &str) -> CommandResult<ServiceRequest> {
        self.engine.complete_request(request_id).await
    }

    // ========== Boards ==========

    /// Orders still being worked (pending / preparing / ready), newest
    /// first.
    pub fn order_board(&self) -> Vec<Order> {
        self.subscription.orders()
    }

    /// Unfinished requests across all tables, newest first.
    pub fn request_board(&self) -> Vec<ServiceRequest> {
        self.subscription.requests()
    }

    /// Requests nobody has accepted yet (notification badge).
    pub fn pending_request_count(&self) -> usize {
        stats::pending_request_count(&self.subscription.requests())
    }
}
