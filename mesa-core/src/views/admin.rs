//! Admin view - read-only aggregates over everything
//!
//! Holds no engine handle at all, so lifecycle commands are unreachable
//! from this surface by construction.

use std::sync::Arc;

use shared::{Order, ServiceRequest};

use crate::lifecycle::stats::{self, DashboardStats, PopularItem};
use crate::subscriptions::{SubscriptionRouter, ViewScope, ViewSubscription};

use super::ViewListener;

/// Management dashboard surface.
pub struct AdminView {
    subscription: ViewSubscription,
    recent_limit: usize,
    popular_limit: usize,
}

impl AdminView {
    /// Attach the dashboard. Must be called inside a tokio runtime.
    pub fn new(router: &SubscriptionRouter, listener: Arc<dyn ViewListener>) -> Self {
        Self {
            subscription: router.attach(ViewScope::Admin, listener),
            recent_limit: stats::RECENT_ORDERS_LIMIT,
            popular_limit: stats::POPULAR_ITEMS_LIMIT,
        }
    }

    /// Override the dashboard list depths.
    pub fn with_limits(mut self, recent: usize, popular: usize) -> Self {
        self.recent_limit = recent;
        self.popular_limit = popular;
        self
    }

    /// Every dashboard counter at the current snapshot.
    pub fn dashboard(&self) -> DashboardStats {
        let orders = self.subscription.orders();
        let requests = self.subscription.requests();
        stats::dashboard_stats(&orders, &requests, self.popular_limit)
    }

    /// Newest orders regardless of status.
    pub fn recent_orders(&self) -> Vec<Order> {
        stats::recent_orders(&self.subscription.orders(), self.recent_limit)
    }

    /// Most-ordered item names by total quantity.
    pub fn popular_items(&self) -> Vec<PopularItem> {
        stats::popular_items(&self.subscription.orders(), self.popular_limit)
    }

    /// All orders in scope, newest first.
    pub fn orders(&self) -> Vec<Order> {
        self.subscription.orders()
    }

    /// All requests in scope, newest first.
    pub fn requests(&self) -> Vec<ServiceRequest> {
        self.subscription.requests()
    }
}
