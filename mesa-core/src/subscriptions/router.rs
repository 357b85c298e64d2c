//! Subscription router - live store queries fanned out to role views
//!
//! ```text
//! EntityStore::subscribe (full snapshots)
//!        │
//!        └── SubscriptionRouter::attach(scope, listener)
//!              ├─ orders worker ───┐  swap state wholesale,
//!              └─ requests worker ─┴► recompute aggregates,
//!                                     invoke the ViewListener
//! ```
//!
//! Each worker consumes one snapshot stream. A delivery replaces that
//! stream's half of the view state in a single step, so a listener never
//! observes a mix of two generations of the same stream. Across the two
//! streams no ordering is guaranteed; the next delivery converges.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;

use shared::{Order, ServiceRequest};

use crate::lifecycle::stats::{self, DashboardStats};
use crate::store::{EntityStore, SnapshotStream};
use crate::views::ViewListener;

use super::scope::ViewScope;

/// Store reachability as observed by one attached view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityStatus {
    Connected,
    /// Reads are failing. The subscription keeps retrying and delivers a
    /// complete fresh snapshot once the store answers again.
    Degraded,
}

#[derive(Debug, Default)]
struct ViewState {
    orders: Vec<Order>,
    requests: Vec<ServiceRequest>,
}

/// Handle for one attached role view. Dropping it cancels both workers.
pub struct ViewSubscription {
    state: Arc<RwLock<ViewState>>,
    cancel: CancellationToken,
}

impl ViewSubscription {
    /// Orders currently in scope, as of the last delivery.
    pub fn orders(&self) -> Vec<Order> {
        self.state.read().orders.clone()
    }

    /// Requests currently in scope, as of the last delivery.
    pub fn requests(&self) -> Vec<ServiceRequest> {
        self.state.read().requests.clone()
    }

    /// Aggregates over the current snapshots.
    pub fn stats(&self) -> DashboardStats {
        let state = self.state.read();
        stats::dashboard_stats(&state.orders, &state.requests, stats::POPULAR_ITEMS_LIMIT)
    }
}

impl Drop for ViewSubscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Maps role scopes to live queries and keeps every attached view's
/// state in step with the store.
pub struct SubscriptionRouter {
    store: Arc<dyn EntityStore>,
}

impl SubscriptionRouter {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// Attach a role view. Spawns one worker per query stream; must be
    /// called inside a tokio runtime. The listener receives the initial
    /// snapshots shortly after this returns.
    pub fn attach(&self, scope: ViewScope, listener: Arc<dyn ViewListener>) -> ViewSubscription {
        let state = Arc::new(RwLock::new(ViewState::default()));
        let cancel = CancellationToken::new();
        let role = scope.role();
        tracing::debug!(role, "View attached");

        tokio::spawn(run_view_worker(
            StreamKind::Orders,
            role,
            self.store.subscribe(scope.orders_query()),
            state.clone(),
            listener.clone(),
            cancel.clone(),
        ));
        tokio::spawn(run_view_worker(
            StreamKind::Requests,
            role,
            self.store.subscribe(scope.requests_query()),
            state.clone(),
            listener,
            cancel.clone(),
        ));

        ViewSubscription { state, cancel }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamKind {
    Orders,
    Requests,
}

impl StreamKind {
    fn name(self) -> &'static str {
        match self {
            StreamKind::Orders => "orders",
            StreamKind::Requests => "requests",
        }
    }
}

async fn run_view_worker(
    kind: StreamKind,
    role: &'static str,
    mut stream: SnapshotStream,
    state: Arc<RwLock<ViewState>>,
    listener: Arc<dyn ViewListener>,
    cancel: CancellationToken,
) {
    let mut degraded = false;
    loop {
        let delivery = tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!(role, stream = kind.name(), "View worker cancelled");
                return;
            }
            delivery = stream.recv() => delivery,
        };
        // stream end means the store itself went away
        let Some(delivery) = delivery else { return };

        match delivery {
            Ok(snapshot) => {
                if degraded {
                    degraded = false;
                    tracing::info!(role, stream = kind.name(), "View stream recovered");
                    listener.connectivity_changed(ConnectivityStatus::Connected);
                }

                // A decode failure keeps the previous, still complete,
                // state rather than exposing half a delivery.
                match kind {
                    StreamKind::Orders => match snapshot.decode::<Order>() {
                        Ok(orders) => state.write().orders = orders,
                        Err(e) => {
                            tracing::error!(role, error = %e, "Orders snapshot failed to decode");
                            continue;
                        }
                    },
                    StreamKind::Requests => match snapshot.decode::<ServiceRequest>() {
                        Ok(requests) => state.write().requests = requests,
                        Err(e) => {
                            tracing::error!(role, error = %e, "Requests snapshot failed to decode");
                            continue;
                        }
                    },
                }

                // Clone out before the callbacks so no lock is held while
                // listener code runs.
                let (orders, requests) = {
                    let state = state.read();
                    (state.orders.clone(), state.requests.clone())
                };
                match kind {
                    StreamKind::Orders => listener.orders_changed(&orders),
                    StreamKind::Requests => listener.requests_changed(&requests),
                }
                listener.aggregates_changed(&stats::dashboard_stats(
                    &orders,
                    &requests,
                    stats::POPULAR_ITEMS_LIMIT,
                ));
            }
            Err(e) => {
                if !degraded {
                    degraded = true;
                    tracing::warn!(role, stream = kind.name(), error = %e, "View stream degraded");
                    listener.connectivity_changed(ConnectivityStatus::Degraded);
                }
            }
        }
    }
}
