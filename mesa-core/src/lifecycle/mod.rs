//! Lifecycle engine - command processing for orders and service requests
//!
//! The engine owns no state beyond the injected store handle. Every
//! command has the same shape:
//!
//! ```text
//! place_order / create_request
//!     1. validate input (failures never touch the store)
//!     2. store.create() assigns id + timestamps
//!     3. return the stored entity
//!
//! transition_order / accept_request / complete_request
//!     1. load current entity (NotFound otherwise)
//!     2. check the state-machine edge
//!     3. conditional write keyed on the observed status
//!     4. ConditionFailed -> the race was lost, entity untouched
//! ```
//!
//! A command's return value is immediate feedback for the issuing view
//! only. The authoritative echo reaches every role, issuer included,
//! through the store's change feed.

pub mod money;
pub mod stats;

pub use stats::{DashboardStats, PopularItem};

use std::sync::Arc;

use serde_json::{Value, json};

use shared::{
    CommandError, CommandResult, Order, OrderItem, OrderItemInput, OrderStatus, RequestDetails,
    RequestStatus, ServiceRequest, ServiceType,
};

use crate::store::{EntityStore, Filter, UpdateOutcome, collections};

/// Command surface shared by all role views.
pub struct LifecycleEngine {
    store: Arc<dyn EntityStore>,
}

impl LifecycleEngine {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// The injected store collaborator.
    pub fn store(&self) -> &Arc<dyn EntityStore> {
        &self.store
    }

    /// Create an order for a table. Line items are snapshot copies of
    /// menu data; the total is computed here exactly once.
    pub async fn place_order(
        &self,
        table_number: &str,
        items: Vec<OrderItemInput>,
    ) -> CommandResult<Order> {
        if items.is_empty() {
            return Err(CommandError::EmptyCart);
        }
        for item in &items {
            money::validate_item(item)?;
        }

        let total = money::order_total(&items);
        let items: Vec<OrderItem> = items.into_iter().map(OrderItem::from).collect();
        let doc = json!({
            "table_number": table_number,
            "items": items,
            "total": total,
            "status": OrderStatus::Pending,
            "estimated_time": null,
        });

        let stored = self.store.create(collections::ORDERS, doc).await?;
        let order: Order = decode(stored)?;
        tracing::info!(
            order_id = %order.id,
            table = %order.table_number,
            total = order.total,
            "Order placed"
        );
        Ok(order)
    }

    /// Advance an order one step along pending -> preparing -> ready ->
    /// served -> completed. Skipping or reversing is rejected without a
    /// write; completed orders never change again.
    ///
    /// The write is conditional on the status observed here, so two staff
    /// members advancing the same order cannot both apply.
    pub async fn transition_order(
        &self,
        order_id: &str,
        new_status: OrderStatus,
        estimated_time: Option<u32>,
    ) -> CommandResult<Order> {
        let current: Order = match self.store.get(collections::ORDERS, order_id).await? {
            Some(doc) => decode(doc)?,
            None => return Err(CommandError::not_found("Order", order_id)),
        };

        if !current.status.can_advance_to(new_status) {
            return Err(CommandError::invalid_transition(current.status, new_status));
        }

        let mut patch = json!({ "status": new_status });
        if let Some(minutes) = estimated_time {
            patch["estimated_time"] = json!(minutes);
        }

        let outcome = self
            .store
            .update(
                collections::ORDERS,
                order_id,
                patch,
                Some(Filter::eq("status", current.status.as_str())),
            )
            .await?;

        match outcome {
            UpdateOutcome::Applied(doc) => {
                let order: Order = decode(doc)?;
                tracing::info!(
                    order_id = %order.id,
                    from = %current.status,
                    to = %order.status,
                    "Order status advanced"
                );
                Ok(order)
            }
            UpdateOutcome::ConditionFailed => {
                tracing::warn!(order_id, "Order transition lost to a concurrent update");
                Err(CommandError::ConditionFailed(order_id.to_string()))
            }
        }
    }

    /// Create a service request. `special` requires a message and
    /// `specific_staff` a staff name; other types take details as given.
    pub async fn create_request(
        &self,
        table_number: &str,
        service_type: ServiceType,
        details: RequestDetails,
    ) -> CommandResult<ServiceRequest> {
        match service_type {
            ServiceType::Special if is_blank(&details.message) => {
                return Err(CommandError::MissingField("message"));
            }
            ServiceType::SpecificStaff if is_blank(&details.staff_name) => {
                return Err(CommandError::MissingField("staff_name"));
            }
            _ => {}
        }

        let doc = json!({
            "table_number": table_number,
            "service_type": service_type,
            "message": details.message,
            "staff_name": details.staff_name,
            "staff_type": details.staff_type,
            "status": RequestStatus::Pending,
            "assigned_to": null,
            "assigned_at": null,
            "completed_at": null,
        });

        let stored = self.store.create(collections::REQUESTS, doc).await?;
        let request: ServiceRequest = decode(stored)?;
        tracing::info!(
            request_id = %request.id,
            table = %request.table_number,
            service_type = %request.service_type,
            "Service request created"
        );
        Ok(request)
    }

    /// Accept a pending request on behalf of a staff member. At most one
    /// acceptor wins; the write is conditional on the request still being
    /// pending, and the losing side of a race is told the request is
    /// already assigned. The winner's assignment is never overwritten.
    pub async fn accept_request(
        &self,
        request_id: &str,
        staff_id: &str,
    ) -> CommandResult<ServiceRequest> {
        let current: ServiceRequest = match self.store.get(collections::REQUESTS, request_id).await?
        {
            Some(doc) => decode(doc)?,
            None => return Err(CommandError::not_found("Request", request_id)),
        };
        if current.status != RequestStatus::Pending {
            return Err(CommandError::AlreadyAssigned(request_id.to_string()));
        }

        let patch = json!({
            "status": RequestStatus::InProgress,
            "assigned_to": staff_id,
            "assigned_at": shared::util::now_millis(),
        });
        let outcome = self
            .store
            .update(
                collections::REQUESTS,
                request_id,
                patch,
                Some(Filter::eq("status", RequestStatus::Pending.as_str())),
            )
            .await?;

        match outcome {
            UpdateOutcome::Applied(doc) => {
                let request: ServiceRequest = decode(doc)?;
                tracing::info!(request_id, staff_id, "Request accepted");
                Ok(request)
            }
            UpdateOutcome::ConditionFailed => {
                tracing::warn!(request_id, staff_id, "Request already taken by someone else");
                Err(CommandError::AlreadyAssigned(request_id.to_string()))
            }
        }
    }

    /// Complete a request currently being worked on. Only `in_progress`
    /// requests can complete.
    pub async fn complete_request(&self, request_id: &str) -> CommandResult<ServiceRequest> {
        let current: ServiceRequest = match self.store.get(collections::REQUESTS, request_id).await?
        {
            Some(doc) => decode(doc)?,
            None => return Err(CommandError::not_found("Request", request_id)),
        };
        if current.status != RequestStatus::InProgress {
            return Err(CommandError::invalid_transition(
                current.status,
                RequestStatus::Completed,
            ));
        }

        let patch = json!({
            "status": RequestStatus::Completed,
            "completed_at": shared::util::now_millis(),
        });
        let outcome = self
            .store
            .update(
                collections::REQUESTS,
                request_id,
                patch,
                Some(Filter::eq("status", RequestStatus::InProgress.as_str())),
            )
            .await?;

        match outcome {
            UpdateOutcome::Applied(doc) => {
                let request: ServiceRequest = decode(doc)?;
                tracing::info!(request_id, "Request completed");
                Ok(request)
            }
            UpdateOutcome::ConditionFailed => {
                tracing::warn!(request_id, "Request changed concurrently, complete aborted");
                Err(CommandError::ConditionFailed(request_id.to_string()))
            }
        }
    }
}

/// A stored document that fails to decode is a storage-side defect, not
/// a caller mistake.
fn decode<T: serde::de::DeserializeOwned>(doc: Value) -> CommandResult<T> {
    serde_json::from_value(doc).map_err(|e| {
        tracing::error!(error = %e, "Stored document failed to decode");
        CommandError::StoreUnavailable(format!("corrupt document: {e}"))
    })
}

fn is_blank(field: &Option<String>) -> bool {
    field.as_deref().map_or(true, |s| s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{DocumentStore, Query};

    fn test_engine() -> LifecycleEngine {
        let store = DocumentStore::open_in_memory().unwrap();
        LifecycleEngine::new(Arc::new(store))
    }

    fn item(name: &str, price: f64, quantity: i32) -> OrderItemInput {
        OrderItemInput {
            name: name.to_string(),
            price,
            quantity,
        }
    }

    async fn stored_order_status(engine: &LifecycleEngine, id: &str) -> String {
        let doc = engine
            .store()
            .get(collections::ORDERS, id)
            .await
            .unwrap()
            .unwrap();
        doc["status"].as_str().unwrap().to_string()
    }

    // ========== place_order ==========

    #[tokio::test]
    async fn test_place_order_computes_total_and_defaults() {
        let engine = test_engine();
        let order = engine
            .place_order("7", vec![item("Soup", 4.5, 2), item("Bread", 2.25, 3)])
            .await
            .unwrap();

        assert!(!order.id.is_empty());
        assert_eq!(order.table_number, "7");
        assert_eq!(order.total, 15.75);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.estimated_time, None);
        assert_eq!(order.created_at, order.updated_at);
    }

    #[tokio::test]
    async fn test_place_order_empty_cart_never_reaches_store() {
        let engine = test_engine();
        let err = engine.place_order("7", vec![]).await.unwrap_err();
        assert_eq!(err, CommandError::EmptyCart);

        let snapshot = engine
            .store()
            .query(&Query::collection(collections::ORDERS))
            .await
            .unwrap();
        assert!(snapshot.docs.is_empty());
    }

    #[tokio::test]
    async fn test_place_order_rejects_invalid_item_without_write() {
        let engine = test_engine();
        let err = engine
            .place_order("7", vec![item("Soup", 4.5, 2), item("Bread", 0.0, 1)])
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::InvalidItem(_)));

        let snapshot = engine
            .store()
            .query(&Query::collection(collections::ORDERS))
            .await
            .unwrap();
        assert!(snapshot.docs.is_empty());
    }

    // ========== transition_order ==========

    #[tokio::test]
    async fn test_transition_walks_the_full_chain() {
        let engine = test_engine();
        let order = engine
            .place_order("3", vec![item("Soup", 4.5, 1)])
            .await
            .unwrap();

        let order = engine
            .transition_order(&order.id, OrderStatus::Preparing, Some(10))
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Preparing);
        assert_eq!(order.estimated_time, Some(10));

        for next in [OrderStatus::Ready, OrderStatus::Served, OrderStatus::Completed] {
            let advanced = engine.transition_order(&order.id, next, None).await.unwrap();
            assert_eq!(advanced.status, next);
            // the estimate set earlier stays
            assert_eq!(advanced.estimated_time, Some(10));
        }
    }

    #[tokio::test]
    async fn test_transition_rejects_skip_and_leaves_order_unchanged() {
        let engine = test_engine();
        let order = engine
            .place_order("3", vec![item("Soup", 4.5, 1)])
            .await
            .unwrap();

        let err = engine
            .transition_order(&order.id, OrderStatus::Served, None)
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::InvalidTransition { .. }));
        assert_eq!(stored_order_status(&engine, &order.id).await, "pending");
    }

    #[tokio::test]
    async fn test_completed_order_is_immutable() {
        let engine = test_engine();
        let order = engine
            .place_order("3", vec![item("Soup", 4.5, 1)])
            .await
            .unwrap();
        for next in [
            OrderStatus::Preparing,
            OrderStatus::Ready,
            OrderStatus::Served,
            OrderStatus::Completed,
        ] {
            engine.transition_order(&order.id, next, None).await.unwrap();
        }

        for target in [OrderStatus::Pending, OrderStatus::Preparing, OrderStatus::Completed] {
            let err = engine
                .transition_order(&order.id, target, None)
                .await
                .unwrap_err();
            assert!(matches!(err, CommandError::InvalidTransition { .. }));
        }
        assert_eq!(stored_order_status(&engine, &order.id).await, "completed");
    }

    #[tokio::test]
    async fn test_transition_unknown_order_is_not_found() {
        let engine = test_engine();
        let err = engine
            .transition_order("missing", OrderStatus::Preparing, None)
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::NotFound { .. }));
    }

    // ========== create_request ==========

    #[tokio::test]
    async fn test_create_request_validates_per_type_fields() {
        let engine = test_engine();

        let err = engine
            .create_request("4", ServiceType::Special, RequestDetails::default())
            .await
            .unwrap_err();
        assert_eq!(err, CommandError::MissingField("message"));

        let err = engine
            .create_request("4", ServiceType::Special, RequestDetails::message("   "))
            .await
            .unwrap_err();
        assert_eq!(err, CommandError::MissingField("message"));

        let err = engine
            .create_request("4", ServiceType::SpecificStaff, RequestDetails::default())
            .await
            .unwrap_err();
        assert_eq!(err, CommandError::MissingField("staff_name"));

        // plain calls need no details at all
        let request = engine
            .create_request("4", ServiceType::Waiter, RequestDetails::default())
            .await
            .unwrap();
        assert_eq!(request.status, RequestStatus::Pending);
        assert_eq!(request.assigned_to, None);
    }

    #[tokio::test]
    async fn test_create_special_request_stores_message() {
        let engine = test_engine();
        let request = engine
            .create_request(
                "4",
                ServiceType::Special,
                RequestDetails::message("Birthday candles please"),
            )
            .await
            .unwrap();
        assert_eq!(request.service_type, ServiceType::Special);
        assert_eq!(request.message.as_deref(), Some("Birthday candles please"));
    }

    // ========== accept / complete ==========

    #[tokio::test]
    async fn test_accept_then_complete_flow() {
        let engine = test_engine();
        let request = engine
            .create_request("4", ServiceType::Waiter, RequestDetails::default())
            .await
            .unwrap();

        let accepted = engine.accept_request(&request.id, "staff-1").await.unwrap();
        assert_eq!(accepted.status, RequestStatus::InProgress);
        assert_eq!(accepted.assigned_to.as_deref(), Some("staff-1"));
        assert!(accepted.assigned_at.is_some());
        assert_eq!(accepted.completed_at, None);

        let completed = engine.complete_request(&request.id).await.unwrap();
        assert_eq!(completed.status, RequestStatus::Completed);
        assert_eq!(completed.assigned_to.as_deref(), Some("staff-1"));
        assert!(completed.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_accept_twice_keeps_first_assignment() {
        let engine = test_engine();
        let request = engine
            .create_request("4", ServiceType::Waiter, RequestDetails::default())
            .await
            .unwrap();

        engine.accept_request(&request.id, "staff-1").await.unwrap();
        let err = engine.accept_request(&request.id, "staff-2").await.unwrap_err();
        assert!(matches!(err, CommandError::AlreadyAssigned(_)));

        let doc = engine
            .store()
            .get(collections::REQUESTS, &request.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc["assigned_to"], "staff-1");
    }

    #[tokio::test]
    async fn test_complete_requires_in_progress() {
        let engine = test_engine();
        let request = engine
            .create_request("4", ServiceType::Waiter, RequestDetails::default())
            .await
            .unwrap();

        let err = engine.complete_request(&request.id).await.unwrap_err();
        assert!(matches!(err, CommandError::InvalidTransition { .. }));

        engine.accept_request(&request.id, "staff-1").await.unwrap();
        engine.complete_request(&request.id).await.unwrap();

        // already completed, a second complete is rejected too
        let err = engine.complete_request(&request.id).await.unwrap_err();
        assert!(matches!(err, CommandError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn test_accept_unknown_request_is_not_found() {
        let engine = test_engine();
        let err = engine.accept_request("missing", "staff-1").await.unwrap_err();
        assert!(matches!(err, CommandError::NotFound { .. }));
    }
}
