//! Client view - one table's surface
//!
//! Browse the catalog, build a cart, place orders, call for service.
//! Order and request progress is observed only; this surface has no way
//! to transition anything.

use std::sync::Arc;

use parking_lot::Mutex;

use shared::{
    CommandError, CommandResult, MenuCategory, MenuItem, Order, RequestDetails, ServiceRequest,
    ServiceType,
};

use crate::lifecycle::LifecycleEngine;
use crate::store::{Filter, Query, collections};
use crate::subscriptions::{SubscriptionRouter, ViewScope, ViewSubscription};

use super::ViewListener;
use super::cart::Cart;

/// Table-bound diner surface.
pub struct ClientView {
    table_number: String,
    engine: Arc<LifecycleEngine>,
    subscription: ViewSubscription,
    cart: Mutex<Cart>,
}

impl ClientView {
    /// Attach a client at a table. Must be called inside a tokio runtime.
    pub fn new(
        engine: Arc<LifecycleEngine>,
        router: &SubscriptionRouter,
        table_number: impl Into<String>,
        listener: Arc<dyn ViewListener>,
    ) -> Self {
        let table_number = table_number.into();
        let subscription = router.attach(ViewScope::client(table_number.clone()), listener);
        Self {
            table_number,
            engine,
            subscription,
            cart: Mutex::new(Cart::new()),
        }
    }

    pub fn table_number(&self) -> &str {
        &self.table_number
    }

    // ========== Catalog ==========

    /// Available menu items, optionally narrowed to one category,
    /// sorted by name.
    pub async fn load_menu(&self, category: Option<&str>) -> CommandResult<Vec<MenuItem>> {
        let mut query = Query::collection(collections::MENU)
            .filter(Filter::eq("available", true))
            .order_by_asc("name");
        if let Some(category) = category {
            query = query.filter(Filter::eq("category", category));
        }
        let snapshot = self.engine.store().query(&query).await?;
        snapshot
            .decode()
            .map_err(|e| CommandError::StoreUnavailable(format!("corrupt menu document: {e}")))
    }

    /// Catalog categories for the menu navigation.
    pub async fn load_menu_categories(&self) -> CommandResult<Vec<MenuCategory>> {
        let query = Query::collection(collections::MENU_CATEGORIES).order_by_asc("name");
        let snapshot = self.engine.store().query(&query).await?;
        snapshot
            .decode()
            .map_err(|e| CommandError::StoreUnavailable(format!("corrupt category document: {e}")))
    }

    // ========== Cart ==========

    pub fn add_to_cart(&self, item: &MenuItem) {
        self.cart.lock().add(item);
    }

    pub fn set_cart_quantity(&self, item_id: &str, quantity: i32) {
        self.cart.lock().set_quantity(item_id, quantity);
    }

    pub fn remove_from_cart(&self, item_id: &str) {
        self.cart.lock().remove(item_id);
    }

    /// Snapshot of the current cart contents.
    pub fn cart(&self) -> Cart {
        self.cart.lock().clone()
    }

    pub fn cart_total(&self) -> f64 {
        self.cart.lock().total()
    }

    pub fn cart_item_count(&self) -> i32 {
        self.cart.lock().item_count()
    }

    /// Place the cart as an order. The cart drains only on success, so a
    /// rejected order stays editable.
    pub async fn place_order(&self) -> CommandResult<Order> {
        let items = self.cart.lock().to_inputs();
        let order = self.engine.place_order(&self.table_number, items).await?;
        self.cart.lock().clear();
        Ok(order)
    }

    // ========== Service requests ==========

    /// One-tap service call (waiter, bartender, ...).
    pub async fn request_service(&self, service_type: ServiceType) -> CommandResult<ServiceRequest> {
        self.engine
            .create_request(&self.table_number, service_type, RequestDetails::default())
            .await
    }

    /// Free-text request; the message is required.
    pub async fn send_special_request(
        &self,
        message: impl Into<String>,
    ) -> CommandResult<ServiceRequest> {
        self.engine
            .create_request(
                &self.table_number,
                ServiceType::Special,
                RequestDetails::message(message),
            )
            .await
    }

    /// Call a staff member by name, e.g. from a business card holder.
    pub async fn call_specific_staff(
        &self,
        staff_name: impl Into<String>,
        staff_type: Option<String>,
        message: Option<String>,
    ) -> CommandResult<ServiceRequest> {
        self.engine
            .create_request(
                &self.table_number,
                ServiceType::SpecificStaff,
                RequestDetails::staff_call(staff_name, staff_type, message),
            )
            .await
    }

    // ========== Live state ==========

    /// Own not-yet-completed orders, newest first.
    pub fn orders(&self) -> Vec<Order> {
        self.subscription.orders()
    }

    /// Own active requests, newest first.
    pub fn requests(&self) -> Vec<ServiceRequest> {
        self.subscription.requests()
    }
}

#[cfg(test)]
mod tests {
    use super::super::NoopListener;
    use super::*;
    use serde_json::json;

    use crate::store::{DocumentStore, EntityStore};
    use shared::OrderStatus;

    fn setup() -> (Arc<dyn EntityStore>, Arc<LifecycleEngine>, SubscriptionRouter) {
        let store: Arc<dyn EntityStore> = Arc::new(DocumentStore::open_in_memory().unwrap());
        let engine = Arc::new(LifecycleEngine::new(store.clone()));
        let router = SubscriptionRouter::new(store.clone());
        (store, engine, router)
    }

    async fn seed_menu(store: &Arc<dyn EntityStore>) {
        let docs = [
            json!({"name": "Bread", "category": "starters", "price": 2.0, "available": true}),
            json!({"name": "Soup", "category": "starters", "price": 4.5, "available": true}),
            json!({"name": "Steak", "category": "mains", "price": 18.0, "available": true}),
            json!({"name": "Oysters", "category": "starters", "price": 12.0, "available": false}),
        ];
        for doc in docs {
            store.create(collections::MENU, doc).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_load_menu_hides_unavailable_and_filters_by_category() {
        let (store, engine, router) = setup();
        seed_menu(&store).await;
        let client = ClientView::new(engine, &router, "7", Arc::new(NoopListener));

        let all = client.load_menu(None).await.unwrap();
        let names: Vec<&str> = all.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["Bread", "Soup", "Steak"]);

        let starters = client.load_menu(Some("starters")).await.unwrap();
        assert_eq!(starters.len(), 2);
        assert!(starters.iter().all(|m| m.category == "starters"));
    }

    #[tokio::test]
    async fn test_place_order_drains_cart_only_on_success() {
        let (store, engine, router) = setup();
        seed_menu(&store).await;
        let client = ClientView::new(engine, &router, "7", Arc::new(NoopListener));

        // empty cart is rejected up front and stays empty
        let err = client.place_order().await.unwrap_err();
        assert_eq!(err, CommandError::EmptyCart);

        let menu = client.load_menu(None).await.unwrap();
        client.add_to_cart(&menu[0]);
        client.add_to_cart(&menu[0]);
        client.add_to_cart(&menu[1]);
        assert_eq!(client.cart_item_count(), 3);
        assert_eq!(client.cart_total(), 8.5);

        let order = client.place_order().await.unwrap();
        assert_eq!(order.table_number, "7");
        assert_eq!(order.total, 8.5);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(client.cart_item_count(), 0);
    }

    #[tokio::test]
    async fn test_request_helpers_map_to_service_types() {
        let (_store, engine, router) = setup();
        let client = ClientView::new(engine, &router, "7", Arc::new(NoopListener));

        let plain = client.request_service(ServiceType::Waiter).await.unwrap();
        assert_eq!(plain.service_type, ServiceType::Waiter);
        assert_eq!(plain.table_number, "7");

        let special = client.send_special_request("No onions please").await.unwrap();
        assert_eq!(special.service_type, ServiceType::Special);
        assert_eq!(special.message.as_deref(), Some("No onions please"));

        let call = client
            .call_specific_staff("Marco", Some("waiter".into()), None)
            .await
            .unwrap();
        assert_eq!(call.service_type, ServiceType::SpecificStaff);
        assert_eq!(call.staff_name.as_deref(), Some("Marco"));
    }
}
