//! One table's dinner, three concurrent viewpoints
//!
//! Runs the whole coordination loop in-process against an in-memory
//! store: the diner at table 7 orders and calls for service, a staff
//! terminal works the queue, and the admin dashboard keeps count.
//!
//! ```bash
//! cargo run -p mesa-core --example table_session
//! ```

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use mesa_core::store::collections;
use mesa_core::{
    AdminView, ClientView, Config, DocumentStore, EntityStore, LifecycleEngine, StaffView,
    SubscriptionRouter, ViewListener,
};
use shared::{Order, OrderStatus, ServiceRequest, ServiceType};

/// Renders deliveries the way a real presentation layer would.
struct RoleLogger(&'static str);

impl ViewListener for RoleLogger {
    fn orders_changed(&self, orders: &[Order]) {
        for order in orders {
            tracing::info!(
                role = self.0,
                table = %order.table_number,
                status = %order.status,
                total = order.total,
                eta = ?order.estimated_time,
                "order"
            );
        }
    }

    fn requests_changed(&self, requests: &[ServiceRequest]) {
        for request in requests {
            tracing::info!(
                role = self.0,
                table = %request.table_number,
                service = %request.service_type,
                status = %request.status,
                assigned = ?request.assigned_to,
                "request"
            );
        }
    }
}

async fn seed_menu(store: &Arc<dyn EntityStore>) -> anyhow::Result<()> {
    let docs = [
        json!({"name": "Tomato Soup", "description": "With basil oil", "category": "starters", "price": 6.5, "available": true}),
        json!({"name": "Sourdough Bread", "description": null, "category": "starters", "price": 3.2, "available": true}),
        json!({"name": "Grilled Sea Bass", "description": "Catch of the day", "category": "mains", "price": 21.0, "available": true}),
        json!({"name": "Off-menu Special", "description": null, "category": "mains", "price": 18.0, "available": false}),
    ];
    for doc in docs {
        store.create(collections::MENU, doc).await?;
    }
    Ok(())
}

/// Give the snapshot streams a beat to fan out.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    mesa_core::init_logger();

    let config = Config::from_env();
    let store: Arc<dyn EntityStore> =
        Arc::new(DocumentStore::open_in_memory_with(config.store_options())?);
    let engine = Arc::new(LifecycleEngine::new(store.clone()));
    let router = SubscriptionRouter::new(store.clone());

    seed_menu(&store).await?;

    let client = ClientView::new(engine.clone(), &router, "7", Arc::new(RoleLogger("client")));
    let staff = StaffView::new(
        engine.clone(),
        &router,
        "staff-1",
        "Dana",
        Arc::new(RoleLogger("staff")),
    );
    let admin = AdminView::new(&router, Arc::new(RoleLogger("admin")))
        .with_limits(config.recent_orders_limit, config.popular_items_limit);

    // The diner browses the catalog and builds a cart.
    let menu = client.load_menu(None).await?;
    client.add_to_cart(&menu[0]); // Grilled Sea Bass
    client.add_to_cart(&menu[0]);
    client.add_to_cart(&menu[1]); // Sourdough Bread
    tracing::info!(
        total = client.cart_total(),
        items = client.cart_item_count(),
        "cart ready"
    );
    let order = client.place_order().await?;
    settle().await;

    // The kitchen works the order down the chain.
    staff
        .update_order_status(&order.id, OrderStatus::Preparing, Some(12))
        .await?;
    staff
        .update_order_status(&order.id, OrderStatus::Ready, None)
        .await?;
    staff
        .update_order_status(&order.id, OrderStatus::Served, None)
        .await?;
    settle().await;

    // Meanwhile the table asks for the card reader.
    let request = client.request_service(ServiceType::Pos).await?;
    settle().await;
    staff.accept_request(&request.id).await?;
    tracing::info!(pending = staff.pending_request_count(), "staff badge");
    staff.complete_request(&request.id).await?;
    staff
        .update_order_status(&order.id, OrderStatus::Completed, None)
        .await?;
    settle().await;

    let dashboard = admin.dashboard();
    tracing::info!(
        total_orders = dashboard.total_orders,
        pending_orders = dashboard.pending_orders,
        active_requests = dashboard.active_requests,
        active_tables = dashboard.active_tables,
        "admin dashboard"
    );
    for item in admin.popular_items() {
        tracing::info!(name = %item.name, count = item.count, "popular item");
    }

    Ok(())
}
