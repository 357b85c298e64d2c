//! Derived dashboard aggregates
//!
//! Pure functions over full snapshots. Nothing here is maintained
//! incrementally: result sets are small, every subscription delivery is
//! complete, so each delivery simply recomputes from scratch.

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;
use shared::{Order, OrderStatus, RequestStatus, ServiceRequest};

/// Ranking depth of the popular-items card
pub const POPULAR_ITEMS_LIMIT: usize = 5;

/// List depth of the recent-orders card
pub const RECENT_ORDERS_LIMIT: usize = 5;

/// One entry of the popular-items ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PopularItem {
    pub name: String,
    /// Total quantity ordered across all orders
    pub count: i64,
}

/// Dashboard counters at one snapshot generation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total_orders: usize,
    pub pending_orders: usize,
    /// Requests still pending or in progress
    pub active_requests: usize,
    /// Distinct tables with a non-completed order or an active request
    pub active_tables: usize,
    pub popular_items: Vec<PopularItem>,
}

/// Recompute every dashboard counter from full snapshots.
pub fn dashboard_stats(
    orders: &[Order],
    requests: &[ServiceRequest],
    popular_limit: usize,
) -> DashboardStats {
    DashboardStats {
        total_orders: orders.len(),
        pending_orders: orders
            .iter()
            .filter(|o| o.status == OrderStatus::Pending)
            .count(),
        active_requests: requests.iter().filter(|r| r.status.is_active()).count(),
        active_tables: active_tables(orders, requests).len(),
        popular_items: popular_items(orders, popular_limit),
    }
}

/// Tables that still need attention: any non-completed order or any
/// pending / in-progress request keeps a table active. A completed order
/// alone does not.
pub fn active_tables(orders: &[Order], requests: &[ServiceRequest]) -> BTreeSet<String> {
    let mut tables = BTreeSet::new();
    for order in orders {
        if order.status.is_active() {
            tables.insert(order.table_number.clone());
        }
    }
    for request in requests {
        if request.status.is_active() {
            tables.insert(request.table_number.clone());
        }
    }
    tables
}

/// Per-item-name quantity totals across all orders, descending. The sort
/// is stable, so equal counts keep first-aggregated order.
pub fn popular_items(orders: &[Order], limit: usize) -> Vec<PopularItem> {
    let mut counts: HashMap<&str, i64> = HashMap::new();
    let mut first_seen: Vec<&str> = Vec::new();
    for order in orders {
        for item in &order.items {
            let entry = counts.entry(item.name.as_str()).or_insert_with(|| {
                first_seen.push(item.name.as_str());
                0
            });
            *entry += i64::from(item.quantity);
        }
    }

    let mut ranked: Vec<PopularItem> = first_seen
        .into_iter()
        .map(|name| PopularItem {
            name: name.to_string(),
            count: counts[name],
        })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked.truncate(limit);
    ranked
}

/// Newest orders first, truncated.
pub fn recent_orders(orders: &[Order], limit: usize) -> Vec<Order> {
    let mut recent = orders.to_vec();
    recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    recent.truncate(limit);
    recent
}

/// Requests nobody has accepted yet (staff notification badge).
pub fn pending_request_count(requests: &[ServiceRequest]) -> usize {
    requests
        .iter()
        .filter(|r| r.status == RequestStatus::Pending)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{OrderItem, ServiceType};

    fn order(table: &str, status: OrderStatus, items: &[(&str, i32)], created_at: i64) -> Order {
        Order {
            id: format!("o-{table}-{created_at}"),
            table_number: table.to_string(),
            items: items
                .iter()
                .map(|(name, quantity)| OrderItem {
                    name: name.to_string(),
                    price: 5.0,
                    quantity: *quantity,
                })
                .collect(),
            total: 0.0,
            status,
            estimated_time: None,
            created_at,
            updated_at: created_at,
        }
    }

    fn request(table: &str, status: RequestStatus) -> ServiceRequest {
        ServiceRequest {
            id: format!("r-{table}"),
            table_number: table.to_string(),
            service_type: ServiceType::Waiter,
            message: None,
            staff_name: None,
            staff_type: None,
            status,
            assigned_to: None,
            created_at: 0,
            assigned_at: None,
            completed_at: None,
        }
    }

    #[test]
    fn test_active_tables_unions_orders_and_requests() {
        let orders = vec![
            order("3", OrderStatus::Preparing, &[], 1),
            order("3", OrderStatus::Completed, &[], 2),
        ];
        let requests = vec![request("5", RequestStatus::Pending)];
        let tables = active_tables(&orders, &requests);
        assert_eq!(tables.len(), 2);
        assert!(tables.contains("3"));
        assert!(tables.contains("5"));
    }

    #[test]
    fn test_completed_everything_leaves_no_active_tables() {
        let orders = vec![order("9", OrderStatus::Completed, &[], 1)];
        let requests = vec![request("9", RequestStatus::Completed)];
        assert!(active_tables(&orders, &requests).is_empty());
    }

    #[test]
    fn test_popular_items_sorted_by_total_quantity() {
        let orders = vec![
            order("1", OrderStatus::Pending, &[("Soup", 2)], 1),
            order("2", OrderStatus::Pending, &[("Soup", 1), ("Bread", 5)], 2),
        ];
        let popular = popular_items(&orders, POPULAR_ITEMS_LIMIT);
        assert_eq!(popular.len(), 2);
        assert_eq!(popular[0].name, "Bread");
        assert_eq!(popular[0].count, 5);
        assert_eq!(popular[1].name, "Soup");
        assert_eq!(popular[1].count, 3);
    }

    #[test]
    fn test_popular_items_ties_keep_first_seen_order() {
        let orders = vec![order(
            "1",
            OrderStatus::Pending,
            &[("Tea", 2), ("Coffee", 2)],
            1,
        )];
        let popular = popular_items(&orders, POPULAR_ITEMS_LIMIT);
        assert_eq!(popular[0].name, "Tea");
        assert_eq!(popular[1].name, "Coffee");
    }

    #[test]
    fn test_popular_items_truncates_to_limit() {
        let items: Vec<(String, i32)> = (0..8).map(|i| (format!("Dish {i}"), 8 - i)).collect();
        let borrowed: Vec<(&str, i32)> = items.iter().map(|(n, q)| (n.as_str(), *q)).collect();
        let orders = vec![order("1", OrderStatus::Pending, &borrowed, 1)];
        let popular = popular_items(&orders, 5);
        assert_eq!(popular.len(), 5);
        assert_eq!(popular[0].name, "Dish 0");
        assert_eq!(popular[4].name, "Dish 4");
    }

    #[test]
    fn test_recent_orders_newest_first() {
        let orders = vec![
            order("1", OrderStatus::Pending, &[], 100),
            order("2", OrderStatus::Pending, &[], 300),
            order("3", OrderStatus::Pending, &[], 200),
        ];
        let recent = recent_orders(&orders, 2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].table_number, "2");
        assert_eq!(recent[1].table_number, "3");
    }

    #[test]
    fn test_dashboard_stats_counts() {
        let orders = vec![
            order("3", OrderStatus::Pending, &[("Soup", 1)], 1),
            order("4", OrderStatus::Preparing, &[], 2),
            order("4", OrderStatus::Completed, &[], 3),
        ];
        let requests = vec![
            request("5", RequestStatus::Pending),
            request("6", RequestStatus::InProgress),
            request("7", RequestStatus::Completed),
        ];
        let stats = dashboard_stats(&orders, &requests, POPULAR_ITEMS_LIMIT);
        assert_eq!(stats.total_orders, 3);
        assert_eq!(stats.pending_orders, 1);
        assert_eq!(stats.active_requests, 2);
        // tables 3, 4 (active orders) + 5, 6 (active requests)
        assert_eq!(stats.active_tables, 4);
        assert_eq!(stats.popular_items.len(), 1);
    }

    #[test]
    fn test_pending_request_count_ignores_accepted() {
        let requests = vec![
            request("1", RequestStatus::Pending),
            request("2", RequestStatus::InProgress),
            request("3", RequestStatus::Pending),
        ];
        assert_eq!(pending_request_count(&requests), 2);
    }
}
