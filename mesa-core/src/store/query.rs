//! Query descriptions evaluated by the entity store
//!
//! A [`Query`] names a collection plus field predicates, an optional sort
//! key and an optional result limit. The same description drives one-shot
//! reads and live subscriptions, so a role's visible slice of the world is
//! defined in exactly one place.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::cmp::Ordering;

/// Filter comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    /// Field equals the given value
    Eq,
    /// Field is one of the given values (value holds an array)
    In,
}

/// Single-field predicate over a JSON document
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::Eq,
            value: value.into(),
        }
    }

    pub fn is_in<V: Into<Value>>(
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::In,
            value: Value::Array(values.into_iter().map(Into::into).collect()),
        }
    }

    /// Whether the document satisfies this predicate.
    ///
    /// Documents missing the field never match.
    pub fn matches(&self, doc: &Value) -> bool {
        let Some(actual) = doc.get(&self.field) else {
            return false;
        };
        match self.op {
            FilterOp::Eq => actual == &self.value,
            FilterOp::In => self
                .value
                .as_array()
                .map(|candidates| candidates.contains(actual))
                .unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Sort key applied after filtering
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub direction: SortDirection,
}

/// Declarative query over one collection
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: String,
    pub filters: Vec<Filter>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn collection(name: impl Into<String>) -> Self {
        Self {
            collection: name.into(),
            filters: Vec::new(),
            order_by: None,
            limit: None,
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order_by_asc(mut self, field: impl Into<String>) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
            direction: SortDirection::Asc,
        });
        self
    }

    pub fn order_by_desc(mut self, field: impl Into<String>) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
            direction: SortDirection::Desc,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// All filters must match (conjunction).
    pub fn matches(&self, doc: &Value) -> bool {
        self.filters.iter().all(|f| f.matches(doc))
    }

    /// Apply sort key and limit to an already filtered result set.
    ///
    /// The sort is stable; documents without the sort field collate first.
    pub fn sort_and_truncate(&self, docs: &mut Vec<Value>) {
        if let Some(order) = &self.order_by {
            docs.sort_by(|a, b| {
                let ord = compare_values(
                    a.get(&order.field).unwrap_or(&Value::Null),
                    b.get(&order.field).unwrap_or(&Value::Null),
                );
                match order.direction {
                    SortDirection::Asc => ord,
                    SortDirection::Desc => ord.reverse(),
                }
            });
        }
        if let Some(limit) = self.limit {
            docs.truncate(limit);
        }
    }
}

/// Complete result set for one store generation.
///
/// Consumers always replace their previous state with `docs` wholesale;
/// there is no incremental delta format.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Store revision this result set was computed at
    pub generation: u64,
    pub docs: Vec<Value>,
}

impl Snapshot {
    pub fn decode<T: DeserializeOwned>(&self) -> Result<Vec<T>, serde_json::Error> {
        self.docs
            .iter()
            .map(|doc| serde_json::from_value(doc.clone()))
            .collect()
    }
}

fn type_rank(v: &Value) -> u8 {
    match v {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Total order over scalar JSON values; mixed types collate by kind.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            x.as_f64().partial_cmp(&y.as_f64()).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_eq_filter_matches_exact_field() {
        let filter = Filter::eq("table_number", "7");
        assert!(filter.matches(&json!({"table_number": "7", "status": "pending"})));
        assert!(!filter.matches(&json!({"table_number": "8"})));
        assert!(!filter.matches(&json!({"status": "pending"})));
    }

    #[test]
    fn test_in_filter_matches_any_candidate() {
        let filter = Filter::is_in("status", ["pending", "preparing", "ready"]);
        assert!(filter.matches(&json!({"status": "preparing"})));
        assert!(!filter.matches(&json!({"status": "completed"})));
    }

    #[test]
    fn test_query_is_a_conjunction() {
        let query = Query::collection("orders")
            .filter(Filter::eq("table_number", "3"))
            .filter(Filter::is_in("status", ["pending", "preparing"]));
        assert!(query.matches(&json!({"table_number": "3", "status": "pending"})));
        assert!(!query.matches(&json!({"table_number": "3", "status": "served"})));
        assert!(!query.matches(&json!({"table_number": "4", "status": "pending"})));
    }

    #[test]
    fn test_sort_desc_and_limit() {
        let query = Query::collection("orders").order_by_desc("created_at").limit(2);
        let mut docs = vec![
            json!({"id": "a", "created_at": 100}),
            json!({"id": "b", "created_at": 300}),
            json!({"id": "c", "created_at": 200}),
        ];
        query.sort_and_truncate(&mut docs);
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0]["id"], "b");
        assert_eq!(docs[1]["id"], "c");
    }

    #[test]
    fn test_missing_sort_field_collates_first() {
        let query = Query::collection("orders").order_by_asc("created_at");
        let mut docs = vec![
            json!({"id": "a", "created_at": 100}),
            json!({"id": "b"}),
        ];
        query.sort_and_truncate(&mut docs);
        assert_eq!(docs[0]["id"], "b");
    }
}
