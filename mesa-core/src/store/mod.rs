//! Entity store seam and the embedded document engine
//!
//! Everything above this layer talks to [`EntityStore`], an injected
//! `Arc<dyn EntityStore>`. The trait covers exactly four concerns:
//!
//! - `create`: insert a document, store assigns id / timestamps / revision
//! - `update`: merge a patch, optionally guarded by a condition that is
//!   evaluated atomically with the write (the race-safe accept primitive)
//! - `query` / `get`: one-shot reads
//! - `subscribe`: live query delivering full snapshots, never deltas
//!
//! [`DocumentStore`] is the in-tree engine backed by redb.

pub mod document;
pub mod query;
pub mod subscription;

// Re-exports
pub use document::{ChangeNotice, DocumentStore, StoreOptions};
pub use query::{Filter, FilterOp, OrderBy, Query, Snapshot, SortDirection};
pub use subscription::SnapshotStream;

use async_trait::async_trait;
use serde_json::Value;
use shared::CommandError;
use thiserror::Error;

/// Collection names used by the coordination core.
pub mod collections {
    pub const ORDERS: &str = "orders";
    pub const REQUESTS: &str = "requests";
    pub const MENU: &str = "menu";
    pub const MENU_CATEGORIES: &str = "menu_categories";
}

/// Storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Document not found: {collection}/{id}")]
    DocumentNotFound { collection: String, id: String },

    #[error("Invalid document: {0}")]
    InvalidDocument(&'static str),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for CommandError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DocumentNotFound { collection, id } => {
                // 调用方通常已先行检查存在性，这里兜底
                CommandError::NotFound {
                    entity: "document",
                    id: format!("{collection}/{id}"),
                }
            }
            other => {
                tracing::error!(error = %other, "Store operation failed");
                CommandError::StoreUnavailable(other.to_string())
            }
        }
    }
}

/// Result of a conditional update.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    /// Write committed; carries the updated document
    Applied(Value),
    /// Condition no longer held at write time; nothing was written
    ConditionFailed,
}

/// Storage collaborator for the coordination core.
///
/// Commands resolve only after the engine's write commits. Conditions on
/// `update` are evaluated inside the same write transaction, so at most
/// one of several racing conditional writes can apply.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Insert a new document (must be a JSON object). The store assigns
    /// `id`, `created_at`, `updated_at` and `revision`, and returns the
    /// document as stored.
    async fn create(&self, collection: &str, document: Value) -> StoreResult<Value>;

    /// Point lookup by id. `Ok(None)` when the document does not exist.
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Value>>;

    /// Merge `patch` into the stored document. When `condition` is given
    /// and no longer matches, nothing is written and
    /// [`UpdateOutcome::ConditionFailed`] is returned.
    async fn update(
        &self,
        collection: &str,
        id: &str,
        patch: Value,
        condition: Option<Filter>,
    ) -> StoreResult<UpdateOutcome>;

    /// One-shot filtered read.
    async fn query(&self, query: &Query) -> StoreResult<Snapshot>;

    /// Live query. Delivers an initial snapshot immediately, then a fresh
    /// full snapshot after every change to the queried collection.
    /// Deliveries with an unchanged result set may be skipped.
    fn subscribe(&self, query: Query) -> SnapshotStream;
}
