//! redb-backed document store
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | one per collection | document id | JSON document | Entity storage |
//! | `meta` | `"revision"` / `"last_timestamp_ms"` | `u64` | Global revision counter, timestamp high-water mark |
//!
//! Every committed write bumps the global revision and stamps the written
//! document with it; a query reads the revision in the same read
//! transaction, so a [`Snapshot`] is always a consistent cut. The single
//! redb writer is what makes conditional updates race-safe: the condition
//! is re-evaluated inside the write transaction that applies the patch.

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};
use serde_json::{Value, json};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;
use tokio::sync::broadcast;

use super::query::{Filter, Query, Snapshot};
use super::subscription::{self, SnapshotStream};
use super::{EntityStore, StoreError, StoreResult, UpdateOutcome};
use async_trait::async_trait;

/// Meta table: key = "revision" or "last_timestamp_ms", value = u64
const META_TABLE: TableDefinition<&str, u64> = TableDefinition::new("meta");

const REVISION_KEY: &str = "revision";
const LAST_TIMESTAMP_KEY: &str = "last_timestamp_ms";

/// 每个 collection 一张表：key = 文档 id，value = JSON 序列化文档
fn collection_table(name: &str) -> TableDefinition<'_, &'static str, &'static [u8]> {
    TableDefinition::new(name)
}

/// Tuning knobs for the embedded engine.
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Change feed broadcast capacity
    pub change_capacity: usize,
    /// Per-subscription snapshot channel buffer
    pub snapshot_buffer: usize,
    /// Delay before re-querying after a failed read on a live query
    pub retry_delay: Duration,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            change_capacity: 1024,
            snapshot_buffer: 16,
            retry_delay: Duration::from_millis(5000),
        }
    }
}

/// Broadcast to live queries after every committed write.
#[derive(Debug, Clone)]
pub struct ChangeNotice {
    pub collection: String,
    pub revision: u64,
}

/// Document store backed by redb
#[derive(Clone)]
pub struct DocumentStore {
    db: Arc<Database>,
    change_tx: broadcast::Sender<ChangeNotice>,
    /// Timestamp high-water mark; created_at/updated_at are strictly
    /// increasing within a store instance even when the clock stalls
    last_ts: Arc<AtomicI64>,
    options: StoreOptions,
}

impl std::fmt::Debug for DocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentStore")
            .field("db", &"<redb::Database>")
            .field("options", &self.options)
            .finish()
    }
}

impl DocumentStore {
    /// Open or create the database at the given path.
    ///
    /// redb commits with `Durability::Immediate`, so acknowledged writes
    /// survive a crash and the file is always in a consistent state.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::open_with(path, StoreOptions::default())
    }

    pub fn open_with(path: impl AsRef<Path>, options: StoreOptions) -> StoreResult<Self> {
        let db = Database::create(path)?;
        Self::init(db, options)
    }

    /// Open an in-memory database (tests, demos).
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::open_in_memory_with(StoreOptions::default())
    }

    pub fn open_in_memory_with(options: StoreOptions) -> StoreResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db, options)
    }

    fn init(db: Database, options: StoreOptions) -> StoreResult<Self> {
        let write_txn = db.begin_write()?;
        let last_ts = {
            let mut meta = write_txn.open_table(META_TABLE)?;
            if meta.get(REVISION_KEY)?.is_none() {
                meta.insert(REVISION_KEY, 0u64)?;
            }
            meta.get(LAST_TIMESTAMP_KEY)?
                .map(|guard| guard.value() as i64)
                .unwrap_or(0)
        };
        write_txn.commit()?;

        let (change_tx, _) = broadcast::channel(options.change_capacity);
        Ok(Self {
            db: Arc::new(db),
            change_tx,
            last_ts: Arc::new(AtomicI64::new(last_ts)),
            options,
        })
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    /// Raw change feed. Live queries consume this internally; exposed for
    /// callers that want to observe write activity directly.
    pub fn subscribe_changes(&self) -> broadcast::Receiver<ChangeNotice> {
        self.change_tx.subscribe()
    }

    /// Next created_at/updated_at value, strictly greater than any value
    /// issued before by this instance.
    ///
    /// Only called while holding the write transaction; redb has a single
    /// writer, so the plain load/store pair cannot race.
    fn next_timestamp(&self) -> i64 {
        let now = shared::util::now_millis();
        let last = self.last_ts.load(Ordering::Acquire);
        let ts = now.max(last + 1);
        self.last_ts.store(ts, Ordering::Release);
        ts
    }

    /// Increment the global revision and persist the timestamp high-water
    /// mark, all within the caller's transaction.
    fn bump_revision(txn: &WriteTransaction, ts: i64) -> StoreResult<u64> {
        let mut meta = txn.open_table(META_TABLE)?;
        let next = meta.get(REVISION_KEY)?.map(|guard| guard.value()).unwrap_or(0) + 1;
        meta.insert(REVISION_KEY, next)?;
        // epoch millis, never negative
        meta.insert(LAST_TIMESTAMP_KEY, ts as u64)?;
        Ok(next)
    }

    fn publish_change(&self, collection: &str, revision: u64) {
        let notice = ChangeNotice {
            collection: collection.to_string(),
            revision,
        };
        // 没有订阅者时发送失败是正常情况
        let _ = self.change_tx.send(notice);
    }
}

#[async_trait]
impl EntityStore for DocumentStore {
    async fn create(&self, collection: &str, document: Value) -> StoreResult<Value> {
        let Value::Object(mut fields) = document else {
            return Err(StoreError::InvalidDocument("document must be a JSON object"));
        };

        let id = uuid::Uuid::new_v4().to_string();
        let txn = self.db.begin_write()?;
        let (stored, revision) = {
            let ts = self.next_timestamp();
            let revision = Self::bump_revision(&txn, ts)?;

            fields.insert("id".into(), json!(id));
            fields.insert("created_at".into(), json!(ts));
            fields.insert("updated_at".into(), json!(ts));
            fields.insert("revision".into(), json!(revision));
            let doc = Value::Object(fields);

            let bytes = serde_json::to_vec(&doc)?;
            let mut table = txn.open_table(collection_table(collection))?;
            table.insert(id.as_str(), bytes.as_slice())?;
            (doc, revision)
        };
        txn.commit()?;

        tracing::debug!(collection, id = %id, revision, "Document created");
        self.publish_change(collection, revision);
        Ok(stored)
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Value>> {
        let txn = self.db.begin_read()?;
        let table = match txn.open_table(collection_table(collection)) {
            Ok(table) => table,
            Err(redb::TableError::TableDoesNotExist(_)) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match table.get(id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        patch: Value,
        condition: Option<Filter>,
    ) -> StoreResult<UpdateOutcome> {
        let Value::Object(patch_fields) = patch else {
            return Err(StoreError::InvalidDocument("patch must be a JSON object"));
        };

        let txn = self.db.begin_write()?;
        let (updated, revision) = {
            let mut table = txn.open_table(collection_table(collection))?;
            let current: Value = match table.get(id)? {
                Some(guard) => serde_json::from_slice(guard.value())?,
                None => {
                    return Err(StoreError::DocumentNotFound {
                        collection: collection.to_string(),
                        id: id.to_string(),
                    });
                }
            };

            // Condition re-check inside the write transaction: of several
            // racing conditional writes, only the first can pass.
            if let Some(cond) = &condition
                && !cond.matches(&current)
            {
                return Ok(UpdateOutcome::ConditionFailed);
            }

            let Value::Object(mut doc) = current else {
                return Err(StoreError::InvalidDocument("stored document is not an object"));
            };

            let ts = self.next_timestamp();
            let revision = Self::bump_revision(&txn, ts)?;
            for (key, value) in patch_fields {
                doc.insert(key, value);
            }
            doc.insert("updated_at".into(), json!(ts));
            doc.insert("revision".into(), json!(revision));
            let updated = Value::Object(doc);

            let bytes = serde_json::to_vec(&updated)?;
            table.insert(id, bytes.as_slice())?;
            (updated, revision)
        };
        txn.commit()?;

        tracing::debug!(collection, id, revision, "Document updated");
        self.publish_change(collection, revision);
        Ok(UpdateOutcome::Applied(updated))
    }

    async fn query(&self, query: &Query) -> StoreResult<Snapshot> {
        let txn = self.db.begin_read()?;
        let generation = {
            let meta = txn.open_table(META_TABLE)?;
            meta.get(REVISION_KEY)?.map(|guard| guard.value()).unwrap_or(0)
        };

        let mut docs = Vec::new();
        match txn.open_table(collection_table(&query.collection)) {
            Ok(table) => {
                for entry in table.iter()? {
                    let (_, value) = entry?;
                    let doc: Value = serde_json::from_slice(value.value())?;
                    if query.matches(&doc) {
                        docs.push(doc);
                    }
                }
            }
            // Collection never written to: empty result, valid generation
            Err(redb::TableError::TableDoesNotExist(_)) => {}
            Err(e) => return Err(e.into()),
        }

        query.sort_and_truncate(&mut docs);
        Ok(Snapshot { generation, docs })
    }

    fn subscribe(&self, query: Query) -> SnapshotStream {
        subscription::spawn_stream(self.clone(), query)
    }
}
