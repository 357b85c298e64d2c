//! Live query worker
//!
//! One task per subscription: query, deliver, wait for a change notice on
//! the queried collection, re-query. Every delivery is a complete result
//! set; consumers replace their state wholesale, so a lagged change feed
//! or a failed read never leaves them with torn state. Redeliveries whose
//! result set is unchanged (same ids, same per-document revisions) are
//! skipped.

use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};

use super::document::{ChangeNotice, DocumentStore};
use super::query::{Query, Snapshot};
use super::{EntityStore, StoreResult};

/// Stream of full snapshots for one live query.
///
/// `Err` deliveries signal a degraded store; the worker keeps retrying
/// and the first `Ok` afterwards is always a complete fresh snapshot.
/// Dropping the stream stops its worker.
pub struct SnapshotStream {
    rx: mpsc::Receiver<StoreResult<Snapshot>>,
}

impl SnapshotStream {
    pub async fn recv(&mut self) -> Option<StoreResult<Snapshot>> {
        self.rx.recv().await
    }

    /// Wrap a channel of full-snapshot deliveries. This is how alternative
    /// [`EntityStore`] implementations hand out streams.
    pub fn from_channel(rx: mpsc::Receiver<StoreResult<Snapshot>>) -> Self {
        Self { rx }
    }
}

impl futures::Stream for SnapshotStream {
    type Item = StoreResult<Snapshot>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx)
    }
}

/// (id, revision) pairs identifying one delivered result set.
type ResultFingerprint = Vec<(String, u64)>;

fn fingerprint(snapshot: &Snapshot) -> ResultFingerprint {
    snapshot
        .docs
        .iter()
        .map(|doc| {
            (
                doc.get("id")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string(),
                doc.get("revision").and_then(|v| v.as_u64()).unwrap_or_default(),
            )
        })
        .collect()
}

/// Spawn the worker for one live query. Must run inside a tokio runtime.
pub(crate) fn spawn_stream(store: DocumentStore, query: Query) -> SnapshotStream {
    let (tx, rx) = mpsc::channel(store.options().snapshot_buffer);
    // Subscribe before the first query so no commit slips between the
    // initial snapshot and the start of change watching.
    let changes = store.subscribe_changes();
    let retry_delay = store.options().retry_delay;
    tokio::spawn(run_worker(store, query, tx, changes, retry_delay));
    SnapshotStream { rx }
}

async fn run_worker(
    store: DocumentStore,
    query: Query,
    tx: mpsc::Sender<StoreResult<Snapshot>>,
    mut changes: broadcast::Receiver<ChangeNotice>,
    retry_delay: Duration,
) {
    let mut delivered: Option<ResultFingerprint> = None;
    let mut degraded = false;

    loop {
        match store.query(&query).await {
            Ok(snapshot) => {
                if degraded {
                    degraded = false;
                    // resume must redeliver in full, even if unchanged
                    delivered = None;
                    tracing::info!(collection = %query.collection, "Live query recovered");
                }
                let fp = fingerprint(&snapshot);
                if delivered.as_ref() != Some(&fp) {
                    delivered = Some(fp);
                    if tx.send(Ok(snapshot)).await.is_err() {
                        return;
                    }
                }
            }
            Err(e) => {
                tracing::warn!(
                    collection = %query.collection,
                    error = %e,
                    "Live query failed, retrying"
                );
                if !degraded {
                    degraded = true;
                    if tx.send(Err(e)).await.is_err() {
                        return;
                    }
                }
                tokio::select! {
                    _ = tx.closed() => return,
                    _ = tokio::time::sleep(retry_delay) => {}
                }
                continue;
            }
        }

        // Wait for the next change touching this collection.
        loop {
            tokio::select! {
                _ = tx.closed() => return,
                notice = changes.recv() => match notice {
                    Ok(notice) if notice.collection == query.collection => break,
                    Ok(_) => continue,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "Change feed lagged, re-querying");
                        // the next full snapshot covers whatever was missed
                        break;
                    }
                    Err(broadcast::error::RecvError::Closed) => return,
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::collections;
    use serde_json::json;

    fn order_doc(table: &str, status: &str) -> serde_json::Value {
        json!({
            "table_number": table,
            "items": [],
            "total": 0.0,
            "status": status,
            "estimated_time": null,
        })
    }

    #[tokio::test]
    async fn test_initial_snapshot_is_delivered_immediately() {
        let store = DocumentStore::open_in_memory().unwrap();
        store
            .create(collections::ORDERS, order_doc("3", "pending"))
            .await
            .unwrap();

        let mut stream = store.subscribe(Query::collection(collections::ORDERS));
        let snapshot = stream.recv().await.unwrap().unwrap();
        assert_eq!(snapshot.docs.len(), 1);
        assert_eq!(snapshot.docs[0]["table_number"], "3");
    }

    #[tokio::test]
    async fn test_change_triggers_full_redelivery() {
        let store = DocumentStore::open_in_memory().unwrap();
        let mut stream = store.subscribe(Query::collection(collections::ORDERS));

        let initial = stream.recv().await.unwrap().unwrap();
        assert!(initial.docs.is_empty());

        let doc = store
            .create(collections::ORDERS, order_doc("3", "pending"))
            .await
            .unwrap();
        let after_create = stream.recv().await.unwrap().unwrap();
        assert_eq!(after_create.docs.len(), 1);

        let id = doc["id"].as_str().unwrap();
        store
            .update(collections::ORDERS, id, json!({"status": "preparing"}), None)
            .await
            .unwrap();
        let after_update = stream.recv().await.unwrap().unwrap();
        assert_eq!(after_update.docs.len(), 1);
        assert_eq!(after_update.docs[0]["status"], "preparing");
        assert!(after_update.generation > after_create.generation);
    }

    #[tokio::test]
    async fn test_unchanged_result_set_is_not_redelivered() {
        let store = DocumentStore::open_in_memory().unwrap();
        let mut stream = store.subscribe(
            Query::collection(collections::ORDERS)
                .filter(crate::store::Filter::eq("table_number", "3"))
                .order_by_desc("created_at"),
        );
        stream.recv().await.unwrap().unwrap();

        store
            .create(collections::ORDERS, order_doc("3", "pending"))
            .await
            .unwrap();
        assert_eq!(stream.recv().await.unwrap().unwrap().docs.len(), 1);

        // A write to the same collection that does not affect the result
        // set must not produce a delivery; the next one we see is for the
        // second table-3 order.
        store
            .create(collections::ORDERS, order_doc("5", "pending"))
            .await
            .unwrap();
        store
            .create(collections::ORDERS, order_doc("3", "pending"))
            .await
            .unwrap();
        let delivery = stream.recv().await.unwrap().unwrap();
        assert_eq!(delivery.docs.len(), 2);
    }

    #[tokio::test]
    async fn test_other_collection_changes_are_ignored() {
        let store = DocumentStore::open_in_memory().unwrap();
        let mut stream = store.subscribe(Query::collection(collections::ORDERS));
        stream.recv().await.unwrap().unwrap();

        store
            .create(
                collections::REQUESTS,
                json!({"table_number": "3", "service_type": "waiter", "status": "pending"}),
            )
            .await
            .unwrap();
        store
            .create(collections::ORDERS, order_doc("3", "pending"))
            .await
            .unwrap();

        // only the orders write is delivered
        let delivery = stream.recv().await.unwrap().unwrap();
        assert_eq!(delivery.docs.len(), 1);
        assert_eq!(delivery.docs[0]["table_number"], "3");
    }
}
