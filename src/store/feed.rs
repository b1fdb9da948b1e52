//! The order feed: a live, sorted view of the orders collection.

use std::cmp::Reverse;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, error, info};

use super::{DocumentStore, Snapshot};
use crate::error::RaivoError;
use crate::order::{Order, OrderStatus};

/// Live list of orders, newest first.
///
/// Subscribes to the collection once. Every snapshot replaces the published
/// list as a whole, so readers always see one consistent snapshot.
#[derive(Clone)]
pub struct OrderFeed {
    store: Arc<dyn DocumentStore>,
    collection: String,
    orders: watch::Receiver<Arc<Vec<Order>>>,
}

impl OrderFeed {
    /// Start listening to `collection` and spawn the task that keeps the
    /// published list up to date. Must be called within a tokio runtime.
    pub async fn subscribe(
        store: Arc<dyn DocumentStore>,
        collection: &str,
    ) -> Result<Self, RaivoError> {
        let mut snapshots = store.listen(collection).await?;
        let (tx, rx) = watch::channel(Arc::new(Vec::new()));
        let name = collection.to_string();

        tokio::spawn(async move {
            loop {
                {
                    match &*snapshots.borrow_and_update() {
                        Ok(snapshot) => {
                            let orders = orders_from_snapshot(snapshot);
                            debug!(collection = %name, count = orders.len(), "orders snapshot");
                            tx.send_replace(Arc::new(orders));
                        }
                        // Keep showing the last good snapshot
                        Err(e) => error!(collection = %name, error = %e, "order listener failed"),
                    }
                }
                if snapshots.changed().await.is_err() {
                    break;
                }
            }
            info!(collection = %name, "order listener closed");
        });

        Ok(Self {
            store,
            collection: collection.to_string(),
            orders: rx,
        })
    }

    /// The current snapshot.
    pub fn orders(&self) -> Arc<Vec<Order>> {
        self.orders.borrow().clone()
    }

    /// Look up one order in the current snapshot.
    pub fn find(&self, id: &str) -> Option<Order> {
        self.orders.borrow().iter().find(|o| o.id == id).cloned()
    }

    /// Wait for the next snapshot.
    pub async fn changed(&mut self) -> Result<(), RaivoError> {
        self.orders
            .changed()
            .await
            .map_err(|_| RaivoError::Store("order listener stopped".into()))
    }

    /// A receiver of snapshots, for consumers that want to await on their own.
    pub fn watch(&self) -> watch::Receiver<Arc<Vec<Order>>> {
        self.orders.clone()
    }

    /// Write the `status` field of order `id`. Only that field changes.
    pub async fn update_status(&self, id: &str, status: OrderStatus) -> Result<(), RaivoError> {
        self.store
            .update_field(
                &self.collection,
                id,
                "status",
                Value::String(status.as_str().to_string()),
            )
            .await
    }

    /// The backing store.
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }
}

/// Decode every document of a snapshot, newest first.
///
/// Documents that fail to decode are logged and left out. Missing timestamps
/// sort as zero, and orders with equal timestamps keep their store order.
pub fn orders_from_snapshot(snapshot: &Snapshot) -> Vec<Order> {
    let mut orders: Vec<Order> = snapshot
        .documents
        .iter()
        .filter_map(|doc| match Order::from_document(doc) {
            Ok(order) => Some(order),
            Err(e) => {
                error!(id = %doc.id, error = %e, "skipping undecodable order document");
                None
            }
        })
        .collect();
    orders.sort_by_key(|order| Reverse(order.sort_key()));
    orders
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Document, MemoryStore};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn doc(id: &str, fields: Value) -> Document {
        Document {
            id: id.into(),
            fields,
        }
    }

    fn ids(orders: &[Order]) -> Vec<&str> {
        orders.iter().map(|o| o.id.as_str()).collect()
    }

    #[test]
    fn test_sort_descending_stable() {
        let snapshot = Snapshot {
            documents: vec![
                doc("a", json!({ "timestamp": 100 })),
                doc("b", json!({ "timestamp": 300 })),
                doc("c", json!({ "timestamp": 100 })),
                doc("d", json!({})),
                doc("e", json!({ "timestamp": 300 })),
            ],
        };
        let orders = orders_from_snapshot(&snapshot);
        assert_eq!(ids(&orders), vec!["b", "e", "a", "c", "d"]);
    }

    #[test]
    fn test_bad_document_does_not_hide_others() {
        let snapshot = Snapshot {
            documents: vec![
                doc("good1", json!({ "status": "NEW", "timestamp": 2 })),
                doc("bad", json!({ "status": "LOST" })),
                doc("good2", json!({ "status": "READY", "timestamp": 1 })),
            ],
        };
        let orders = orders_from_snapshot(&snapshot);
        assert_eq!(ids(&orders), vec!["good1", "good2"]);
    }

    #[tokio::test]
    async fn test_feed_tracks_store() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert("orders", Some("a".into()), json!({ "timestamp": 1, "status": "NEW" }))
            .await
            .unwrap();

        let mut feed = OrderFeed::subscribe(store.clone(), "orders").await.unwrap();
        feed.changed().await.unwrap();
        assert_eq!(ids(&feed.orders()), vec!["a"]);

        store
            .insert("orders", Some("b".into()), json!({ "timestamp": 2 }))
            .await
            .unwrap();
        feed.changed().await.unwrap();
        assert_eq!(ids(&feed.orders()), vec!["b", "a"]);
    }

    #[tokio::test]
    async fn test_burst_of_inserts_ends_on_latest_snapshot() {
        let store = Arc::new(MemoryStore::new());
        let mut feed = OrderFeed::subscribe(store.clone(), "orders").await.unwrap();

        for n in 0..40 {
            store
                .insert("orders", Some(format!("order-{n:02}")), json!({ "timestamp": n }))
                .await
                .unwrap();
        }

        tokio::time::timeout(std::time::Duration::from_secs(2), async {
            while feed.orders().len() < 40 {
                feed.changed().await.unwrap();
            }
        })
        .await
        .expect("feed never caught up with the store");

        let orders = feed.orders();
        assert_eq!(orders.len(), 40);
        assert_eq!(orders[0].id, "order-39");
    }

    #[tokio::test]
    async fn test_update_status_writes_literal() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert("orders", Some("a".into()), json!({ "status": "NEW", "customerName": "Ana" }))
            .await
            .unwrap();
        let feed = OrderFeed::subscribe(store.clone(), "orders").await.unwrap();

        feed.update_status("a", OrderStatus::Preparing).await.unwrap();

        let fields = store.get("orders", "a").await.unwrap();
        assert_eq!(fields, json!({ "status": "PREPARING", "customerName": "Ana" }));
    }

    #[tokio::test]
    async fn test_update_status_missing_order_errors() {
        let store = Arc::new(MemoryStore::new());
        let feed = OrderFeed::subscribe(store, "orders").await.unwrap();
        assert!(feed.update_status("nope", OrderStatus::Ready).await.is_err());
    }

    #[tokio::test]
    async fn test_listener_error_keeps_last_snapshot() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert("orders", Some("a".into()), json!({}))
            .await
            .unwrap();
        let mut feed = OrderFeed::subscribe(store.clone(), "orders").await.unwrap();
        feed.changed().await.unwrap();

        store.inject_listener_error("orders", "connection reset").await;
        store
            .insert("orders", Some("b".into()), json!({}))
            .await
            .unwrap();
        feed.changed().await.unwrap();

        assert_eq!(feed.orders().len(), 2);
    }
}
