//! # Document Store
//!
//! The remote order collection, seen through a small trait:
//!
//! - [`DocumentStore::listen`] pushes the whole collection on every change
//! - [`DocumentStore::update_field`] writes one field of one document
//! - [`DocumentStore::insert`] adds a document (the ingest path)
//!
//! [`MemoryStore`] implements it in-process. [`OrderFeed`] sits on top and
//! turns raw snapshots into a sorted list of orders.

mod feed;
mod memory;

pub use feed::OrderFeed;
pub use memory::MemoryStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::watch;

use crate::error::RaivoError;

/// Name of the collection holding orders.
pub const ORDERS_COLLECTION: &str = "orders";

/// One document: its key and its body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub fields: Value,
}

/// The full contents of a collection at one point in time, in store order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub documents: Vec<Document>,
}

/// Latest snapshot of a collection, or the listener error that replaced it.
///
/// Holds one value: a reader that falls behind skips straight to the newest
/// contents instead of losing them.
pub type SnapshotReceiver = watch::Receiver<Result<Snapshot, RaivoError>>;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Subscribe to a collection. The receiver starts out marked changed and
    /// holding the current contents.
    async fn listen(&self, collection: &str) -> Result<SnapshotReceiver, RaivoError>;

    /// Set `field` of document `id` to `value`, leaving other fields alone.
    async fn update_field(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        value: Value,
    ) -> Result<(), RaivoError>;

    /// Insert a document, generating a key when `id` is `None`. Returns the key.
    async fn insert(
        &self,
        collection: &str,
        id: Option<String>,
        fields: Value,
    ) -> Result<String, RaivoError>;
}
