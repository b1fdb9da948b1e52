//! In-process document store.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{Mutex, watch};
use tracing::{debug, info};

use super::{Document, DocumentStore, Snapshot, SnapshotReceiver};
use crate::error::RaivoError;

struct Collection {
    documents: Vec<Document>,
    /// Latest contents. Listeners that fall behind skip to the newest value.
    snapshots: watch::Sender<Result<Snapshot, RaivoError>>,
}

impl Collection {
    fn new(documents: Vec<Document>) -> Self {
        let (snapshots, _) = watch::channel(Ok(Snapshot {
            documents: documents.clone(),
        }));
        Self {
            documents,
            snapshots,
        }
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            documents: self.documents.clone(),
        }
    }

    /// Replace the published contents.
    fn publish(&mut self) {
        let snapshot = self.snapshot();
        debug!(
            count = snapshot.documents.len(),
            listeners = self.snapshots.receiver_count(),
            "publishing snapshot"
        );
        self.snapshots.send_replace(Ok(snapshot));
    }
}

impl Default for Collection {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

/// Document store kept in memory.
///
/// Documents keep insertion order. Every write republishes the whole
/// collection to its listeners.
#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<String, Collection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store whose `collection` holds `documents`.
    pub fn with_documents(collection: &str, documents: Vec<Document>) -> Self {
        let mut collections = HashMap::new();
        collections.insert(collection.to_string(), Collection::new(documents));
        Self {
            collections: Mutex::new(collections),
        }
    }

    /// Load a collection from a JSON seed file.
    ///
    /// Accepts either an array of documents carrying an `id` field, or an
    /// object keyed by document id.
    pub fn from_seed_file(collection: &str, path: &Path) -> Result<Self, RaivoError> {
        let raw = std::fs::read_to_string(path)?;
        let value: Value = serde_json::from_str(&raw)?;
        let documents = parse_seed(value)?;
        info!(path = %path.display(), count = documents.len(), "loaded seed documents");
        Ok(Self::with_documents(collection, documents))
    }

    /// Delete a document. Orders are never deleted by the dashboard; this
    /// exists for tests and for clearing out seeds.
    pub async fn remove(&self, collection: &str, id: &str) -> Result<(), RaivoError> {
        let mut collections = self.collections.lock().await;
        let coll = collections
            .get_mut(collection)
            .ok_or_else(|| not_found(collection, id))?;
        let before = coll.documents.len();
        coll.documents.retain(|doc| doc.id != id);
        if coll.documents.len() == before {
            return Err(not_found(collection, id));
        }
        coll.publish();
        Ok(())
    }

    /// Fail every listener of `collection` with `error`, as a dropped
    /// connection to a remote store would.
    pub async fn inject_listener_error(&self, collection: &str, error: &str) {
        let collections = self.collections.lock().await;
        if let Some(coll) = collections.get(collection) {
            coll.snapshots
                .send_replace(Err(RaivoError::Store(error.to_string())));
        }
    }

    /// Current body of one document.
    pub async fn get(&self, collection: &str, id: &str) -> Option<Value> {
        let collections = self.collections.lock().await;
        collections
            .get(collection)?
            .documents
            .iter()
            .find(|doc| doc.id == id)
            .map(|doc| doc.fields.clone())
    }
}

fn not_found(collection: &str, id: &str) -> RaivoError {
    RaivoError::Store(format!("document {}/{} not found", collection, id))
}

fn parse_seed(value: Value) -> Result<Vec<Document>, RaivoError> {
    match value {
        Value::Array(entries) => entries
            .into_iter()
            .enumerate()
            .map(|(i, mut entry)| {
                let id = entry
                    .as_object_mut()
                    .and_then(|map| map.remove("id"))
                    .and_then(|id| id.as_str().map(str::to_string))
                    .ok_or_else(|| {
                        RaivoError::Config(format!("seed entry {} has no string \"id\"", i))
                    })?;
                Ok(Document { id, fields: entry })
            })
            .collect(),
        Value::Object(map) => Ok(map
            .into_iter()
            .map(|(id, fields)| Document { id, fields })
            .collect()),
        _ => Err(RaivoError::Config(
            "seed file must hold an array or an object".into(),
        )),
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn listen(&self, collection: &str) -> Result<SnapshotReceiver, RaivoError> {
        let mut collections = self.collections.lock().await;
        let coll = collections.entry(collection.to_string()).or_default();
        // A listen right after a listener error starts from the documents
        if coll.snapshots.borrow().is_err() {
            coll.publish();
        }
        let mut rx = coll.snapshots.subscribe();
        rx.mark_changed();
        Ok(rx)
    }

    async fn update_field(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        value: Value,
    ) -> Result<(), RaivoError> {
        let mut collections = self.collections.lock().await;
        let coll = collections
            .get_mut(collection)
            .ok_or_else(|| not_found(collection, id))?;
        let doc = coll
            .documents
            .iter_mut()
            .find(|doc| doc.id == id)
            .ok_or_else(|| not_found(collection, id))?;

        match doc.fields.as_object_mut() {
            Some(map) => {
                map.insert(field.to_string(), value);
            }
            None => {
                return Err(RaivoError::Store(format!(
                    "document {}/{} is not an object",
                    collection, id
                )));
            }
        }

        coll.publish();
        Ok(())
    }

    async fn insert(
        &self,
        collection: &str,
        id: Option<String>,
        fields: Value,
    ) -> Result<String, RaivoError> {
        let id = id.unwrap_or_else(|| uuid::Uuid::new_v4().simple().to_string());
        let mut collections = self.collections.lock().await;
        let coll = collections.entry(collection.to_string()).or_default();
        if coll.documents.iter().any(|doc| doc.id == id) {
            return Err(RaivoError::Store(format!(
                "document {}/{} already exists",
                collection, id
            )));
        }
        coll.documents.push(Document {
            id: id.clone(),
            fields,
        });
        coll.publish();
        Ok(id)
    }
}
