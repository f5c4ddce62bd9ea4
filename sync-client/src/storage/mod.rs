//! Local persistence for the sync queue.
//!
//! The queue is stored as one JSON document under [`SYNC_QUEUE_KEY`] in a
//! namespaced key-value store. [`QueueStore`] wraps any [`KeyValueStore`]
//! with the load/save contract the service relies on: loading never fails
//! (a missing or corrupt document is an empty queue, an unreadable entry is
//! skipped) and saving writes the whole queue, last write wins.

mod file;
mod memory;
mod sqlite;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use cleanout_sync_types::SyncOperation;
use serde::Deserialize;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

/// Key holding the serialized queue.
pub const SYNC_QUEUE_KEY: &str = "sync_queue";

/// Key holding whatever the last load could not read: the rejected entries
/// as a JSON array, or the raw document when it was not an array.
pub const CORRUPT_QUEUE_KEY: &str = "sync_queue.corrupt";

/// Key holding the bearer token attached to backend requests.
pub const AUTH_TOKEN_KEY: &str = "auth_token";

/// Storage errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Filesystem error.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Queue document could not be encoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Key contains characters the backend cannot store.
    #[error("invalid key: {0:?}")]
    InvalidKey(String),

    /// Store refused the operation (test stores only).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Asynchronous string key-value storage.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value. `Ok(None)` if the key is absent.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a value, replacing any previous one.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete a value. Deleting an absent key succeeds.
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Durable queue persisted under [`SYNC_QUEUE_KEY`].
#[derive(Clone)]
pub struct QueueStore {
    kv: Arc<dyn KeyValueStore>,
}

impl QueueStore {
    /// Wrap a key-value store.
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// A queue store backed by a fresh [`MemoryStore`].
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// The underlying key-value store.
    pub fn kv(&self) -> &Arc<dyn KeyValueStore> {
        &self.kv
    }

    /// Load the persisted queue.
    ///
    /// Returns an empty queue if nothing is stored, the read fails, or the
    /// document is not a JSON array. Entries are decoded one by one: a bad
    /// entry is dropped and the rest are kept. Whatever was dropped (the
    /// rejected entries, or the whole document if it is not an array) is
    /// copied to [`CORRUPT_QUEUE_KEY`] before the next save overwrites it.
    pub async fn load(&self) -> Vec<SyncOperation> {
        let raw = match self.kv.get(SYNC_QUEUE_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read sync queue, starting empty");
                return Vec::new();
            }
        };

        let entries = match serde_json::from_str::<Vec<Value>>(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(error = %e, "sync queue is corrupt, starting empty");
                self.keep_corrupt(&raw).await;
                return Vec::new();
            }
        };

        let total = entries.len();
        let mut operations = Vec::with_capacity(total);
        let mut rejected = Vec::new();
        for (index, entry) in entries.into_iter().enumerate() {
            match SyncOperation::deserialize(&entry) {
                Ok(operation) => operations.push(operation),
                Err(e) => {
                    tracing::warn!(
                        index,
                        id = entry.get("id").and_then(serde_json::Value::as_str).unwrap_or("?"),
                        error = %e,
                        "dropping unreadable queued operation"
                    );
                    rejected.push(entry);
                }
            }
        }

        if !rejected.is_empty() {
            match serde_json::to_string(&rejected) {
                Ok(doc) => self.keep_corrupt(&doc).await,
                Err(e) => tracing::warn!(error = %e, "failed to encode rejected operations"),
            }
        }
        tracing::debug!(
            count = operations.len(),
            rejected = rejected.len(),
            "loaded sync queue"
        );
        operations
    }

    async fn keep_corrupt(&self, doc: &str) {
        if let Err(e) = self.kv.set(CORRUPT_QUEUE_KEY, doc).await {
            tracing::warn!(error = %e, "failed to keep copy of corrupt sync queue");
        }
    }

    /// Persist the full queue.
    pub async fn save(&self, operations: &[SyncOperation]) -> Result<(), StoreError> {
        let raw = serde_json::to_string(operations)?;
        self.kv.set(SYNC_QUEUE_KEY, &raw).await
    }
}

impl std::fmt::Debug for QueueStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueStore").finish_non_exhaustive()
    }
}

/// Reject keys that cannot be used as file names or are empty.
pub(crate) fn validate_key(key: &str) -> Result<(), StoreError> {
    let valid = !key.is_empty()
        && key != "."
        && key != ".."
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cleanout_sync_types::{EntityType, NewRoom, OperationType, Payload};

    fn room_op(name: &str) -> SyncOperation {
        SyncOperation::new(
            OperationType::Create,
            EntityType::Room,
            "",
            Payload::CreateRoom(NewRoom {
                job_id: "J1".into(),
                room_name: name.into(),
                room_number: 1,
                image_uri: "/photos/room.jpg".into(),
            }),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn load_empty_store_returns_empty_queue() {
        let store = QueueStore::in_memory();
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn save_then_load_keeps_order() {
        let store = QueueStore::in_memory();
        let ops = vec![room_op("Kitchen"), room_op("Attic")];

        store.save(&ops).await.unwrap();
        let loaded = store.load().await;

        assert_eq!(loaded, ops);
    }

    #[tokio::test]
    async fn corrupt_queue_degrades_to_empty_and_is_kept_aside() {
        let kv = Arc::new(MemoryStore::new());
        kv.set(SYNC_QUEUE_KEY, "{not json").await.unwrap();
        let store = QueueStore::new(kv.clone());

        assert!(store.load().await.is_empty());
        assert_eq!(
            kv.get(CORRUPT_QUEUE_KEY).await.unwrap().as_deref(),
            Some("{not json")
        );
    }

    #[tokio::test]
    async fn unreadable_entry_is_dropped_and_rest_kept() {
        let kv = Arc::new(MemoryStore::new());
        let good = [room_op("Kitchen"), room_op("Attic")];
        let mut doc = serde_json::to_value(&good).unwrap();
        let bad = serde_json::json!({
            "id": "b",
            "operation_type": "create",
            "entity_type": "room",
            "entity_id": "",
            "data": {
                "job_id": "J1",
                "room_name": "Den",
                "room_number": -1,
                "image_uri": "/photos/den.jpg"
            },
            "timestamp": "2024-06-10T08:00:00Z",
            "synced": false
        });
        doc.as_array_mut().unwrap().insert(1, bad.clone());
        kv.set(SYNC_QUEUE_KEY, &doc.to_string()).await.unwrap();

        let loaded = QueueStore::new(kv.clone()).load().await;

        assert_eq!(loaded, good);
        let kept: Value =
            serde_json::from_str(&kv.get(CORRUPT_QUEUE_KEY).await.unwrap().unwrap()).unwrap();
        assert_eq!(kept, serde_json::json!([bad]));
    }

    #[tokio::test]
    async fn blank_delete_target_is_dropped() {
        let kv = Arc::new(MemoryStore::new());
        let doc = serde_json::json!([
            {
                "id": "d1",
                "operation_type": "delete",
                "entity_type": "job",
                "entity_id": "",
                "timestamp": "2024-06-10T08:00:00Z"
            },
            {
                "id": "d2",
                "operation_type": "delete",
                "entity_type": "job",
                "entity_id": "J2",
                "timestamp": "2024-06-10T08:00:01Z"
            }
        ]);
        kv.set(SYNC_QUEUE_KEY, &doc.to_string()).await.unwrap();

        let loaded = QueueStore::new(kv).load().await;

        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].entity_id(), "J2");
    }

    #[tokio::test]
    async fn clean_load_leaves_no_corrupt_copy() {
        let kv = Arc::new(MemoryStore::new());
        let store = QueueStore::new(kv.clone());
        store.save(&[room_op("Den")]).await.unwrap();

        assert_eq!(store.load().await.len(), 1);
        assert_eq!(kv.get(CORRUPT_QUEUE_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn read_failure_degrades_to_empty() {
        let kv = Arc::new(MemoryStore::new());
        QueueStore::new(kv.clone())
            .save(&[room_op("Den")])
            .await
            .unwrap();
        kv.fail_reads(true);

        assert!(QueueStore::new(kv).load().await.is_empty());
    }

    #[tokio::test]
    async fn stored_document_is_a_json_array() {
        let kv = Arc::new(MemoryStore::new());
        let store = QueueStore::new(kv.clone());
        store.save(&[room_op("Garage")]).await.unwrap();

        let raw = kv.get(SYNC_QUEUE_KEY).await.unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value[0]["data"]["room_name"], "Garage");
        assert_eq!(value[0]["synced"], false);
    }

    #[test]
    fn key_validation() {
        assert!(validate_key(SYNC_QUEUE_KEY).is_ok());
        assert!(validate_key(CORRUPT_QUEUE_KEY).is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("..").is_err());
        assert!(validate_key("../etc/passwd").is_err());
        assert!(validate_key("a b").is_err());
    }
}
