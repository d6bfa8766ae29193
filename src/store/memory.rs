//! In-memory store backend.
//!
//! Used by the test suite and as the fallback when no store URL is
//! configured (records are kept for the process lifetime only).

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::error::StorageError;
use crate::store::traits::EmailStore;

/// A record captured by the in-memory store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub collection: String,
    pub record: Value,
}

/// In-memory `EmailStore` backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<StoredRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything stored so far.
    pub async fn stored(&self) -> Vec<StoredRecord> {
        self.records.lock().await.clone()
    }

    /// Records stored in one collection.
    pub async fn stored_in(&self, collection: &str) -> Vec<Value> {
        self.records
            .lock()
            .await
            .iter()
            .filter(|r| r.collection == collection)
            .map(|r| r.record.clone())
            .collect()
    }

    pub async fn count(&self) -> usize {
        self.records.lock().await.len()
    }
}

#[async_trait]
impl EmailStore for MemoryStore {
    async fn store(&self, collection: &str, record: &Value) -> Result<(), StorageError> {
        self.records.lock().await.push(StoredRecord {
            collection: collection.to_string(),
            record: record.clone(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn stores_records_per_collection() {
        let store = MemoryStore::new();
        store.store("emails", &json!({"subject": "a"})).await.unwrap();
        store
            .store("staging_emails", &json!({"subject": "b"}))
            .await
            .unwrap();

        assert_eq!(store.count().await, 2);
        let staged = store.stored_in("staging_emails").await;
        assert_eq!(staged.len(), 1);
        assert_eq!(staged[0]["subject"], "b");
        assert!(store.stored_in("missing").await.is_empty());
    }
}
