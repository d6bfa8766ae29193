//! `EmailStore` trait — the single async interface for persistence.
//!
//! The contract is deliberately small: accept a flat key-value record and
//! store it durably in a named collection. Backends own everything else.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StorageError;

/// Backend-agnostic document store.
#[async_trait]
pub trait EmailStore: Send + Sync {
    /// Store one flat record in the named collection.
    async fn store(&self, collection: &str, record: &Value) -> Result<(), StorageError>;
}
