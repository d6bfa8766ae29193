//! HTTP document-store backend.
//!
//! Writes each record with `POST {base_url}/{collection}`. The store is
//! treated as opaque: any 2xx is success, anything else is a
//! `StorageError` for the handler to log and swallow.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::error::StorageError;
use crate::store::traits::EmailStore;

/// `EmailStore` backend over a REST document store.
#[derive(Debug, Clone)]
pub struct HttpStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/{}", self.base_url, collection)
    }
}

#[async_trait]
impl EmailStore for HttpStore {
    async fn store(&self, collection: &str, record: &Value) -> Result<(), StorageError> {
        let url = self.collection_url(collection);
        debug!(%url, "Writing record to document store");

        let response = self
            .client
            .post(&url)
            .json(record)
            .send()
            .await
            .map_err(|e| StorageError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StorageError::Rejected {
                collection: collection.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}
