//! Handler registry — routes sender addresses to handler kinds.
//!
//! A small, mostly-static routing table: populated once at startup from
//! configuration, then read on every request. Writes take the exclusive
//! lock; lookups share the read lock.

use std::collections::HashMap;

use tokio::sync::RwLock;
use tracing::debug;

use crate::error::RegistryError;
use crate::pipeline::HandlerKind;

/// Kind returned for senders with no registration.
pub const DEFAULT_HANDLER: HandlerKind = HandlerKind::Base;

/// Registry mapping sender addresses to handler kinds.
#[derive(Debug, Default)]
pub struct HandlerRegistry {
    entries: RwLock<HashMap<String, HandlerKind>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler kind for a sender. Exact-string key;
    /// last write wins.
    pub async fn register(&self, sender: &str, kind: HandlerKind) {
        self.entries.write().await.insert(sender.to_string(), kind);
        debug!(sender, handler = kind.name(), "Registered handler");
    }

    /// Register by catalogue name. Unknown names are an error, raised
    /// immediately rather than deferred to lookup time.
    pub async fn register_by_name(&self, sender: &str, name: &str) -> Result<(), RegistryError> {
        let kind = HandlerKind::from_name(name)
            .ok_or_else(|| RegistryError::UnknownHandler(name.to_string()))?;
        self.register(sender, kind).await;
        Ok(())
    }

    /// Fetch the handler kind for a sender, falling back to the default.
    /// Exact string match only — no wildcard or domain-level matching.
    pub async fn handler_for_sender(&self, sender: &str) -> HandlerKind {
        self.entries
            .read()
            .await
            .get(sender)
            .copied()
            .unwrap_or(DEFAULT_HANDLER)
    }

    /// Number of registered senders.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
