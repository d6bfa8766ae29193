//! Error types for mailhook.

use serde::Serialize;

/// Top-level error type for the service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// A single field-level validation failure.
///
/// `loc` is the path to the offending field in the canonical flat record
/// (e.g. `["sender"]`), which is what the 400 response body carries.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldError {
    pub loc: Vec<String>,
    pub msg: String,
}

impl FieldError {
    pub fn new(field: &str, msg: impl Into<String>) -> Self {
        Self {
            loc: vec![field.to_string()],
            msg: msg.into(),
        }
    }
}

/// Aggregated validation failures for an inbound payload.
///
/// Validation never short-circuits: every invalid field gets its own
/// entry so a single 400 response is a complete diagnostic.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{}", self.summary())]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    pub fn new(errors: Vec<FieldError>) -> Self {
        Self { errors }
    }

    /// A single error with one field path.
    pub fn single(field: &str, msg: impl Into<String>) -> Self {
        Self {
            errors: vec![FieldError::new(field, msg)],
        }
    }

    /// Whether any error references the given field.
    pub fn references(&self, field: &str) -> bool {
        self.errors
            .iter()
            .any(|e| e.loc.iter().any(|part| part == field))
    }

    fn summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| format!("{}: {}", e.loc.join("."), e.msg))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Configuration-related errors. Fatal at startup — the process refuses
/// to start rather than run with a partial routing table.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid configuration: missing 'handlers' section")]
    MissingHandlersSection,

    #[error("Invalid configuration: handler '{handler}' {reason}")]
    InvalidHandlerEntry { handler: String, reason: String },

    #[error("Handler '{0}' is not defined in the handler catalogue")]
    UnknownHandler(String),

    #[error("Handler '{handler}' references unknown step '{step}'")]
    UnknownStep { handler: String, step: String },
}

/// Handler registration errors. Raised immediately, never silently ignored.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Unknown handler '{0}'")]
    UnknownHandler(String),
}

/// Document-store errors. Caught at the handler boundary, logged with
/// full context, and never surfaced to the HTTP caller.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Store request failed: {0}")]
    Request(String),

    #[error("Store rejected write to collection '{collection}': {status}")]
    Rejected { collection: String, status: u16 },
}

/// Result type alias for the service.
pub type Result<T> = std::result::Result<T, Error>;
