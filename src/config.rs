//! Configuration: environment-driven app settings and the declarative
//! handler-config document.
//!
//! The handler config maps handler names to `{steps, senders}`. Structure
//! and referential integrity (handler names against the catalogue, step
//! names against the step catalogue) are validated at load time; any
//! violation is fatal at startup.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_yaml::Value as YamlValue;
use tracing::info;

use crate::error::ConfigError;
use crate::pipeline::{HandlerKind, step_by_name};
use crate::registry::HandlerRegistry;

/// Default path of the handler config document.
pub const DEFAULT_HANDLER_CONFIG_PATH: &str = "config/handler_config.yaml";

/// Environment-driven application settings.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Listen address for the HTTP server.
    pub bind_addr: String,
    /// Path to the handler config document.
    pub handler_config_path: PathBuf,
    /// Document store base URL. `None` selects the in-memory store.
    pub store_url: Option<String>,
    /// Default storage collection name.
    pub collection: String,
    /// Deployment metadata reported by the health endpoint.
    pub version: String,
    pub deployed_at: String,
}

impl AppConfig {
    /// Build configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("MAILHOOK_BIND")
                .unwrap_or_else(|_| "0.0.0.0:8000".to_string()),
            handler_config_path: std::env::var("MAILHOOK_HANDLER_CONFIG")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_HANDLER_CONFIG_PATH)),
            store_url: std::env::var("MAILHOOK_STORE_URL").ok(),
            collection: std::env::var("MAILHOOK_COLLECTION")
                .or_else(|_| std::env::var("FIRESTORE_COLLECTION"))
                .unwrap_or_else(|_| "emails".to_string()),
            version: std::env::var("APP_VERSION").unwrap_or_else(|_| "unknown".to_string()),
            deployed_at: std::env::var("DEPLOYED_AT").unwrap_or_else(|_| "unknown".to_string()),
        }
    }
}

/// One handler entry in the config document.
///
/// `steps` is declarative: names are validated against the step catalogue,
/// but the executable sequence stays bound to the handler variant.
#[derive(Debug, Clone)]
pub struct HandlerEntry {
    pub steps: Vec<String>,
    pub senders: Vec<String>,
}

/// The parsed handler config document.
#[derive(Debug, Clone)]
pub struct HandlerConfig {
    pub handlers: BTreeMap<String, HandlerEntry>,
}

impl HandlerConfig {
    /// Load and structurally validate the config document at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&raw)
    }

    /// Parse and validate a config document from a YAML string.
    ///
    /// Parsed into a generic YAML value first so structural errors can
    /// name the offending handler instead of surfacing as serde noise.
    pub fn from_yaml_str(raw: &str) -> Result<Self, ConfigError> {
        let doc: YamlValue = serde_yaml::from_str(raw)?;

        let handlers_section = doc
            .as_mapping()
            .and_then(|m| m.get("handlers"))
            .ok_or(ConfigError::MissingHandlersSection)?;
        let handlers_map = handlers_section
            .as_mapping()
            .ok_or(ConfigError::MissingHandlersSection)?;

        let mut handlers = BTreeMap::new();
        for (name, details) in handlers_map {
            let name = name.as_str().unwrap_or_default().to_string();

            let details = details.as_mapping().ok_or_else(|| {
                ConfigError::InvalidHandlerEntry {
                    handler: name.clone(),
                    reason: "must map to a mapping".into(),
                }
            })?;

            let steps = string_list(details.get("steps")).ok_or_else(|| {
                ConfigError::InvalidHandlerEntry {
                    handler: name.clone(),
                    reason: "must have a 'steps' list".into(),
                }
            })?;
            let senders = string_list(details.get("senders")).ok_or_else(|| {
                ConfigError::InvalidHandlerEntry {
                    handler: name.clone(),
                    reason: "must have a 'senders' list".into(),
                }
            })?;

            handlers.insert(name, HandlerEntry { steps, senders });
        }

        Ok(Self { handlers })
    }
}

fn string_list(value: Option<&YamlValue>) -> Option<Vec<String>> {
    value?
        .as_sequence()?
        .iter()
        .map(|v| v.as_str().map(str::to_string))
        .collect()
}

/// Build a handler registry from a validated config document.
///
/// Resolves every handler name against the catalogue and every configured
/// step name against the step catalogue before registering any sender, so
/// a bad document never yields a partial routing table.
pub async fn build_registry(config: &HandlerConfig) -> Result<HandlerRegistry, ConfigError> {
    for (name, entry) in &config.handlers {
        if HandlerKind::from_name(name).is_none() {
            return Err(ConfigError::UnknownHandler(name.clone()));
        }
        for step in &entry.steps {
            if step_by_name(step).is_none() {
                return Err(ConfigError::UnknownStep {
                    handler: name.clone(),
                    step: step.clone(),
                });
            }
        }
    }

    let registry = HandlerRegistry::new();
    for (name, entry) in &config.handlers {
        for sender in &entry.senders {
            registry
                .register_by_name(sender, name)
                .await
                .map_err(|_| ConfigError::UnknownHandler(name.clone()))?;
        }
    }

    info!(senders = registry.len().await, "Handler registry built");
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const VALID_YAML: &str = r#"
handlers:
  CampaignClassifierHandler:
    steps:
      - assign_campaign_type
    senders:
      - "newsletter@example.com"
      - "promo@example.com"
"#;

    #[test]
    fn parses_valid_config() {
        let config = HandlerConfig::from_yaml_str(VALID_YAML).unwrap();
        let entry = &config.handlers["CampaignClassifierHandler"];
        assert_eq!(entry.steps, vec!["assign_campaign_type"]);
        assert_eq!(
            entry.senders,
            vec!["newsletter@example.com", "promo@example.com"]
        );
    }

    #[test]
    fn load_reads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(VALID_YAML.as_bytes()).unwrap();

        let config = HandlerConfig::load(file.path()).unwrap();
        assert_eq!(config.handlers.len(), 1);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = HandlerConfig::load(Path::new("/no/such/config.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn missing_handlers_section_rejected() {
        let err = HandlerConfig::from_yaml_str("other: {}").unwrap_err();
        assert!(matches!(err, ConfigError::MissingHandlersSection));
    }

    #[test]
    fn handler_entry_must_be_mapping() {
        let err =
            HandlerConfig::from_yaml_str("handlers:\n  BaseHandler: just-a-string\n").unwrap_err();
        match err {
            ConfigError::InvalidHandlerEntry { handler, .. } => {
                assert_eq!(handler, "BaseHandler");
            }
            other => panic!("expected InvalidHandlerEntry, got {other:?}"),
        }
    }

    #[test]
    fn handler_entry_requires_steps_list() {
        let raw = "handlers:\n  BaseHandler:\n    senders: []\n";
        let err = HandlerConfig::from_yaml_str(raw).unwrap_err();
        match err {
            ConfigError::InvalidHandlerEntry { handler, reason } => {
                assert_eq!(handler, "BaseHandler");
                assert!(reason.contains("steps"));
            }
            other => panic!("expected InvalidHandlerEntry, got {other:?}"),
        }
    }

    #[test]
    fn handler_entry_requires_senders_list() {
        let raw = "handlers:\n  BaseHandler:\n    steps: []\n";
        let err = HandlerConfig::from_yaml_str(raw).unwrap_err();
        match err {
            ConfigError::InvalidHandlerEntry { handler, reason } => {
                assert_eq!(handler, "BaseHandler");
                assert!(reason.contains("senders"));
            }
            other => panic!("expected InvalidHandlerEntry, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn build_registry_registers_all_senders() {
        let config = HandlerConfig::from_yaml_str(VALID_YAML).unwrap();
        let registry = build_registry(&config).await.unwrap();

        assert_eq!(registry.len().await, 2);
        assert_eq!(
            registry.handler_for_sender("promo@example.com").await,
            HandlerKind::CampaignClassifier
        );
    }

    #[tokio::test]
    async fn build_registry_rejects_unknown_handler() {
        let raw = "handlers:\n  MysteryHandler:\n    steps: []\n    senders: [\"a@b.com\"]\n";
        let config = HandlerConfig::from_yaml_str(raw).unwrap();
        let err = build_registry(&config).await.unwrap_err();
        assert!(matches!(err, ConfigError::UnknownHandler(name) if name == "MysteryHandler"));
    }

    #[tokio::test]
    async fn build_registry_rejects_unknown_step() {
        let raw = "handlers:\n  BaseHandler:\n    steps: [\"no_such_step\"]\n    senders: []\n";
        let config = HandlerConfig::from_yaml_str(raw).unwrap();
        let err = build_registry(&config).await.unwrap_err();
        match err {
            ConfigError::UnknownStep { handler, step } => {
                assert_eq!(handler, "BaseHandler");
                assert_eq!(step, "no_such_step");
            }
            other => panic!("expected UnknownStep, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn build_registry_accepts_qualified_step_names() {
        let raw = "handlers:\n  CampaignClassifierHandler:\n    steps:\n      - mailhook.pipeline.steps.assign_campaign_type\n    senders: [\"promo@example.com\"]\n";
        let config = HandlerConfig::from_yaml_str(raw).unwrap();
        assert!(build_registry(&config).await.is_ok());
    }

    #[test]
    fn app_config_defaults() {
        // Only checks defaults that no test environment overrides.
        let config = AppConfig::from_env();
        assert!(!config.bind_addr.is_empty());
        assert!(!config.collection.is_empty());
    }
}
