use std::sync::Arc;

use mailhook::config::{AppConfig, HandlerConfig, build_registry};
use mailhook::routes::{AppState, app_routes};
use mailhook::store::{EmailStore, HttpStore, MemoryStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AppConfig::from_env();
    tracing::info!(version = %config.version, "mailhook starting");

    // Handler routing table. A bad config document refuses to start the
    // process rather than run with a partial table.
    let handler_config = HandlerConfig::load(&config.handler_config_path).map_err(|e| {
        tracing::error!(
            path = %config.handler_config_path.display(),
            error = %e,
            "Failed to load handler configuration"
        );
        e
    })?;
    let registry = Arc::new(build_registry(&handler_config).await?);

    let store: Arc<dyn EmailStore> = match &config.store_url {
        Some(url) => {
            tracing::info!(%url, "Using HTTP document store");
            Arc::new(HttpStore::new(url))
        }
        None => {
            tracing::warn!("MAILHOOK_STORE_URL not set, records kept in memory only");
            Arc::new(MemoryStore::new())
        }
    };

    let state = AppState {
        registry,
        store,
        default_collection: config.collection.clone(),
        version: config.version.clone(),
        deployed_at: config.deployed_at.clone(),
    };

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(
        addr = %config.bind_addr,
        collection = %config.collection,
        "Listening for inbound email webhooks"
    );
    axum::serve(listener, app_routes(state)).await?;

    Ok(())
}
