//! HTTP surface: webhook intake and health check.
//!
//! `POST /generic/new` (alias `POST /email`) takes the raw webhook JSON,
//! validates it into an `Email`, routes it through the registered handler
//! for the sender, and echoes the processed record. Validation failures
//! are 400 with a structured field-error list; anything unexpected is a
//! 500 with an opaque body and full details logged server-side.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use tracing::{error, info};

use crate::email::Email;
use crate::error::ValidationError;
use crate::registry::HandlerRegistry;
use crate::store::EmailStore;

/// Request header overriding the storage collection for one request.
pub const COLLECTION_OVERRIDE_HEADER: &str = "X-Firestore-Collection";

/// Application state shared across request handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<HandlerRegistry>,
    pub store: Arc<dyn EmailStore>,
    /// Collection written to when no override header is present.
    pub default_collection: String,
    /// Deployment metadata for the health endpoint.
    pub version: String,
    pub deployed_at: String,
}

/// Build the Axum router for the webhook service.
pub fn app_routes(state: AppState) -> Router {
    Router::new()
        .route("/generic/new", post(new_email))
        .route("/email", post(new_email))
        .route("/health/", get(health))
        .route("/health", get(health))
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

/// Per-request access log.
async fn log_request(request: Request, next: Next) -> Response {
    info!(method = %request.method(), path = %request.uri().path(), "Received request");
    next.run(request).await
}

// ── Error mapping ───────────────────────────────────────────────────

/// Request-path error with its HTTP rendering.
enum ApiError {
    Validation(ValidationError),
    Internal(anyhow::Error),
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Validation(err) => {
                info!(error = %err, "Rejected invalid payload");
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"error": err.errors})),
                )
                    .into_response()
            }
            Self::Internal(err) => {
                // Full details stay server-side; the body is opaque.
                error!(error = %err, "Unhandled error in request path");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"error": "Internal Server Error"})),
                )
                    .into_response()
            }
        }
    }
}

// ── Webhook intake ──────────────────────────────────────────────────

async fn new_email(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let email = Email::from_payload(&payload)?;

    let collection = headers
        .get(COLLECTION_OVERRIDE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or(&state.default_collection)
        .to_string();

    let kind = state.registry.handler_for_sender(&email.sender).await;
    let handler = kind.build();
    let processed = handler
        .handle(email, state.store.as_ref(), &collection)
        .await;

    let mut body = processed.to_record();
    let record = body
        .as_object_mut()
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("record serialized to non-object")))?;
    record.insert("status".into(), json!("processed"));
    record.insert("handler".into(), json!(kind.name()));

    Ok(Json(body))
}

// ── Health ──────────────────────────────────────────────────────────

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "version": state.version,
        "deployed_at": state.deployed_at,
    }))
}
