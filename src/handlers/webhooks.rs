//! # Webhook Handlers
//!
//! This module receives GitHub webhook deliveries, normalizes them into
//! actions and hands them to the injected [`ActionStore`]. It also hosts the
//! diagnostic test-webhook endpoint.

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::{debug, error, info, warn};
use utoipa::ToSchema;

use crate::action::Action;
use crate::error::{ApiError, ErrorBody};
use crate::normalization::{Normalized, normalize};
use crate::repositories::ActionStore;
use crate::server::AppState;

/// Header GitHub uses to name the event type of a delivery.
pub const GITHUB_EVENT_HEADER: &str = "X-GitHub-Event";

/// Webhook acknowledgement body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct WebhookResponse {
    /// `success` when an action was stored, absent otherwise
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "success")]
    pub status: Option<String>,
    /// Human-readable outcome
    #[schema(example = "Webhook processed successfully")]
    pub message: String,
}

impl WebhookResponse {
    pub fn success<S: Into<String>>(message: S) -> Self {
        Self {
            status: Some("success".to_string()),
            message: message.into(),
        }
    }

    pub fn not_processed() -> Self {
        Self {
            status: None,
            message: "Event not processed".to_string(),
        }
    }
}

/// Result of running one delivery through normalization and storage.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    Stored(Action),
    NotProcessed,
    StoreFailed,
}

/// Normalize a delivery and persist it when it yields an action.
pub async fn ingest_event(
    store: &dyn ActionStore,
    event_type: &str,
    payload: &JsonValue,
) -> IngestOutcome {
    let action = match normalize(event_type, payload) {
        Normalized::Processed(action) => action,
        Normalized::NotApplicable => {
            debug!(event_type, "Webhook event not applicable");
            return IngestOutcome::NotProcessed;
        }
        Normalized::Failed(err) => {
            warn!(event_type, error = %err, "Could not normalize webhook payload");
            return IngestOutcome::NotProcessed;
        }
    };

    if store.insert(&action).await {
        info!(
            event_type,
            request_type = %action.request_type,
            event_id = %action.id,
            "Stored webhook action"
        );
        IngestOutcome::Stored(action)
    } else {
        IngestOutcome::StoreFailed
    }
}

/// Parse a delivery body, treating empty and falsy JSON values as absent.
fn parse_payload(body: &[u8]) -> Option<JsonValue> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return None;
    }

    let payload: JsonValue = serde_json::from_slice(body)
        .inspect_err(|err| warn!(error = %err, "Webhook body is not valid JSON"))
        .ok()?;

    let empty = match &payload {
        JsonValue::Null | JsonValue::Bool(false) => true,
        JsonValue::Object(map) => map.is_empty(),
        JsonValue::Array(items) => items.is_empty(),
        JsonValue::String(text) => text.is_empty(),
        JsonValue::Number(n) => n.as_f64() == Some(0.0),
        _ => false,
    };

    (!empty).then_some(payload)
}

/// Receive a GitHub webhook delivery
///
/// The `X-GitHub-Event` header selects how the payload is read. Push events,
/// newly opened pull requests and merged pull requests are stored; anything
/// else is acknowledged without being recorded.
#[utoipa::path(
    post,
    path = "/webhook",
    params(
        ("X-GitHub-Event" = String, Header, description = "GitHub event type, e.g. push or pull_request")
    ),
    request_body(content = serde_json::Value, description = "GitHub webhook payload", content_type = "application/json"),
    responses(
        (status = 200, description = "Delivery stored or acknowledged", body = WebhookResponse),
        (status = 400, description = "Empty or missing payload", body = ErrorBody),
        (status = 500, description = "Storage or internal failure", body = ErrorBody)
    ),
    tag = "webhooks"
)]
pub async fn receive_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>, ApiError> {
    let event_type = headers
        .get(GITHUB_EVENT_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    let payload = parse_payload(&body).ok_or(ApiError::NoPayload)?;

    match ingest_event(state.store.as_ref(), event_type, &payload).await {
        IngestOutcome::Stored(_) => Ok(Json(WebhookResponse::success(
            "Webhook processed successfully",
        ))),
        IngestOutcome::NotProcessed => Ok(Json(WebhookResponse::not_processed())),
        IngestOutcome::StoreFailed => {
            error!(event_type, "Failed to store webhook action");
            Err(ApiError::StoreFailed)
        }
    }
}

/// Webhook liveness check
#[utoipa::path(
    get,
    path = "/webhook",
    responses(
        (status = 200, description = "Endpoint is reachable", body = String, content_type = "text/plain")
    ),
    tag = "webhooks"
)]
pub async fn webhook_status() -> &'static str {
    "Webhook endpoint is working!"
}

/// Insert a synthetic push action
///
/// Diagnostic endpoint that stores a fixed push by `Test User` to `main`.
#[utoipa::path(
    post,
    path = "/test-webhook",
    responses(
        (status = 200, description = "Test action stored", body = WebhookResponse),
        (status = 500, description = "Test action could not be stored", body = ErrorBody)
    ),
    tag = "webhooks"
)]
pub async fn insert_test_action(
    State(state): State<AppState>,
) -> Result<Json<WebhookResponse>, ApiError> {
    let action = Action::synthetic_push();

    if state.store.insert(&action).await {
        info!(event_id = %action.id, "Stored synthetic test action");
        Ok(Json(WebhookResponse::success("Test data inserted")))
    } else {
        Err(ApiError::TestInsertFailed)
    }
}

/// Test webhook liveness check
#[utoipa::path(
    get,
    path = "/test-webhook",
    responses(
        (status = 200, description = "Endpoint is reachable", body = String, content_type = "text/plain")
    ),
    tag = "webhooks"
)]
pub async fn test_webhook_status() -> &'static str {
    "Test webhook endpoint is working!"
}
