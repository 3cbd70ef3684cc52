//! Activity feed handlers
//!
//! Reads the most recent actions from the store and renders each one with
//! the feed formatter.

use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::action::{Action, StoredAction, display_offset};
use crate::error::ErrorBody;
use crate::formatting::format_action_message;
use crate::server::AppState;

/// One rendered entry of the activity feed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct ActionFeedItem {
    /// Store-assigned identifier
    #[schema(example = "7f1c0e55-3c1e-4a4e-9d83-1d1f1e0b7a61")]
    pub id: String,
    /// Formatted, multi-line feed message
    #[schema(example = "\"alice\" pushed to \"main\"\n05 March 2025 - 02:07 PM UTC")]
    pub message: String,
    /// RFC 3339 timestamp in Asia/Kolkata
    #[schema(example = "2025-03-05T14:07:00+05:30")]
    pub timestamp: String,
    /// push | pull_request | merge
    #[serde(rename = "type")]
    #[schema(example = "push")]
    pub kind: String,
}

impl From<&StoredAction> for ActionFeedItem {
    fn from(stored: &StoredAction) -> Self {
        // Rows read back from Postgres carry +00:00; render in the display zone.
        let action = Action {
            timestamp: stored.action.timestamp.with_timezone(&display_offset()),
            ..stored.action.clone()
        };
        Self {
            id: stored.store_id.to_string(),
            message: format_action_message(&action),
            timestamp: action.timestamp.to_rfc3339(),
            kind: action.request_type.to_string(),
        }
    }
}

/// List recent actions
///
/// Returns the most recent actions, newest first, capped at the configured
/// feed limit.
#[utoipa::path(
    get,
    path = "/api/actions",
    responses(
        (status = 200, description = "Recent actions", body = [ActionFeedItem]),
        (status = 500, description = "Feed could not be built", body = ErrorBody)
    ),
    tag = "actions"
)]
pub async fn list_actions(State(state): State<AppState>) -> Json<Vec<ActionFeedItem>> {
    let actions = state.store.list_recent(state.config.feed_limit).await;
    tracing::debug!(count = actions.len(), "Serving activity feed");

    Json(actions.iter().map(ActionFeedItem::from).collect())
}
