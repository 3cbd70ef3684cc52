//! # Action Domain Types
//!
//! An [`Action`] is the canonical record of one repository event. Actions are
//! produced by the normalizer, persisted once by an
//! [`ActionStore`](crate::repositories::ActionStore) and never mutated.

use std::fmt;

use chrono::{DateTime, FixedOffset, Offset, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Seconds east of UTC for Asia/Kolkata. India observes no DST.
const DISPLAY_OFFSET_SECONDS: i32 = 5 * 3600 + 30 * 60;

/// Fixed offset every action timestamp is stored and displayed in.
pub fn display_offset() -> FixedOffset {
    FixedOffset::east_opt(DISPLAY_OFFSET_SECONDS).unwrap_or_else(|| Utc.fix())
}

/// Current time in the display timezone, truncated to microseconds so it
/// survives a round trip through the database unchanged.
pub fn now_in_display_tz() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&display_offset()).trunc_subsecs(6)
}

/// Kind of repository event an action records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RequestType {
    Push,
    PullRequest,
    Merge,
    /// A value this service does not produce, preserved as read.
    Other(String),
}

impl RequestType {
    pub fn as_str(&self) -> &str {
        match self {
            RequestType::Push => "push",
            RequestType::PullRequest => "pull_request",
            RequestType::Merge => "merge",
            RequestType::Other(value) => value,
        }
    }
}

impl From<&str> for RequestType {
    fn from(value: &str) -> Self {
        match value {
            "push" => RequestType::Push,
            "pull_request" => RequestType::PullRequest,
            "merge" => RequestType::Merge,
            other => RequestType::Other(other.to_string()),
        }
    }
}

impl From<String> for RequestType {
    fn from(value: String) -> Self {
        RequestType::from(value.as_str())
    }
}

impl From<RequestType> for String {
    fn from(value: RequestType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Files touched by the commit a push action records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChanges {
    #[serde(default)]
    pub added: Vec<String>,
    #[serde(default)]
    pub modified: Vec<String>,
    #[serde(default)]
    pub removed: Vec<String>,
    /// Combined length of the three lists
    #[serde(default)]
    pub total_changes: usize,
}

impl FileChanges {
    pub fn new(added: Vec<String>, modified: Vec<String>, removed: Vec<String>) -> Self {
        let total_changes = added.len() + modified.len() + removed.len();
        Self {
            added,
            modified,
            removed,
            total_changes,
        }
    }
}

/// Canonical record of a repository event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// External event identifier (commit SHA or pull request id)
    pub id: String,
    /// Commit message or pull request title
    pub message: String,
    /// Receipt time in Asia/Kolkata
    #[serde(deserialize_with = "crate::formatting::deserialize_timestamp")]
    pub timestamp: DateTime<FixedOffset>,
    pub author: String,
    pub to_branch: String,
    pub from_branch: Option<String>,
    pub request_type: RequestType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_changes: Option<FileChanges>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files_changed: Option<usize>,
}

impl Action {
    /// Fixed synthetic push used by the diagnostic test-webhook endpoint.
    pub fn synthetic_push() -> Self {
        Self {
            id: "test_123".to_string(),
            message: "Test commit message".to_string(),
            timestamp: now_in_display_tz(),
            author: "Test User".to_string(),
            to_branch: "main".to_string(),
            from_branch: None,
            request_type: RequestType::Push,
            file_changes: None,
            commit_url: None,
            files_changed: None,
        }
    }
}

/// An action together with the identifier the store assigned to it.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredAction {
    pub store_id: Uuid,
    pub action: Action,
}
