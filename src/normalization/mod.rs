//! Normalization of raw GitHub webhook payloads into [`Action`] records.
//!
//! Payloads are read as an untyped [`Value`] tree. Every field path goes
//! through an accessor that substitutes a documented default when the field
//! is absent, so only a structurally wrong payload (an object where an array
//! belongs, for instance) can fail.

use std::borrow::Cow;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::action::{Action, FileChanges, RequestType, now_in_display_tz};

const UNKNOWN_AUTHOR: &str = "Unknown";
const UNKNOWN_BRANCH: &str = "unknown";

/// GitHub event types accepted through the `X-GitHub-Event` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitHubEvent {
    Push,
    PullRequest,
}

impl GitHubEvent {
    pub const fn as_str(self) -> &'static str {
        match self {
            GitHubEvent::Push => "push",
            GitHubEvent::PullRequest => "pull_request",
        }
    }

    /// Return the event for a header value, if this service handles it.
    pub fn parse(event_type: &str) -> Option<Self> {
        match event_type {
            "push" => Some(GitHubEvent::Push),
            "pull_request" => Some(GitHubEvent::PullRequest),
            _ => None,
        }
    }
}

/// Errors raised when a payload does not have the shape GitHub sends.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NormalizationError {
    #[error("payload is not a JSON object")]
    NotAnObject,
    #[error("payload field {field} has an unexpected type")]
    UnexpectedShape { field: &'static str },
}

/// Outcome of normalizing one webhook delivery.
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    /// The event was recognized and produced an action.
    Processed(Action),
    /// The event is valid but not one the feed records.
    NotApplicable,
    /// The payload could not be read.
    Failed(NormalizationError),
}

impl Normalized {
    /// Collapse the outcome into `Some(action)` or `None`.
    pub fn into_action(self) -> Option<Action> {
        match self {
            Normalized::Processed(action) => Some(action),
            Normalized::NotApplicable | Normalized::Failed(_) => None,
        }
    }
}

impl From<Result<Option<Action>, NormalizationError>> for Normalized {
    fn from(result: Result<Option<Action>, NormalizationError>) -> Self {
        match result {
            Ok(Some(action)) => Normalized::Processed(action),
            Ok(None) => Normalized::NotApplicable,
            Err(err) => Normalized::Failed(err),
        }
    }
}

/// Normalize a webhook delivery identified by its `X-GitHub-Event` value.
pub fn normalize(event_type: &str, payload: &Value) -> Normalized {
    let Some(event) = GitHubEvent::parse(event_type) else {
        return Normalized::NotApplicable;
    };

    let Some(payload) = payload.as_object() else {
        return Normalized::Failed(NormalizationError::NotAnObject);
    };

    let result = match event {
        GitHubEvent::Push => normalize_push(payload),
        GitHubEvent::PullRequest => {
            if is_merged_close(payload) {
                normalize_merge(payload)
            } else {
                normalize_pull_request(payload)
            }
        }
    };

    result.into()
}

/// Normalize a push, recording only the most recent commit.
fn normalize_push(payload: &Map<String, Value>) -> Result<Option<Action>, NormalizationError> {
    let commits = match payload.get("commits") {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Array(commits)) => commits,
        Some(_) => return Err(NormalizationError::UnexpectedShape { field: "commits" }),
    };

    let Some(latest) = commits.last() else {
        return Ok(None);
    };
    let commit = latest
        .as_object()
        .ok_or(NormalizationError::UnexpectedShape { field: "commits[]" })?;

    let author = nested_str(commit, &["author", "name"]).unwrap_or(UNKNOWN_AUTHOR);
    let to_branch = branch_from_ref(str_field(payload, "ref").unwrap_or_default());

    let file_changes = FileChanges::new(
        string_list(commit, "added")?,
        string_list(commit, "modified")?,
        string_list(commit, "removed")?,
    );
    let files_changed = file_changes.total_changes;

    Ok(Some(Action {
        id: id_string(commit.get("id")),
        message: str_field(commit, "message").unwrap_or_default().to_string(),
        timestamp: now_in_display_tz(),
        author: author.to_string(),
        to_branch,
        from_branch: None,
        request_type: RequestType::Push,
        file_changes: Some(file_changes),
        commit_url: Some(str_field(commit, "url").unwrap_or_default().to_string()),
        files_changed: Some(files_changed),
    }))
}

/// Normalize a newly opened pull request. Other actions are not recorded.
fn normalize_pull_request(
    payload: &Map<String, Value>,
) -> Result<Option<Action>, NormalizationError> {
    if str_field(payload, "action").unwrap_or_default() != "opened" {
        return Ok(None);
    }

    let pr = pull_request(payload)?;
    let author = nested_str(&pr, &["user", "login"]).unwrap_or(UNKNOWN_AUTHOR);
    Ok(Some(pull_request_action(&pr, author, RequestType::PullRequest)))
}

/// Normalize a pull request that was closed by merging.
fn normalize_merge(payload: &Map<String, Value>) -> Result<Option<Action>, NormalizationError> {
    let pr = pull_request(payload)?;

    if !pr.get("merged").and_then(Value::as_bool).unwrap_or(false) {
        return Ok(None);
    }

    let author = nested_str(&pr, &["merged_by", "login"]).unwrap_or(UNKNOWN_AUTHOR);
    Ok(Some(pull_request_action(&pr, author, RequestType::Merge)))
}

fn is_merged_close(payload: &Map<String, Value>) -> bool {
    str_field(payload, "action") == Some("closed")
        && payload
            .get("pull_request")
            .and_then(|pr| pr.get("merged"))
            .and_then(Value::as_bool)
            .unwrap_or(false)
}

fn pull_request_action(pr: &Map<String, Value>, author: &str, request_type: RequestType) -> Action {
    let from_branch = nested_str(pr, &["head", "ref"]).unwrap_or(UNKNOWN_BRANCH);
    let to_branch = nested_str(pr, &["base", "ref"]).unwrap_or(UNKNOWN_BRANCH);

    Action {
        id: id_string(pr.get("id")),
        message: str_field(pr, "title").unwrap_or_default().to_string(),
        timestamp: now_in_display_tz(),
        author: author.to_string(),
        to_branch: to_branch.to_string(),
        from_branch: Some(from_branch.to_string()),
        request_type,
        file_changes: None,
        commit_url: None,
        files_changed: None,
    }
}

/// Borrow `pull_request`, treating an absent object as empty.
fn pull_request(
    payload: &Map<String, Value>,
) -> Result<Cow<'_, Map<String, Value>>, NormalizationError> {
    match payload.get("pull_request") {
        None | Some(Value::Null) => Ok(Cow::Owned(Map::new())),
        Some(Value::Object(pr)) => Ok(Cow::Borrowed(pr)),
        Some(_) => Err(NormalizationError::UnexpectedShape {
            field: "pull_request",
        }),
    }
}

/// Branch name after the last `/` of a git ref, `unknown` when there is none.
pub fn branch_from_ref(git_ref: &str) -> String {
    match git_ref.rsplit_once('/') {
        Some((_, branch)) => branch.to_string(),
        None => UNKNOWN_BRANCH.to_string(),
    }
}

fn str_field<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    object.get(key).and_then(Value::as_str)
}

fn nested_str<'a>(object: &'a Map<String, Value>, path: &[&str]) -> Option<&'a str> {
    let (first, rest) = path.split_first()?;
    rest.iter()
        .try_fold(object.get(*first)?, |value, key| value.get(key))?
        .as_str()
}

/// Identifiers arrive as strings (commit SHA) or numbers (pull request id).
fn id_string(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(id)) => id.clone(),
        Some(Value::Number(id)) => id.to_string(),
        _ => String::new(),
    }
}

fn string_list(
    object: &Map<String, Value>,
    key: &'static str,
) -> Result<Vec<String>, NormalizationError> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect()),
        Some(_) => Err(NormalizationError::UnexpectedShape { field: key }),
    }
}
