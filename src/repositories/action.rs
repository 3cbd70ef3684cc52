//! # Action Repository
//!
//! This module defines the [`ActionStore`] seam handlers depend on and its
//! SeaORM implementation, [`ActionRepository`].

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder, QuerySelect, Set};
use tracing::{error, warn};
use uuid::Uuid;

use crate::action::{Action, FileChanges, RequestType, StoredAction, display_offset};
use crate::error::RepositoryError;
use crate::models::action::{self, Entity as ActionEntity};

/// Number of actions the feed returns when no limit is configured.
pub const DEFAULT_RECENT_LIMIT: u64 = 50;

/// Persistence for action records.
///
/// Implementations report failure through return values and never panic, so
/// callers can tell a storage problem apart from an event that was ignored.
#[async_trait]
pub trait ActionStore: Send + Sync {
    /// Persist one action under a fresh store identifier. Returns `false` on failure.
    async fn insert(&self, action: &Action) -> bool;

    /// The `limit` most recent actions, newest first. Empty on failure.
    async fn list_recent(&self, limit: u64) -> Vec<StoredAction>;
}

/// Repository for action database operations
#[derive(Debug, Clone)]
pub struct ActionRepository {
    /// Database connection pool
    pub db: Arc<DatabaseConnection>,
}

impl ActionRepository {
    /// Creates a new ActionRepository instance
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Inserts an action and returns the identifier assigned to it
    pub async fn create(&self, action: &Action) -> Result<Uuid, RepositoryError> {
        let store_id = Uuid::new_v4();
        let model = to_active_model(store_id, action)?;

        ActionEntity::insert(model)
            .exec_without_returning(&*self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(store_id)
    }

    /// Lists up to `limit` actions ordered by timestamp DESC
    ///
    /// Rows that cannot be decoded are skipped with a warning rather than
    /// failing the whole page.
    pub async fn find_recent(&self, limit: u64) -> Result<Vec<StoredAction>, RepositoryError> {
        let rows = ActionEntity::find()
            .order_by_desc(action::Column::Timestamp)
            .limit(limit)
            .all(&*self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let store_id = row.id;
                StoredAction::try_from(row)
                    .inspect_err(|err| warn!(%store_id, error = %err, "Skipping unreadable action"))
                    .ok()
            })
            .collect())
    }
}

#[async_trait]
impl ActionStore for ActionRepository {
    async fn insert(&self, action: &Action) -> bool {
        match self.create(action).await {
            Ok(_) => true,
            Err(err) => {
                error!(error = %err, event_id = %action.id, "Failed to insert action");
                false
            }
        }
    }

    async fn list_recent(&self, limit: u64) -> Vec<StoredAction> {
        self.find_recent(limit).await.unwrap_or_else(|err| {
            error!(error = %err, "Failed to fetch recent actions");
            Vec::new()
        })
    }
}

fn to_active_model(store_id: Uuid, action: &Action) -> Result<action::ActiveModel, RepositoryError> {
    let file_changes = action
        .file_changes
        .as_ref()
        .map(serde_json::to_value)
        .transpose()
        .map_err(|err| RepositoryError::validation(format!("file_changes: {err}")))?;

    let files_changed = action
        .files_changed
        .map(i32::try_from)
        .transpose()
        .map_err(|err| RepositoryError::validation(format!("files_changed: {err}")))?;

    Ok(action::ActiveModel {
        id: Set(store_id),
        event_id: Set(action.id.clone()),
        message: Set(action.message.clone()),
        timestamp: Set(action.timestamp),
        author: Set(action.author.clone()),
        to_branch: Set(action.to_branch.clone()),
        from_branch: Set(action.from_branch.clone()),
        request_type: Set(action.request_type.as_str().to_string()),
        file_changes: Set(file_changes),
        commit_url: Set(action.commit_url.clone()),
        files_changed: Set(files_changed),
        created_at: Set(Utc::now().fixed_offset()),
    })
}

impl TryFrom<action::Model> for StoredAction {
    type Error = RepositoryError;

    fn try_from(row: action::Model) -> Result<Self, Self::Error> {
        let file_changes = row
            .file_changes
            .map(serde_json::from_value::<FileChanges>)
            .transpose()
            .map_err(|err| RepositoryError::validation(format!("file_changes: {err}")))?;

        let files_changed = row
            .files_changed
            .map(usize::try_from)
            .transpose()
            .map_err(|err| RepositoryError::validation(format!("files_changed: {err}")))?;

        Ok(StoredAction {
            store_id: row.id,
            action: Action {
                id: row.event_id,
                message: row.message,
                timestamp: row.timestamp.with_timezone(&display_offset()),
                author: row.author,
                to_branch: row.to_branch,
                from_branch: row.from_branch,
                request_type: RequestType::from(row.request_type),
                file_changes,
                commit_url: row.commit_url,
                files_changed,
            },
        })
    }
}
