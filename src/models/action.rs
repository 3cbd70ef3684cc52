//! Action entity model
//!
//! This module contains the SeaORM entity model for the actions table,
//! which stores one row per normalized repository event.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Action entity representing a normalized repository event
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "actions")]
pub struct Model {
    /// Store-assigned identifier (primary key), distinct from `event_id`
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// External event identifier (commit SHA or pull request id)
    pub event_id: String,

    /// Commit message or pull request title
    pub message: String,

    /// Receipt time in Asia/Kolkata
    pub timestamp: DateTimeWithTimeZone,

    pub author: String,

    pub to_branch: String,

    /// Head branch for pull request and merge events
    pub from_branch: Option<String>,

    /// push | pull_request | merge
    pub request_type: String,

    /// Serialized file change lists for push events
    #[sea_orm(column_type = "Json", nullable)]
    pub file_changes: Option<JsonValue>,

    pub commit_url: Option<String>,

    pub files_changed: Option<i32>,

    /// Timestamp when the row was written
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
