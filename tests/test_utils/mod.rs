//! Test utilities for database testing.
//!
//! This module provides utilities for setting up in-memory SQLite databases
//! with migrations for testing purposes.

use std::sync::Arc;

use activity_feed::action::{Action, RequestType, display_offset};
use activity_feed::repositories::ActionRepository;
use anyhow::Result;
use chrono::{DateTime, FixedOffset, TimeZone};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};

/// Sets up an in-memory SQLite database with all migrations applied.
///
/// The pool is pinned to one connection because every new SQLite memory
/// connection opens its own empty database.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let mut opt = ConnectOptions::new("sqlite::memory:".to_string());
    opt.max_connections(1).min_connections(1);

    let db = Database::connect(opt).await?;
    Migrator::up(&db, None).await?;

    Ok(db)
}

/// Builds a repository over a fresh migrated database.
#[allow(dead_code)]
pub async fn setup_repository() -> Result<ActionRepository> {
    let db = setup_test_db().await?;
    Ok(ActionRepository::new(Arc::new(db)))
}

/// A display-zone timestamp on 5 March 2025.
#[allow(dead_code)]
pub fn at(hour: u32, minute: u32) -> DateTime<FixedOffset> {
    display_offset()
        .with_ymd_and_hms(2025, 3, 5, hour, minute, 0)
        .single()
        .expect("valid fixed-offset time")
}

/// A pull request action with the given id and timestamp.
#[allow(dead_code)]
pub fn pull_request_action(id: &str, timestamp: DateTime<FixedOffset>) -> Action {
    Action {
        id: id.to_string(),
        message: format!("PR {id}"),
        timestamp,
        author: "bob".to_string(),
        to_branch: "main".to_string(),
        from_branch: Some("feature".to_string()),
        request_type: RequestType::PullRequest,
        file_changes: None,
        commit_url: None,
        files_changed: None,
    }
}
