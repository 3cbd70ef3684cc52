//! Migration to create the actions table.
//!
//! Each row is one normalized repository event. Rows are append-only and the
//! feed reads them newest first, so the only secondary index is on timestamp.

use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Statement;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Actions::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Actions::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Actions::EventId).text().not_null())
                    .col(ColumnDef::new(Actions::Message).text().not_null())
                    .col(
                        ColumnDef::new(Actions::Timestamp)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Actions::Author).text().not_null())
                    .col(ColumnDef::new(Actions::ToBranch).text().not_null())
                    .col(ColumnDef::new(Actions::FromBranch).text().null())
                    .col(ColumnDef::new(Actions::RequestType).text().not_null())
                    .col(ColumnDef::new(Actions::FileChanges).json().null())
                    .col(ColumnDef::new(Actions::CommitUrl).text().null())
                    .col(ColumnDef::new(Actions::FilesChanged).integer().null())
                    .col(
                        ColumnDef::new(Actions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Feed reads are ordered by timestamp DESC
        manager
            .get_connection()
            .execute(Statement::from_string(
                manager.get_database_backend(),
                "CREATE INDEX IF NOT EXISTS idx_actions_timestamp ON actions (timestamp DESC)"
                    .to_string(),
            ))
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_actions_timestamp").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Actions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Actions {
    Table,
    Id,
    EventId,
    Message,
    Timestamp,
    Author,
    ToBranch,
    FromBranch,
    RequestType,
    FileChanges,
    CommitUrl,
    FilesChanged,
    CreatedAt,
}
