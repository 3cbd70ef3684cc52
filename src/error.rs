//! # Error Handling
//!
//! This module provides the error types shared across the service. Every
//! HTTP-facing failure is an [`ApiError`], which renders as a
//! `{"error": "..."}` body with a fixed message so backend details stay in
//! the logs.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// Error body returned by every failing endpoint
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Human-readable error message
    #[schema(example = "Failed to store data")]
    pub error: String,
}

/// Failures surfaced to HTTP clients
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ApiError {
    #[error("No payload received")]
    NoPayload,
    #[error("Failed to store data")]
    StoreFailed,
    #[error("Failed to insert test data")]
    TestInsertFailed,
    #[error("Failed to fetch actions")]
    FetchFailed,
    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    /// Get the appropriate HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NoPayload => StatusCode::BAD_REQUEST,
            ApiError::StoreFailed
            | ApiError::TestInsertFailed
            | ApiError::FetchFailed
            | ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            error: self.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.body())).into_response()
    }
}

/// Errors returned by repository operations
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),
    #[error("stored record is invalid: {0}")]
    Validation(String),
}

impl RepositoryError {
    pub fn database_error(error: sea_orm::DbErr) -> Self {
        RepositoryError::Database(error)
    }

    pub fn validation<S: Into<String>>(message: S) -> Self {
        RepositoryError::Validation(message.into())
    }
}
