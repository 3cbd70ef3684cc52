//! # Data Models
//!
//! This module contains the database entities and shared response models.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod action;

pub use action::Entity as ActionEntity;

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "activity-feed".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
