//! # Activity Feed Library
//!
//! This library provides the core functionality for the activity feed service:
//! GitHub webhook normalization, action storage, feed formatting and the HTTP
//! server that ties them together.

pub mod action;
pub mod config;
pub mod db;
pub mod error;
pub mod formatting;
pub mod handlers;
pub mod models;
pub mod normalization;
pub mod repositories;
pub mod server;
pub mod telemetry;
pub use migration;
