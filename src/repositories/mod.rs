//! # Repository Layer
//!
//! This module contains repository implementations that encapsulate SeaORM
//! operations behind the store traits the handlers depend on.

pub mod action;

pub use action::{ActionRepository, ActionStore, DEFAULT_RECENT_LIMIT};
