//! Library catalog server
//!
//! A REST JSON API for managing the books of a library catalog: adding,
//! listing, filtering, searching, updating and deleting books backed by a
//! relational store.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
