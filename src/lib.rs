//! Freightdesk freight back-office server
//!
//! REST JSON API for truck deployments, the truck fleet, drivers and
//! back-office accounts. The deployment lifecycle rules live in
//! [`lifecycle`] and are enforced on every write path.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod lifecycle;
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
