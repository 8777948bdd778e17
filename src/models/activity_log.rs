//! Append-only activity log

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

/// Activity log entry joined with the performer's name
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ActivityLogEntry {
    pub id: i64,
    pub performed_by: Option<i32>,
    pub performed_by_name: Option<String>,
    pub action: String,
    /// Status of the affected entity after the action
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

/// New activity log record
#[derive(Debug, Clone)]
pub struct NewActivityLog {
    pub performed_by: i32,
    pub action: String,
    pub status: String,
}

impl NewActivityLog {
    pub fn new(performed_by: i32, action: impl Into<String>, status: impl ToString) -> Self {
        Self {
            performed_by,
            action: action.into(),
            status: status.to_string(),
        }
    }
}

/// Activity log query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ActivityLogQuery {
    pub performed_by: Option<i32>,
    /// Search in action text
    pub search: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}
