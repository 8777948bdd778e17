//! Append-only deployment timeline log

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use super::enums::DeploymentStatus;

/// Timeline log entry joined with performer and deployment details
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct TimelineLogEntry {
    pub id: i64,
    pub performed_by: Option<i32>,
    pub performed_by_name: Option<String>,
    pub target_deployment: i32,
    pub deployment_code: String,
    pub action: String,
    /// Deployment status right after the action
    pub status: DeploymentStatus,
    pub timestamp: DateTime<Utc>,
}

/// New timeline log record
#[derive(Debug, Clone)]
pub struct NewTimelineLog {
    pub performed_by: i32,
    pub target_deployment: i32,
    pub action: String,
    pub status: DeploymentStatus,
}

/// Timeline log query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct TimelineLogQuery {
    pub deployment_id: Option<i32>,
    pub performed_by: Option<i32>,
    /// From date (YYYY-MM-DD, inclusive)
    pub start_date: Option<String>,
    /// To date (YYYY-MM-DD, inclusive)
    pub end_date: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}
