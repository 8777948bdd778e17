//! Dashboard analytics shapes

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Pre-aggregated dashboard metrics
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AnalyticsResponse {
    pub deployments: DeploymentStats,
    pub trucks: AssetStats,
    pub drivers: AssetStats,
    /// Accounts waiting for approval
    pub pending_users: i64,
    /// Deployments created per month, oldest first
    pub monthly: Vec<MonthlyEntry>,
    pub top_drivers: Vec<DriverTripEntry>,
}

#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct DeploymentStats {
    pub total: i64,
    pub preparing: i64,
    pub ongoing: i64,
    pub completed: i64,
    pub canceled: i64,
    /// Runs that had a truck or driver replaced
    pub replaced: i64,
    /// Mean minutes between destination arrival and departure
    pub average_unloading_minutes: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct AssetStats {
    pub total: i64,
    pub available: i64,
    pub deployed: i64,
    pub unavailable: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MonthlyEntry {
    /// Month label (YYYY-MM)
    pub month: String,
    pub total: i64,
    pub completed: i64,
    pub canceled: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DriverTripEntry {
    pub driver_id: i32,
    pub name: String,
    pub trip_count: i32,
}

/// Analytics query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct AnalyticsQuery {
    /// Number of months in the monthly series (default: 12, max: 36)
    pub months: Option<i32>,
    /// Number of drivers in the leaderboard (default: 5, max: 50)
    pub top: Option<i64>,
}
