//! Audit log endpoints (read-only)

use axum::{
    extract::{Query, State},
    Json,
};

use crate::{
    error::AppResult,
    models::{
        activity_log::{ActivityLogEntry, ActivityLogQuery},
        timeline_log::{TimelineLogEntry, TimelineLogQuery},
    },
};

use super::{ActivityLogPage, AuthenticatedUser, PaginatedResponse, TimelineLogPage};

/// List activity log entries, newest first
#[utoipa::path(
    get,
    path = "/activity-logs",
    tag = "logs",
    security(("bearer_auth" = [])),
    params(ActivityLogQuery),
    responses(
        (status = 200, description = "Activity log", body = ActivityLogPage),
        (status = 403, description = "Administrator privileges required")
    )
)]
pub async fn list_activity_logs(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<ActivityLogQuery>,
) -> AppResult<Json<PaginatedResponse<ActivityLogEntry>>> {
    claims.require_admin()?;

    let (entries, total, page) = state.services.logs.activity(&query).await?;
    Ok(Json(PaginatedResponse::new(entries, total, page)))
}

/// List timeline log entries, newest first
#[utoipa::path(
    get,
    path = "/timeline-logs",
    tag = "logs",
    security(("bearer_auth" = [])),
    params(TimelineLogQuery),
    responses(
        (status = 200, description = "Timeline log", body = TimelineLogPage),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_timeline_logs(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<TimelineLogQuery>,
) -> AppResult<Json<PaginatedResponse<TimelineLogEntry>>> {
    let (entries, total, page) = state.services.logs.timeline(&query).await?;
    Ok(Json(PaginatedResponse::new(entries, total, page)))
}
