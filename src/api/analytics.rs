//! Dashboard analytics endpoint

use axum::{
    extract::{Query, State},
    Json,
};

use crate::{
    error::AppResult,
    models::analytics::{AnalyticsQuery, AnalyticsResponse},
};

use super::AuthenticatedUser;

/// Aggregated dashboard metrics
#[utoipa::path(
    get,
    path = "/analytics",
    tag = "analytics",
    security(("bearer_auth" = [])),
    params(AnalyticsQuery),
    responses(
        (status = 200, description = "Dashboard metrics", body = AnalyticsResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn get_analytics(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<AnalyticsQuery>,
) -> AppResult<Json<AnalyticsResponse>> {
    let analytics = state.services.analytics.get(&query).await?;
    Ok(Json(analytics))
}
