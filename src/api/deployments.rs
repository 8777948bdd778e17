//! Deployment endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::deployment::{
        AssignmentHistory, CalendarEvent, CalendarQuery, CreateDeployment, DeploymentDetails,
        DeploymentQuery, DeploymentSummary, ReplacementRequest, UpdateDeployment,
    },
};

use super::{AuthenticatedUser, DeploymentPage, PaginatedResponse};

/// List deployments
#[utoipa::path(
    get,
    path = "/deployments",
    tag = "deployments",
    security(("bearer_auth" = [])),
    params(DeploymentQuery),
    responses(
        (status = 200, description = "List of deployments", body = DeploymentPage),
        (status = 400, description = "Invalid date filter"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_deployments(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<DeploymentQuery>,
) -> AppResult<Json<PaginatedResponse<DeploymentSummary>>> {
    let (rows, total, page) = state.services.deployments.list(&query).await?;
    Ok(Json(PaginatedResponse::new(rows, total, page)))
}

/// Get deployment details
#[utoipa::path(
    get,
    path = "/deployments/{id}",
    tag = "deployments",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Deployment ID")),
    responses(
        (status = 200, description = "Deployment details", body = DeploymentDetails),
        (status = 404, description = "Deployment not found")
    )
)]
pub async fn get_deployment(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<DeploymentDetails>> {
    let details = state.services.deployments.get_details(id).await?;
    Ok(Json(details))
}

/// Create a deployment
#[utoipa::path(
    post,
    path = "/deployments",
    tag = "deployments",
    security(("bearer_auth" = [])),
    request_body = CreateDeployment,
    responses(
        (status = 201, description = "Deployment created", body = DeploymentDetails),
        (status = 400, description = "Invalid input or truck/driver not available"),
        (status = 404, description = "Truck or driver not found")
    )
)]
pub async fn create_deployment(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(data): Json<CreateDeployment>,
) -> AppResult<(StatusCode, Json<DeploymentDetails>)> {
    claims.require_admin()?;

    let details = state.services.deployments.create(&claims, data).await?;
    Ok((StatusCode::CREATED, Json(details)))
}

/// Update status, milestones, cargo or assignment of a deployment
#[utoipa::path(
    patch,
    path = "/deployments/{id}",
    tag = "deployments",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Deployment ID")),
    request_body = UpdateDeployment,
    responses(
        (status = 200, description = "Deployment updated", body = DeploymentDetails),
        (status = 400, description = "Invalid transition, milestone order or replacement"),
        (status = 404, description = "Deployment not found")
    )
)]
pub async fn update_deployment(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(data): Json<UpdateDeployment>,
) -> AppResult<Json<DeploymentDetails>> {
    claims.require_admin()?;

    let details = state.services.deployments.update(&claims, id, data).await?;
    Ok(Json(details))
}

/// Replace the truck and/or driver of a running deployment
#[utoipa::path(
    post,
    path = "/deployments/{id}/replacement",
    tag = "deployments",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Deployment ID")),
    request_body = ReplacementRequest,
    responses(
        (status = 200, description = "Replacement applied", body = DeploymentDetails),
        (status = 400, description = "Candidate not available or identical to current"),
        (status = 404, description = "Deployment, truck or driver not found")
    )
)]
pub async fn replace_assignment(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<ReplacementRequest>,
) -> AppResult<Json<DeploymentDetails>> {
    claims.require_admin()?;

    let details = state.services.deployments.replace(&claims, id, request).await?;
    Ok(Json(details))
}

/// Original versus replacement assignment and timeline log
#[utoipa::path(
    get,
    path = "/deployments/{id}/history",
    tag = "deployments",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Deployment ID")),
    responses(
        (status = 200, description = "Assignment history", body = AssignmentHistory),
        (status = 404, description = "Deployment not found")
    )
)]
pub async fn get_history(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<AssignmentHistory>> {
    let history = state.services.deployments.history(id).await?;
    Ok(Json(history))
}

/// Deployments as calendar events
#[utoipa::path(
    get,
    path = "/deployments/calendar",
    tag = "deployments",
    security(("bearer_auth" = [])),
    params(CalendarQuery),
    responses(
        (status = 200, description = "Calendar events", body = Vec<CalendarEvent>),
        (status = 400, description = "Invalid date range")
    )
)]
pub async fn calendar(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<CalendarQuery>,
) -> AppResult<Json<Vec<CalendarEvent>>> {
    let events = state.services.deployments.calendar(&query).await?;
    Ok(Json(events))
}
