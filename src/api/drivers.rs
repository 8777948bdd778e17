//! Driver roster endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::driver::{CreateDriver, Driver, DriverQuery, UpdateDriver},
};

use super::{AuthenticatedUser, DriverPage, PaginatedResponse};

/// List drivers
#[utoipa::path(
    get,
    path = "/drivers",
    tag = "drivers",
    security(("bearer_auth" = [])),
    params(DriverQuery),
    responses(
        (status = 200, description = "List of drivers", body = DriverPage),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_drivers(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<DriverQuery>,
) -> AppResult<Json<PaginatedResponse<Driver>>> {
    let (drivers, total, page) = state.services.drivers.list(&query).await?;
    Ok(Json(PaginatedResponse::new(drivers, total, page)))
}

/// Get driver by ID
#[utoipa::path(
    get,
    path = "/drivers/{id}",
    tag = "drivers",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Driver ID")),
    responses(
        (status = 200, description = "Driver details", body = Driver),
        (status = 404, description = "Driver not found")
    )
)]
pub async fn get_driver(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Driver>> {
    let driver = state.services.drivers.get_by_id(id).await?;
    Ok(Json(driver))
}

/// Add a driver
#[utoipa::path(
    post,
    path = "/drivers",
    tag = "drivers",
    security(("bearer_auth" = [])),
    request_body = CreateDriver,
    responses(
        (status = 201, description = "Driver created", body = Driver),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "License number already exists")
    )
)]
pub async fn create_driver(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(data): Json<CreateDriver>,
) -> AppResult<(StatusCode, Json<Driver>)> {
    claims.require_admin()?;

    let driver = state.services.drivers.create(&claims, data).await?;
    Ok((StatusCode::CREATED, Json(driver)))
}

/// Update a driver
#[utoipa::path(
    put,
    path = "/drivers/{id}",
    tag = "drivers",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Driver ID")),
    request_body = UpdateDriver,
    responses(
        (status = 200, description = "Driver updated", body = Driver),
        (status = 400, description = "Invalid input or status change"),
        (status = 404, description = "Driver not found")
    )
)]
pub async fn update_driver(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(data): Json<UpdateDriver>,
) -> AppResult<Json<Driver>> {
    claims.require_admin()?;

    let driver = state.services.drivers.update(&claims, id, data).await?;
    Ok(Json(driver))
}

/// Remove a driver (soft delete)
#[utoipa::path(
    delete,
    path = "/drivers/{id}",
    tag = "drivers",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Driver ID")),
    responses(
        (status = 204, description = "Driver removed"),
        (status = 404, description = "Driver not found"),
        (status = 409, description = "Driver is on an active deployment")
    )
)]
pub async fn delete_driver(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    claims.require_admin()?;

    state.services.drivers.delete(&claims, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
