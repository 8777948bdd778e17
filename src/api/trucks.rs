//! Truck fleet endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::truck::{CreateTruck, Truck, TruckQuery, UpdateTruck},
};

use super::{AuthenticatedUser, PaginatedResponse, TruckPage};

/// List trucks
#[utoipa::path(
    get,
    path = "/trucks",
    tag = "trucks",
    security(("bearer_auth" = [])),
    params(TruckQuery),
    responses(
        (status = 200, description = "List of trucks", body = TruckPage),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_trucks(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<TruckQuery>,
) -> AppResult<Json<PaginatedResponse<Truck>>> {
    let (trucks, total, page) = state.services.trucks.list(&query).await?;
    Ok(Json(PaginatedResponse::new(trucks, total, page)))
}

/// Get truck by ID
#[utoipa::path(
    get,
    path = "/trucks/{id}",
    tag = "trucks",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Truck ID")),
    responses(
        (status = 200, description = "Truck details", body = Truck),
        (status = 404, description = "Truck not found")
    )
)]
pub async fn get_truck(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Truck>> {
    let truck = state.services.trucks.get_by_id(id).await?;
    Ok(Json(truck))
}

/// Register a truck
#[utoipa::path(
    post,
    path = "/trucks",
    tag = "trucks",
    security(("bearer_auth" = [])),
    request_body = CreateTruck,
    responses(
        (status = 201, description = "Truck created", body = Truck),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Plate number already exists")
    )
)]
pub async fn create_truck(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(data): Json<CreateTruck>,
) -> AppResult<(StatusCode, Json<Truck>)> {
    claims.require_admin()?;

    let truck = state.services.trucks.create(&claims, data).await?;
    Ok((StatusCode::CREATED, Json(truck)))
}

/// Update a truck
#[utoipa::path(
    put,
    path = "/trucks/{id}",
    tag = "trucks",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Truck ID")),
    request_body = UpdateTruck,
    responses(
        (status = 200, description = "Truck updated", body = Truck),
        (status = 400, description = "Invalid input or status change"),
        (status = 404, description = "Truck not found")
    )
)]
pub async fn update_truck(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(data): Json<UpdateTruck>,
) -> AppResult<Json<Truck>> {
    claims.require_admin()?;

    let truck = state.services.trucks.update(&claims, id, data).await?;
    Ok(Json(truck))
}

/// Remove a truck from the fleet (soft delete)
#[utoipa::path(
    delete,
    path = "/trucks/{id}",
    tag = "trucks",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Truck ID")),
    responses(
        (status = 204, description = "Truck removed"),
        (status = 404, description = "Truck not found"),
        (status = 409, description = "Truck is on an active deployment")
    )
)]
pub async fn delete_truck(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    claims.require_admin()?;

    state.services.trucks.delete(&claims, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
