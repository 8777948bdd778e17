//! API handlers for Freightdesk REST endpoints

pub mod analytics;
pub mod auth;
pub mod deployments;
pub mod drivers;
pub mod health;
pub mod logs;
pub mod openapi;
pub mod trucks;
pub mod users;

use std::time::Duration;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
    routing::{get, post, put},
    Router,
};
use serde::Serialize;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use utoipa::ToSchema;

use crate::{
    error::AppError,
    models::{
        activity_log::ActivityLogEntry, deployment::DeploymentSummary, driver::Driver,
        timeline_log::TimelineLogEntry, truck::Truck, user::User, user::UserClaims, Page,
    },
    AppState,
};

/// Extractor for authenticated user from JWT token, checked against the
/// current account record
pub struct AuthenticatedUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Authentication("Invalid authorization header format".to_string()))?;

        let claims = UserClaims::from_token(token, &state.config.auth.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))?;

        // Status and role come from the account, not the token
        let claims = state.services.users.session(claims).await?;

        Ok(AuthenticatedUser(claims))
    }
}

/// Paginated response wrapper
#[derive(Serialize, ToSchema)]
#[aliases(
    TruckPage = PaginatedResponse<Truck>,
    DriverPage = PaginatedResponse<Driver>,
    UserPage = PaginatedResponse<User>,
    DeploymentPage = PaginatedResponse<DeploymentSummary>,
    ActivityLogPage = PaginatedResponse<ActivityLogEntry>,
    TimelineLogPage = PaginatedResponse<TimelineLogEntry>
)]
pub struct PaginatedResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    /// Page content
    pub items: Vec<T>,
    /// Total number of matching rows
    pub total: i64,
    /// Current page number
    pub page: i64,
    /// Items per page
    pub per_page: i64,
    pub total_pages: i64,
}

impl<T> PaginatedResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    pub fn new(items: Vec<T>, total: i64, page: Page) -> Self {
        Self {
            items,
            total,
            page: page.page,
            per_page: page.per_page,
            total_pages: page.total_pages(total),
        }
    }
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let timeout = Duration::from_secs(state.config.server.request_timeout_secs);

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Authentication
        .route("/auth/login", post(auth::login))
        .route("/auth/register", post(auth::register))
        .route("/auth/me", get(auth::me))
        .route("/auth/profile", put(users::update_my_profile))
        // Deployments
        .route("/deployments", get(deployments::list_deployments).post(deployments::create_deployment))
        .route("/deployments/calendar", get(deployments::calendar))
        .route(
            "/deployments/:id",
            get(deployments::get_deployment).patch(deployments::update_deployment),
        )
        .route("/deployments/:id/replacement", post(deployments::replace_assignment))
        .route("/deployments/:id/history", get(deployments::get_history))
        // Trucks
        .route("/trucks", get(trucks::list_trucks).post(trucks::create_truck))
        .route(
            "/trucks/:id",
            get(trucks::get_truck).put(trucks::update_truck).delete(trucks::delete_truck),
        )
        // Drivers
        .route("/drivers", get(drivers::list_drivers).post(drivers::create_driver))
        .route(
            "/drivers/:id",
            get(drivers::get_driver).put(drivers::update_driver).delete(drivers::delete_driver),
        )
        // Users
        .route("/users", get(users::list_users).post(users::create_user))
        .route(
            "/users/:id",
            get(users::get_user).put(users::update_user).delete(users::delete_user),
        )
        .route("/users/:id/status", put(users::update_user_status))
        // Logs
        .route("/activity-logs", get(logs::list_activity_logs))
        .route("/timeline-logs", get(logs::list_timeline_logs))
        // Analytics
        .route("/analytics", get(analytics::get_analytics))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi::create_openapi_router())
        .layer(TimeoutLayer::new(timeout))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
