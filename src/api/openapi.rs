//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{analytics, auth, deployments, drivers, health, logs, trucks, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Freightdesk API",
        version = "1.0.0",
        description = "Freight back-office REST API: deployments, trucks, drivers and accounts"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::login,
        auth::register,
        auth::me,
        users::update_my_profile,
        // Deployments
        deployments::list_deployments,
        deployments::get_deployment,
        deployments::create_deployment,
        deployments::update_deployment,
        deployments::replace_assignment,
        deployments::get_history,
        deployments::calendar,
        // Trucks
        trucks::list_trucks,
        trucks::get_truck,
        trucks::create_truck,
        trucks::update_truck,
        trucks::delete_truck,
        // Drivers
        drivers::list_drivers,
        drivers::get_driver,
        drivers::create_driver,
        drivers::update_driver,
        drivers::delete_driver,
        // Users
        users::list_users,
        users::get_user,
        users::create_user,
        users::update_user,
        users::delete_user,
        users::update_user_status,
        // Logs
        logs::list_activity_logs,
        logs::list_timeline_logs,
        // Analytics
        analytics::get_analytics,
    ),
    components(
        schemas(
            // Auth
            auth::LoginRequest,
            auth::LoginResponse,
            // Enums
            crate::models::enums::DeploymentStatus,
            crate::models::enums::AssetStatus,
            crate::models::enums::TruckCondition,
            crate::models::enums::TruckType,
            crate::models::enums::ReplacementReason,
            crate::models::enums::UserRole,
            crate::models::enums::UserStatus,
            // Deployments
            crate::models::deployment::Deployment,
            crate::models::deployment::DeploymentDetails,
            crate::models::deployment::DeploymentSummary,
            crate::models::deployment::Timeline,
            crate::models::deployment::Replacement,
            crate::models::deployment::ReplacementRequest,
            crate::models::deployment::ReplacementView,
            crate::models::deployment::CreateDeployment,
            crate::models::deployment::UpdateDeployment,
            crate::models::deployment::SortOrder,
            crate::models::deployment::CalendarEvent,
            crate::models::deployment::AssignmentHistory,
            // Trucks
            crate::models::truck::Truck,
            crate::models::truck::TruckShort,
            crate::models::truck::CreateTruck,
            crate::models::truck::UpdateTruck,
            // Drivers
            crate::models::driver::Driver,
            crate::models::driver::DriverShort,
            crate::models::driver::CreateDriver,
            crate::models::driver::UpdateDriver,
            // Users
            crate::models::user::User,
            crate::models::user::RegisterUser,
            crate::models::user::CreateUser,
            crate::models::user::UpdateUser,
            crate::models::user::UpdateProfile,
            crate::models::user::UpdateUserStatus,
            // Logs
            crate::models::activity_log::ActivityLogEntry,
            crate::models::timeline_log::TimelineLogEntry,
            // Analytics
            crate::models::analytics::AnalyticsResponse,
            crate::models::analytics::DeploymentStats,
            crate::models::analytics::AssetStats,
            crate::models::analytics::MonthlyEntry,
            crate::models::analytics::DriverTripEntry,
            // Pages
            crate::api::TruckPage,
            crate::api::DriverPage,
            crate::api::UserPage,
            crate::api::DeploymentPage,
            crate::api::ActivityLogPage,
            crate::api::TimelineLogPage,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication and own profile"),
        (name = "deployments", description = "Truck runs, milestones and replacements"),
        (name = "trucks", description = "Truck fleet"),
        (name = "drivers", description = "Driver roster"),
        (name = "users", description = "Accounts and approval"),
        (name = "logs", description = "Activity and timeline logs"),
        (name = "analytics", description = "Dashboard metrics")
    )
)]
pub struct ApiDoc;

/// Registers the bearer JWT scheme referenced by `security(("bearer_auth" = []))`
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_deployment_routes_and_bearer_scheme() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/deployments/{id}/replacement"));
        assert!(doc.paths.paths.contains_key("/deployments/calendar"));
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
