//! Business logic services

pub mod analytics;
pub mod deployments;
pub mod drivers;
pub mod logs;
pub mod trucks;
pub mod users;

use crate::{config::AuthConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub users: users::UsersService,
    pub trucks: trucks::TrucksService,
    pub drivers: drivers::DriversService,
    pub deployments: deployments::DeploymentsService,
    pub logs: logs::LogsService,
    pub analytics: analytics::AnalyticsService,
    repository: Repository,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, auth_config: AuthConfig) -> Self {
        Self {
            users: users::UsersService::new(repository.clone(), auth_config),
            trucks: trucks::TrucksService::new(repository.clone()),
            drivers: drivers::DriversService::new(repository.clone()),
            deployments: deployments::DeploymentsService::new(repository.clone()),
            logs: logs::LogsService::new(repository.clone()),
            analytics: analytics::AnalyticsService::new(repository.clone()),
            repository,
        }
    }

    /// Check that the database answers
    pub async fn ping(&self) -> crate::error::AppResult<()> {
        self.repository.ping().await
    }
}
