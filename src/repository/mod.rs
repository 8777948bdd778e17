//! Repository layer for database operations

pub mod activity_logs;
pub mod analytics;
pub mod deployments;
pub mod drivers;
pub mod timeline_logs;
pub mod trucks;
pub mod users;

use sqlx::{Pool, Postgres};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub trucks: trucks::TrucksRepository,
    pub drivers: drivers::DriversRepository,
    pub deployments: deployments::DeploymentsRepository,
    pub users: users::UsersRepository,
    pub activity_logs: activity_logs::ActivityLogsRepository,
    pub timeline_logs: timeline_logs::TimelineLogsRepository,
    pub analytics: analytics::AnalyticsRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            trucks: trucks::TrucksRepository::new(pool.clone()),
            drivers: drivers::DriversRepository::new(pool.clone()),
            deployments: deployments::DeploymentsRepository::new(pool.clone()),
            users: users::UsersRepository::new(pool.clone()),
            activity_logs: activity_logs::ActivityLogsRepository::new(pool.clone()),
            timeline_logs: timeline_logs::TimelineLogsRepository::new(pool.clone()),
            analytics: analytics::AnalyticsRepository::new(pool.clone()),
            pool,
        }
    }

    /// Round-trip to the database, used by `/ready`
    pub async fn ping(&self) -> crate::error::AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
