//! Driver roster service

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        activity_log::NewActivityLog,
        driver::{CreateDriver, Driver, DriverQuery, UpdateDriver},
        enums::AssetStatus,
        user::UserClaims,
        Page,
    },
    repository::Repository,
    services::trucks::ensure_manual_status_change,
};

#[derive(Clone)]
pub struct DriversService {
    repository: Repository,
}

impl DriversService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self, query: &DriverQuery) -> AppResult<(Vec<Driver>, i64, Page)> {
        let page = Page::new(query.page, query.per_page);
        let (drivers, total) = self.repository.drivers.list(query, page).await?;
        Ok((drivers, total, page))
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Driver> {
        self.repository.drivers.get_by_id(id).await
    }

    pub async fn create(&self, actor: &UserClaims, data: CreateDriver) -> AppResult<Driver> {
        data.validate()?;
        let data = data.normalized()?;

        let mut tx = self.repository.pool.begin().await?;
        let driver = self.repository.drivers.create(&mut tx, &data).await?;
        self.repository
            .activity_logs
            .insert(
                &mut tx,
                &NewActivityLog::new(
                    actor.user_id,
                    format!("Added driver {} {}", driver.first_name, driver.last_name),
                    driver.status,
                ),
            )
            .await?;
        tx.commit().await?;

        Ok(driver)
    }

    pub async fn update(&self, actor: &UserClaims, id: i32, data: UpdateDriver) -> AppResult<Driver> {
        data.validate()?;
        let data = data.normalized()?;

        let mut tx = self.repository.pool.begin().await?;
        let current = self.repository.drivers.lock_candidate(&mut tx, id).await?;
        if !current.is_active {
            return Err(AppError::NotFound(format!("Driver {} not found", id)));
        }
        if let Some(status) = data.status {
            ensure_manual_status_change(&current, status)?;
        }

        let driver = self.repository.drivers.update(&mut tx, id, &data).await?;
        self.repository
            .activity_logs
            .insert(
                &mut tx,
                &NewActivityLog::new(
                    actor.user_id,
                    format!("Updated driver {} {}", driver.first_name, driver.last_name),
                    driver.status,
                ),
            )
            .await?;
        tx.commit().await?;

        Ok(driver)
    }

    /// Soft delete; drivers on a run cannot be removed
    pub async fn delete(&self, actor: &UserClaims, id: i32) -> AppResult<()> {
        let mut tx = self.repository.pool.begin().await?;
        let current = self.repository.drivers.lock_candidate(&mut tx, id).await?;
        if current.status == AssetStatus::Deployed {
            return Err(AppError::Conflict(format!(
                "Driver {} is on an active deployment",
                current.label
            )));
        }

        let driver = self.repository.drivers.soft_delete(&mut tx, id).await?;
        self.repository
            .activity_logs
            .insert(
                &mut tx,
                &NewActivityLog::new(
                    actor.user_id,
                    format!("Removed driver {} {}", driver.first_name, driver.last_name),
                    driver.status,
                ),
            )
            .await?;
        tx.commit().await?;

        Ok(())
    }
}
