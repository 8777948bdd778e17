//! Truck fleet service

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    lifecycle::AssetCandidate,
    models::{
        activity_log::NewActivityLog,
        enums::AssetStatus,
        truck::{CreateTruck, Truck, TruckQuery, UpdateTruck},
        user::UserClaims,
        Page,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct TrucksService {
    repository: Repository,
}

impl TrucksService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self, query: &TruckQuery) -> AppResult<(Vec<Truck>, i64, Page)> {
        let page = Page::new(query.page, query.per_page);
        let (trucks, total) = self.repository.trucks.list(query, page).await?;
        Ok((trucks, total, page))
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Truck> {
        self.repository.trucks.get_by_id(id).await
    }

    pub async fn create(&self, actor: &UserClaims, data: CreateTruck) -> AppResult<Truck> {
        data.validate()?;
        let data = data.normalized()?;

        if self.repository.trucks.plate_exists(&data.plate_no, None).await? {
            return Err(AppError::Conflict("Plate number already exists".to_string()));
        }

        let mut tx = self.repository.pool.begin().await?;
        let truck = self.repository.trucks.create(&mut tx, &data).await?;
        self.repository
            .activity_logs
            .insert(
                &mut tx,
                &NewActivityLog::new(actor.user_id, format!("Added truck {}", truck.plate_no), truck.status),
            )
            .await?;
        tx.commit().await?;

        Ok(truck)
    }

    pub async fn update(&self, actor: &UserClaims, id: i32, data: UpdateTruck) -> AppResult<Truck> {
        data.validate()?;
        let data = data.normalized()?;

        if let Some(ref plate) = data.plate_no {
            if self.repository.trucks.plate_exists(plate, Some(id)).await? {
                return Err(AppError::Conflict("Plate number already exists".to_string()));
            }
        }

        let mut tx = self.repository.pool.begin().await?;
        let current = self.repository.trucks.lock_candidate(&mut tx, id).await?;
        if !current.is_active {
            return Err(AppError::NotFound(format!("Truck {} not found", id)));
        }
        if let Some(status) = data.status {
            ensure_manual_status_change(&current, status)?;
        }

        let truck = self.repository.trucks.update(&mut tx, id, &data).await?;
        self.repository
            .activity_logs
            .insert(
                &mut tx,
                &NewActivityLog::new(actor.user_id, format!("Updated truck {}", truck.plate_no), truck.status),
            )
            .await?;
        tx.commit().await?;

        Ok(truck)
    }

    /// Soft delete; trucks on a run cannot be removed
    pub async fn delete(&self, actor: &UserClaims, id: i32) -> AppResult<()> {
        let mut tx = self.repository.pool.begin().await?;
        let current = self.repository.trucks.lock_candidate(&mut tx, id).await?;
        if current.status == AssetStatus::Deployed {
            return Err(AppError::Conflict(format!(
                "Truck {} is on an active deployment",
                current.label
            )));
        }

        let truck = self.repository.trucks.soft_delete(&mut tx, id).await?;
        self.repository
            .activity_logs
            .insert(
                &mut tx,
                &NewActivityLog::new(actor.user_id, format!("Removed truck {}", truck.plate_no), truck.status),
            )
            .await?;
        tx.commit().await?;

        Ok(())
    }
}

/// Administrative edits toggle `available` and `unavailable` only; the
/// deployment workflow owns `deployed`.
pub(crate) fn ensure_manual_status_change(current: &AssetCandidate, next: AssetStatus) -> AppResult<()> {
    if next == AssetStatus::Deployed {
        return Err(AppError::Validation(
            "Status 'deployed' is set by creating a deployment".to_string(),
        ));
    }
    if current.status == AssetStatus::Deployed {
        return Err(AppError::Validation(format!(
            "{} is on an active deployment; finish or cancel it first",
            current.label
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::AssetKind;

    fn candidate(status: AssetStatus) -> AssetCandidate {
        AssetCandidate {
            kind: AssetKind::Truck,
            id: 1,
            label: "ABC 1234".into(),
            status,
            is_active: true,
            truck_type: None,
        }
    }

    #[test]
    fn admins_toggle_between_available_and_unavailable() {
        assert!(ensure_manual_status_change(&candidate(AssetStatus::Available), AssetStatus::Unavailable).is_ok());
        assert!(ensure_manual_status_change(&candidate(AssetStatus::Unavailable), AssetStatus::Available).is_ok());
    }

    #[test]
    fn deployed_is_owned_by_the_workflow() {
        assert!(ensure_manual_status_change(&candidate(AssetStatus::Available), AssetStatus::Deployed).is_err());
        assert!(ensure_manual_status_change(&candidate(AssetStatus::Deployed), AssetStatus::Available).is_err());
    }
}
