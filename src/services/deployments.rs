//! Deployment workflow service.
//!
//! Every write runs in one transaction: the deployment row is locked first,
//! then any trucks, then any drivers. Candidates are checked by the pure
//! rules in [`crate::lifecycle`] and claimed with a conditional update, so
//! two requests racing for the same truck cannot both win. Timeline log rows
//! are written in the same transaction as the change they describe.

use chrono::{Duration, NaiveDate, Utc};
use rand::Rng;
use sqlx::PgConnection;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    lifecycle::{
        plan_replacement, plan_status_change, replacement::ensure_available,
        timeline::changed_milestones, unloading_time, validate_timeline,
    },
    models::{
        activity_log::NewActivityLog,
        deployment::{
            AssignmentHistory, CalendarEvent, CalendarQuery, CreateDeployment, Deployment,
            DeploymentDetails, DeploymentQuery, DeploymentSummary, ReplacementRequest,
            ReplacementView, Timeline, UpdateDeployment,
        },
        enums::{AssetStatus, DeploymentStatus},
        parse_date_param,
        timeline_log::NewTimelineLog,
        user::UserClaims,
        Page,
    },
    repository::Repository,
};

const CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const CODE_ATTEMPTS: usize = 5;
/// Longest calendar window served in one request
const MAX_CALENDAR_DAYS: i64 = 366;

/// Deployment code such as `DPL-20240101-7QXK`
pub fn generate_code<R: Rng>(date: NaiveDate, rng: &mut R) -> String {
    let suffix: String = (0..4)
        .map(|_| CODE_CHARSET[rng.gen_range(0..CODE_CHARSET.len())] as char)
        .collect();
    format!("DPL-{}-{}", date.format("%Y%m%d"), suffix)
}

#[derive(Clone)]
pub struct DeploymentsService {
    repository: Repository,
}

impl DeploymentsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// List deployments for the table view
    pub async fn list(&self, query: &DeploymentQuery) -> AppResult<(Vec<DeploymentSummary>, i64, Page)> {
        let assigned_date = query
            .assigned_date
            .as_deref()
            .map(|d| parse_date_param("assigned_date", d))
            .transpose()?;
        let departed_date = query
            .departed_date
            .as_deref()
            .map(|d| parse_date_param("departed_date", d))
            .transpose()?;

        let page = Page::new(query.page, query.per_page);
        let (mut rows, total) = self
            .repository
            .deployments
            .list(query, assigned_date, departed_date, page)
            .await?;

        for row in &mut rows {
            row.unloading_time = unloading_time(&Timeline {
                dest_arrival: row.dest_arrival,
                dest_departure: row.dest_departure,
                ..Timeline::default()
            });
        }

        Ok((rows, total, page))
    }

    /// Deployment with current and original truck and driver resolved
    pub async fn get_details(&self, id: i32) -> AppResult<DeploymentDetails> {
        let deployment = self.repository.deployments.get_by_id(id).await?;
        self.details(deployment).await
    }

    async fn details(&self, deployment: Deployment) -> AppResult<DeploymentDetails> {
        let original_truck = self.repository.trucks.get_short(deployment.truck_id).await?;
        let original_driver = self.repository.drivers.get_short(deployment.driver_id).await?;

        let current_truck = if deployment.current_truck_id() == deployment.truck_id {
            original_truck.clone()
        } else {
            self.repository.trucks.get_short(deployment.current_truck_id()).await?
        };
        let current_driver = if deployment.current_driver_id() == deployment.driver_id {
            original_driver.clone()
        } else {
            self.repository.drivers.get_short(deployment.current_driver_id()).await?
        };

        Ok(DeploymentDetails {
            current_truck_type: deployment.current_truck_type(),
            current_helper_count: deployment.current_helper_count(),
            unloading_time: unloading_time(&deployment.timeline),
            current_truck,
            current_driver,
            original_truck,
            original_driver,
            deployment,
        })
    }

    /// Original assignment, latest replacement and the timeline log
    pub async fn history(&self, id: i32) -> AppResult<AssignmentHistory> {
        let deployment = self.repository.deployments.get_by_id(id).await?;
        let original_truck = self.repository.trucks.get_short(deployment.truck_id).await?;
        let original_driver = self.repository.drivers.get_short(deployment.driver_id).await?;

        let replacement = match deployment.replacement {
            Some(ref r) => {
                let truck = match r.truck_id {
                    Some(truck_id) => Some(self.repository.trucks.get_short(truck_id).await?),
                    None => None,
                };
                let driver = match r.driver_id {
                    Some(driver_id) => Some(self.repository.drivers.get_short(driver_id).await?),
                    None => None,
                };
                Some(ReplacementView {
                    truck,
                    driver,
                    truck_type: r.truck_type,
                    helper_count: r.helper_count,
                    reason: r.reason,
                    remarks: r.remarks.clone(),
                    replaced_at: r.replaced_at,
                })
            }
            None => None,
        };

        let events = self.repository.timeline_logs.for_deployment(id).await?;

        Ok(AssignmentHistory {
            deployment_id: deployment.id,
            deployment_code: deployment.deployment_code,
            original_truck,
            original_driver,
            replacement,
            events,
        })
    }

    /// Calendar events between two dates, inclusive
    pub async fn calendar(&self, query: &CalendarQuery) -> AppResult<Vec<CalendarEvent>> {
        let start = parse_date_param("start", &query.start)?;
        let end = parse_date_param("end", &query.end)?;
        if end < start {
            return Err(AppError::Validation("end must not be before start".to_string()));
        }
        if end - start > Duration::days(MAX_CALENDAR_DAYS) {
            return Err(AppError::Validation(format!(
                "Calendar range cannot exceed {} days",
                MAX_CALENDAR_DAYS
            )));
        }
        self.repository.deployments.calendar(start, end).await
    }

    /// Assign an available truck and driver to a new run
    pub async fn create(&self, actor: &UserClaims, data: CreateDeployment) -> AppResult<DeploymentDetails> {
        data.validate()?;
        let data = data.normalized()?;

        let mut tx = self.repository.pool.begin().await?;

        let truck = self.repository.trucks.lock_candidate(&mut tx, data.truck_id).await?;
        ensure_available(&truck)?;
        let driver = self.repository.drivers.lock_candidate(&mut tx, data.driver_id).await?;
        ensure_available(&driver)?;

        if !self.repository.trucks.claim(&mut tx, truck.id).await? {
            return Err(AppError::NotAvailable(format!("Truck {} is not available", truck.label)));
        }
        if !self.repository.drivers.claim(&mut tx, driver.id).await? {
            return Err(AppError::NotAvailable(format!("Driver {} is not available", driver.label)));
        }

        let truck_type = data
            .truck_type
            .or(truck.truck_type)
            .ok_or_else(|| AppError::Validation("Truck type is required".to_string()))?;

        let code = self.unused_code(&mut tx).await?;
        let deployment = self
            .repository
            .deployments
            .create(&mut tx, &code, &data, truck_type, actor.user_id)
            .await?;

        self.repository
            .timeline_logs
            .insert(
                &mut tx,
                &NewTimelineLog {
                    performed_by: actor.user_id,
                    target_deployment: deployment.id,
                    action: format!(
                        "Created deployment with truck {} and driver {}",
                        truck.label, driver.label
                    ),
                    status: deployment.status,
                },
            )
            .await?;
        self.repository
            .activity_logs
            .insert(
                &mut tx,
                &NewActivityLog::new(
                    actor.user_id,
                    format!("Created deployment {}", deployment.deployment_code),
                    deployment.status,
                ),
            )
            .await?;

        tx.commit().await?;

        tracing::info!(
            "Deployment {} created (truck {}, driver {})",
            deployment.deployment_code,
            truck.id,
            driver.id
        );

        self.details(deployment).await
    }

    async fn unused_code(&self, conn: &mut PgConnection) -> AppResult<String> {
        let today = Utc::now().date_naive();
        for _ in 0..CODE_ATTEMPTS {
            let code = generate_code(today, &mut rand::thread_rng());
            if !self.repository.deployments.code_exists(conn, &code).await? {
                return Ok(code);
            }
        }
        Err(AppError::Internal("Could not generate a unique deployment code".to_string()))
    }

    /// Partial update: cargo fields, milestones, replacement and status
    pub async fn update(&self, actor: &UserClaims, id: i32, data: UpdateDeployment) -> AppResult<DeploymentDetails> {
        data.validate()?;
        let data = data.normalized()?;

        let mut tx = self.repository.pool.begin().await?;
        let before = self.repository.deployments.lock(&mut tx, id).await?;
        let mut after = before.clone();
        let mut actions = Vec::new();

        if data.touches_timeline() {
            if before.status == DeploymentStatus::Canceled {
                return Err(AppError::Validation(
                    "Milestones cannot be edited on a canceled deployment".to_string(),
                ));
            }
            after.timeline = data.merged_timeline(&before.timeline);
            validate_timeline(&after.timeline)?;
            for (milestone, value) in changed_milestones(&before.timeline, &after.timeline) {
                actions.push(match value {
                    Some(at) => format!("{} set to {}", milestone.label(), at.to_rfc3339()),
                    None => format!("{} cleared", milestone.label()),
                });
            }
        }

        if let Some(truck_type) = data.truck_type {
            after.truck_type = truck_type;
        }
        if let Some(helper_count) = data.helper_count {
            after.helper_count = helper_count;
        }
        if let Some(sacks_count) = data.sacks_count {
            after.sacks_count = sacks_count;
        }
        if let Some(load_weight_kg) = data.load_weight_kg {
            after.load_weight_kg = load_weight_kg;
        }
        if let Some(ref pickup_site) = data.pickup_site {
            after.pickup_site = pickup_site.clone();
        }
        if let Some(ref destination) = data.destination {
            after.destination = destination.clone();
        }
        if details_changed(&before, &after) {
            actions.push("Updated deployment details".to_string());
        }

        // Replacement before status, so completing in the same request
        // releases the newly assigned assets.
        if let Some(ref request) = data.replacement {
            actions.push(self.replace_in_tx(&mut tx, &mut after, request).await?);
        }

        if let Some(next) = data.status {
            let effects = plan_status_change(after.status, next)?;
            if next != after.status {
                actions.push(format!("Status changed from {} to {}", after.status, next));
            }
            if effects.release_assets {
                self.repository
                    .trucks
                    .set_status(&mut tx, after.current_truck_id(), AssetStatus::Available)
                    .await?;
                self.repository
                    .drivers
                    .set_status(&mut tx, after.current_driver_id(), AssetStatus::Available)
                    .await?;
            }
            if effects.increment_trip_count {
                self.repository
                    .drivers
                    .increment_trip_count(&mut tx, after.current_driver_id())
                    .await?;
            }
            after.status = next;
        }

        if after == before {
            // Nothing to write, e.g. a repeated terminal status
            tx.commit().await?;
            return self.details(before).await;
        }

        let saved = self.repository.deployments.save(&mut tx, &after).await?;
        for action in actions {
            self.repository
                .timeline_logs
                .insert(
                    &mut tx,
                    &NewTimelineLog {
                        performed_by: actor.user_id,
                        target_deployment: saved.id,
                        action,
                        status: saved.status,
                    },
                )
                .await?;
        }
        tx.commit().await?;

        if saved.status != before.status {
            tracing::info!(
                "Deployment {} moved from {} to {}",
                saved.deployment_code,
                before.status,
                saved.status
            );
        }

        self.details(saved).await
    }

    /// Swap the truck and/or driver of a running deployment
    pub async fn replace(&self, actor: &UserClaims, id: i32, request: ReplacementRequest) -> AppResult<DeploymentDetails> {
        request.validate()?;

        let mut tx = self.repository.pool.begin().await?;
        let mut deployment = self.repository.deployments.lock(&mut tx, id).await?;
        let action = self.replace_in_tx(&mut tx, &mut deployment, &request).await?;

        let saved = self.repository.deployments.save(&mut tx, &deployment).await?;
        self.repository
            .timeline_logs
            .insert(
                &mut tx,
                &NewTimelineLog {
                    performed_by: actor.user_id,
                    target_deployment: saved.id,
                    action,
                    status: saved.status,
                },
            )
            .await?;
        tx.commit().await?;

        self.details(saved).await
    }

    /// Lock and check candidates, move asset statuses and set the
    /// replacement on `deployment`. Returns the timeline log action.
    async fn replace_in_tx(
        &self,
        conn: &mut PgConnection,
        deployment: &mut Deployment,
        request: &ReplacementRequest,
    ) -> AppResult<String> {
        let truck = match request.truck_id {
            Some(truck_id) => Some(self.repository.trucks.lock_candidate(conn, truck_id).await?),
            None => None,
        };
        let driver = match request.driver_id {
            Some(driver_id) => Some(self.repository.drivers.lock_candidate(conn, driver_id).await?),
            None => None,
        };

        let plan = plan_replacement(deployment, truck.as_ref(), driver.as_ref(), request, Utc::now())?;

        let mut parts = Vec::new();
        if let (Some(old_id), Some(new)) = (plan.release_truck, truck.as_ref()) {
            let old = self.repository.trucks.lock_candidate(conn, old_id).await?;
            self.repository.trucks.set_status(conn, old_id, AssetStatus::Available).await?;
            if !self.repository.trucks.claim(conn, new.id).await? {
                return Err(AppError::NotAvailable(format!("Truck {} is not available", new.label)));
            }
            parts.push(format!("truck {} with {}", old.label, new.label));
        }
        if let (Some(old_id), Some(new)) = (plan.release_driver, driver.as_ref()) {
            let old = self.repository.drivers.lock_candidate(conn, old_id).await?;
            self.repository.drivers.set_status(conn, old_id, AssetStatus::Available).await?;
            if !self.repository.drivers.claim(conn, new.id).await? {
                return Err(AppError::NotAvailable(format!("Driver {} is not available", new.label)));
            }
            parts.push(format!("driver {} with {}", old.label, new.label));
        }

        let action = format!(
            "Replaced {} ({})",
            parts.join(" and "),
            plan.replacement.reason
        );
        tracing::info!("Deployment {}: {}", deployment.deployment_code, action);

        deployment.replacement = Some(plan.replacement);
        Ok(action)
    }
}

fn details_changed(before: &Deployment, after: &Deployment) -> bool {
    before.truck_type != after.truck_type
        || before.helper_count != after.helper_count
        || before.sacks_count != after.sacks_count
        || before.load_weight_kg != after.load_weight_kg
        || before.pickup_site != after.pickup_site
        || before.destination != after.destination
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn deployment_code_format() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let code = generate_code(date, &mut StdRng::seed_from_u64(7));

        assert_eq!(code.len(), "DPL-20240309-XXXX".len());
        assert!(code.starts_with("DPL-20240309-"));
        assert!(code[13..]
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn codes_vary_between_draws() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        let codes: std::collections::HashSet<String> =
            (0..50).map(|_| generate_code(date, &mut rng)).collect();
        assert!(codes.len() > 45);
    }
}
