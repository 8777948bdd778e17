//! Replacement planning and availability checks

use chrono::{DateTime, Utc};

use crate::{
    error::{AppError, AppResult},
    models::{
        deployment::{Deployment, Replacement, ReplacementRequest},
        enums::{AssetStatus, TruckType},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Truck,
    Driver,
}

impl AssetKind {
    fn noun(&self) -> &'static str {
        match self {
            AssetKind::Truck => "Truck",
            AssetKind::Driver => "Driver",
        }
    }
}

/// Snapshot of a truck or driver read under a row lock
#[derive(Debug, Clone)]
pub struct AssetCandidate {
    pub kind: AssetKind,
    pub id: i32,
    /// Plate number or driver name, for messages
    pub label: String,
    pub status: AssetStatus,
    pub is_active: bool,
    /// Trucks only
    pub truck_type: Option<TruckType>,
}

/// Fail unless the candidate can be put on a run right now
pub fn ensure_available(candidate: &AssetCandidate) -> AppResult<()> {
    if !candidate.is_active {
        return Err(AppError::NotAvailable(format!(
            "{} {} has been removed",
            candidate.kind.noun(),
            candidate.label
        )));
    }
    if candidate.status != AssetStatus::Available {
        return Err(AppError::NotAvailable(format!(
            "{} {} is not available (status: {})",
            candidate.kind.noun(),
            candidate.label,
            candidate.status
        )));
    }
    Ok(())
}

/// What applying a replacement writes
#[derive(Debug, Clone, PartialEq)]
pub struct ReplacementPlan {
    /// New sub-record for the deployment
    pub replacement: Replacement,
    /// Assets swapped away, to become `available`
    pub release_truck: Option<i32>,
    pub release_driver: Option<i32>,
    /// Assets swapped in, to become `deployed`
    pub deploy_truck: Option<i32>,
    pub deploy_driver: Option<i32>,
}

/// Validate a replacement against the deployment and locked candidates.
///
/// A side without a candidate keeps whatever is currently assigned, carried
/// over from an earlier replacement if there was one. The original
/// `truck_id`/`driver_id` are not part of the plan and stay untouched.
pub fn plan_replacement(
    deployment: &Deployment,
    truck: Option<&AssetCandidate>,
    driver: Option<&AssetCandidate>,
    request: &ReplacementRequest,
    now: DateTime<Utc>,
) -> AppResult<ReplacementPlan> {
    if deployment.status.is_terminal() {
        return Err(AppError::Validation(format!(
            "Deployment {} is {} and can no longer be replaced",
            deployment.deployment_code, deployment.status
        )));
    }
    if truck.is_none() && driver.is_none() {
        return Err(AppError::Validation(
            "A replacement needs a truck, a driver, or both".to_string(),
        ));
    }

    if let Some(candidate) = truck {
        check_candidate(candidate, deployment.current_truck_id(), deployment.truck_id)?;
    }
    if let Some(candidate) = driver {
        check_candidate(candidate, deployment.current_driver_id(), deployment.driver_id)?;
    }

    let replaced_at = request.replaced_at.unwrap_or(now);
    if replaced_at < deployment.created_at || replaced_at > now {
        return Err(AppError::Validation(
            "Replacement time must fall between the deployment's creation and now".to_string(),
        ));
    }

    let prior = deployment.replacement.as_ref();
    let truck_type = match truck {
        Some(candidate) => request.truck_type.or(candidate.truck_type),
        None => request.truck_type.or(prior.and_then(|r| r.truck_type)),
    };

    let replacement = Replacement {
        truck_id: truck.map(|c| c.id).or(prior.and_then(|r| r.truck_id)),
        driver_id: driver.map(|c| c.id).or(prior.and_then(|r| r.driver_id)),
        truck_type,
        helper_count: request.helper_count.or(prior.and_then(|r| r.helper_count)),
        replaced_at,
        reason: request.reason,
        remarks: request
            .remarks
            .as_ref()
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty()),
    };

    Ok(ReplacementPlan {
        replacement,
        release_truck: truck.map(|_| deployment.current_truck_id()),
        release_driver: driver.map(|_| deployment.current_driver_id()),
        deploy_truck: truck.map(|c| c.id),
        deploy_driver: driver.map(|c| c.id),
    })
}

fn check_candidate(candidate: &AssetCandidate, current_id: i32, original_id: i32) -> AppResult<()> {
    if candidate.id == current_id {
        return Err(AppError::Validation(format!(
            "{} {} is already assigned to this deployment",
            candidate.kind.noun(),
            candidate.label
        )));
    }
    if candidate.id == original_id {
        return Err(AppError::Validation(format!(
            "{} {} was the original assignment and cannot be used as its replacement",
            candidate.kind.noun(),
            candidate.label
        )));
    }
    ensure_available(candidate)
}
