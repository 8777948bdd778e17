//! Deployment (truck run) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::error::{AppError, AppResult};

use super::{
    driver::DriverShort,
    required_text,
    enums::{DeploymentStatus, ReplacementReason, TruckType},
    timeline_log::TimelineLogEntry,
    truck::TruckShort,
};

/// The five sequential milestone timestamps of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Timeline {
    pub departed: Option<DateTime<Utc>>,
    pub pickup_in: Option<DateTime<Utc>>,
    pub pickup_out: Option<DateTime<Utc>>,
    pub dest_arrival: Option<DateTime<Utc>>,
    pub dest_departure: Option<DateTime<Utc>>,
}

/// Mid-run truck and/or driver swap.
///
/// A side left as `None` was never replaced and still resolves to the
/// original assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Replacement {
    pub truck_id: Option<i32>,
    pub driver_id: Option<i32>,
    pub truck_type: Option<TruckType>,
    pub helper_count: Option<i32>,
    pub replaced_at: DateTime<Utc>,
    pub reason: ReplacementReason,
    pub remarks: Option<String>,
}

/// Internal row structure for deployment queries
#[derive(Debug, Clone, FromRow)]
pub struct DeploymentRow {
    id: i32,
    deployment_code: String,
    truck_id: i32,
    driver_id: i32,
    truck_type: TruckType,
    helper_count: i32,
    sacks_count: i32,
    load_weight_kg: Option<f64>,
    pickup_site: String,
    destination: String,
    status: DeploymentStatus,
    departed: Option<DateTime<Utc>>,
    pickup_in: Option<DateTime<Utc>>,
    pickup_out: Option<DateTime<Utc>>,
    dest_arrival: Option<DateTime<Utc>>,
    dest_departure: Option<DateTime<Utc>>,
    replacement_truck_id: Option<i32>,
    replacement_driver_id: Option<i32>,
    replacement_truck_type: Option<TruckType>,
    replacement_helper_count: Option<i32>,
    replaced_at: Option<DateTime<Utc>>,
    replacement_reason: Option<ReplacementReason>,
    replacement_remarks: Option<String>,
    created_by: Option<i32>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<DeploymentRow> for Deployment {
    fn from(row: DeploymentRow) -> Self {
        let replacement = match (row.replaced_at, row.replacement_reason) {
            (Some(replaced_at), Some(reason)) => Some(Replacement {
                truck_id: row.replacement_truck_id,
                driver_id: row.replacement_driver_id,
                truck_type: row.replacement_truck_type,
                helper_count: row.replacement_helper_count,
                replaced_at,
                reason,
                remarks: row.replacement_remarks,
            }),
            _ => None,
        };

        Deployment {
            id: row.id,
            deployment_code: row.deployment_code,
            truck_id: row.truck_id,
            driver_id: row.driver_id,
            truck_type: row.truck_type,
            helper_count: row.helper_count,
            sacks_count: row.sacks_count,
            load_weight_kg: row.load_weight_kg,
            pickup_site: row.pickup_site,
            destination: row.destination,
            status: row.status,
            timeline: Timeline {
                departed: row.departed,
                pickup_in: row.pickup_in,
                pickup_out: row.pickup_out,
                dest_arrival: row.dest_arrival,
                dest_departure: row.dest_departure,
            },
            replacement,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Full deployment model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Deployment {
    pub id: i32,
    /// Human-readable code, e.g. DPL-20240101-7QXK
    pub deployment_code: String,
    /// Originally assigned truck, never overwritten by a replacement
    pub truck_id: i32,
    /// Originally assigned driver, never overwritten by a replacement
    pub driver_id: i32,
    pub truck_type: TruckType,
    pub helper_count: i32,
    pub sacks_count: i32,
    pub load_weight_kg: Option<f64>,
    pub pickup_site: String,
    pub destination: String,
    pub status: DeploymentStatus,
    pub timeline: Timeline,
    pub replacement: Option<Replacement>,
    pub created_by: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Deployment {
    /// Truck currently on the run, taking a replacement into account
    pub fn current_truck_id(&self) -> i32 {
        self.replacement
            .as_ref()
            .and_then(|r| r.truck_id)
            .unwrap_or(self.truck_id)
    }

    /// Driver currently on the run, taking a replacement into account
    pub fn current_driver_id(&self) -> i32 {
        self.replacement
            .as_ref()
            .and_then(|r| r.driver_id)
            .unwrap_or(self.driver_id)
    }

    pub fn current_truck_type(&self) -> TruckType {
        self.replacement
            .as_ref()
            .and_then(|r| r.truck_type)
            .unwrap_or(self.truck_type)
    }

    pub fn current_helper_count(&self) -> i32 {
        self.replacement
            .as_ref()
            .and_then(|r| r.helper_count)
            .unwrap_or(self.helper_count)
    }
}

/// Deployment with resolved truck/driver references for detail views
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DeploymentDetails {
    #[serde(flatten)]
    pub deployment: Deployment,
    pub current_truck: TruckShort,
    pub current_driver: DriverShort,
    pub original_truck: TruckShort,
    pub original_driver: DriverShort,
    pub current_truck_type: TruckType,
    pub current_helper_count: i32,
    /// Time spent at the destination, or "Pending"
    pub unloading_time: String,
}

/// Deployment row for list views
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct DeploymentSummary {
    pub id: i32,
    pub deployment_code: String,
    pub status: DeploymentStatus,
    pub truck_type: TruckType,
    pub pickup_site: String,
    pub destination: String,
    pub sacks_count: i32,
    pub current_truck_plate: String,
    pub current_driver_name: String,
    pub is_replaced: bool,
    pub departed: Option<DateTime<Utc>>,
    pub dest_arrival: Option<DateTime<Utc>>,
    pub dest_departure: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[sqlx(skip)]
    pub unloading_time: String,
}

/// Sort direction on creation date
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Deployment query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct DeploymentQuery {
    pub status: Option<DeploymentStatus>,
    pub sort: Option<SortOrder>,
    /// Creation date (YYYY-MM-DD)
    pub assigned_date: Option<String>,
    /// Departure date (YYYY-MM-DD)
    pub departed_date: Option<String>,
    /// Search in code, sites, plate numbers and driver names
    pub search: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Create deployment request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateDeployment {
    pub truck_id: i32,
    pub driver_id: i32,
    /// Defaults to the truck's own type
    pub truck_type: Option<TruckType>,
    #[validate(range(min = 0, max = 20, message = "Helper count must be between 0 and 20"))]
    pub helper_count: i32,
    #[validate(range(min = 0, message = "Sacks count cannot be negative"))]
    pub sacks_count: i32,
    #[validate(range(min = 0.0, message = "Load weight cannot be negative"))]
    pub load_weight_kg: Option<f64>,
    #[validate(length(min = 1, message = "Pickup site is required"))]
    pub pickup_site: String,
    #[validate(length(min = 1, message = "Destination is required"))]
    pub destination: String,
}

impl CreateDeployment {
    /// Trimmed copy; whitespace-only sites are rejected
    pub fn normalized(mut self) -> AppResult<Self> {
        self.pickup_site = required_text(&self.pickup_site, 1, "Pickup site is required")?;
        self.destination = required_text(&self.destination, 1, "Destination is required")?;
        Ok(self)
    }
}

/// Replacement request, either standalone or inside a deployment update
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ReplacementRequest {
    pub truck_id: Option<i32>,
    pub driver_id: Option<i32>,
    pub truck_type: Option<TruckType>,
    #[validate(range(min = 0, max = 20, message = "Helper count must be between 0 and 20"))]
    pub helper_count: Option<i32>,
    pub reason: ReplacementReason,
    #[validate(length(max = 500, message = "Remarks must be at most 500 characters"))]
    pub remarks: Option<String>,
    /// Defaults to now; must not precede the deployment or lie in the future
    pub replaced_at: Option<DateTime<Utc>>,
}

/// Partial deployment update.
///
/// Milestones distinguish "absent" (unchanged) from an explicit `null`
/// (cleared).
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateDeployment {
    pub status: Option<DeploymentStatus>,
    #[serde(default, with = "serde_with::rust::double_option")]
    #[schema(value_type = Option<DateTime<Utc>>)]
    pub departed: Option<Option<DateTime<Utc>>>,
    #[serde(default, with = "serde_with::rust::double_option")]
    #[schema(value_type = Option<DateTime<Utc>>)]
    pub pickup_in: Option<Option<DateTime<Utc>>>,
    #[serde(default, with = "serde_with::rust::double_option")]
    #[schema(value_type = Option<DateTime<Utc>>)]
    pub pickup_out: Option<Option<DateTime<Utc>>>,
    #[serde(default, with = "serde_with::rust::double_option")]
    #[schema(value_type = Option<DateTime<Utc>>)]
    pub dest_arrival: Option<Option<DateTime<Utc>>>,
    #[serde(default, with = "serde_with::rust::double_option")]
    #[schema(value_type = Option<DateTime<Utc>>)]
    pub dest_departure: Option<Option<DateTime<Utc>>>,
    pub truck_type: Option<TruckType>,
    #[validate(range(min = 0, max = 20, message = "Helper count must be between 0 and 20"))]
    pub helper_count: Option<i32>,
    #[validate(range(min = 0, message = "Sacks count cannot be negative"))]
    pub sacks_count: Option<i32>,
    /// Explicit `null` clears the weight
    #[serde(default, with = "serde_with::rust::double_option")]
    #[schema(value_type = Option<f64>)]
    pub load_weight_kg: Option<Option<f64>>,
    #[validate(length(min = 1, message = "Pickup site cannot be empty"))]
    pub pickup_site: Option<String>,
    #[validate(length(min = 1, message = "Destination cannot be empty"))]
    pub destination: Option<String>,
    #[validate(nested)]
    pub replacement: Option<ReplacementRequest>,
}

impl UpdateDeployment {
    /// Trimmed copy; checks what `validator` cannot see through the
    /// nested option and surrounding whitespace
    pub fn normalized(mut self) -> AppResult<Self> {
        if let Some(Some(weight)) = self.load_weight_kg {
            if weight < 0.0 {
                return Err(AppError::Validation("Load weight cannot be negative".to_string()));
            }
        }
        if let Some(ref site) = self.pickup_site {
            self.pickup_site = Some(required_text(site, 1, "Pickup site cannot be empty")?);
        }
        if let Some(ref destination) = self.destination {
            self.destination = Some(required_text(destination, 1, "Destination cannot be empty")?);
        }
        Ok(self)
    }

    pub fn touches_timeline(&self) -> bool {
        self.departed.is_some()
            || self.pickup_in.is_some()
            || self.pickup_out.is_some()
            || self.dest_arrival.is_some()
            || self.dest_departure.is_some()
    }

    /// Stored timeline with this update's milestone changes applied
    pub fn merged_timeline(&self, current: &Timeline) -> Timeline {
        Timeline {
            departed: self.departed.unwrap_or(current.departed),
            pickup_in: self.pickup_in.unwrap_or(current.pickup_in),
            pickup_out: self.pickup_out.unwrap_or(current.pickup_out),
            dest_arrival: self.dest_arrival.unwrap_or(current.dest_arrival),
            dest_departure: self.dest_departure.unwrap_or(current.dest_departure),
        }
    }
}

/// Calendar query (inclusive date range, YYYY-MM-DD)
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct CalendarQuery {
    pub start: String,
    pub end: String,
}

/// Calendar projection of a deployment
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CalendarEvent {
    pub deployment_id: i32,
    pub title: String,
    pub status: DeploymentStatus,
    /// Departure time, falling back to creation time for runs not yet departed
    pub start: DateTime<Utc>,
    /// Destination departure when known
    pub end: Option<DateTime<Utc>>,
}

/// Original versus replacement assignment of a deployment
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AssignmentHistory {
    pub deployment_id: i32,
    pub deployment_code: String,
    pub original_truck: TruckShort,
    pub original_driver: DriverShort,
    pub replacement: Option<ReplacementView>,
    /// Timeline log entries, oldest first
    pub events: Vec<TimelineLogEntry>,
}

/// Replacement sub-record with resolved references
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReplacementView {
    pub truck: Option<TruckShort>,
    pub driver: Option<DriverShort>,
    pub truck_type: Option<TruckType>,
    pub helper_count: Option<i32>,
    pub reason: ReplacementReason,
    pub remarks: Option<String>,
    pub replaced_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn deployment() -> Deployment {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
        Deployment {
            id: 1,
            deployment_code: "DPL-20240101-AAAA".into(),
            truck_id: 10,
            driver_id: 20,
            truck_type: TruckType::TenWheeler,
            helper_count: 2,
            sacks_count: 400,
            load_weight_kg: Some(20_000.0),
            pickup_site: "North Mill".into(),
            destination: "Port Area".into(),
            status: DeploymentStatus::Ongoing,
            timeline: Timeline::default(),
            replacement: None,
            created_by: Some(1),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn current_assignment_resolves_to_original_without_replacement() {
        let d = deployment();
        assert_eq!(d.current_truck_id(), 10);
        assert_eq!(d.current_driver_id(), 20);
        assert_eq!(d.current_truck_type(), TruckType::TenWheeler);
    }

    #[test]
    fn current_assignment_resolves_to_replacement_side_by_side() {
        let mut d = deployment();
        d.replacement = Some(Replacement {
            truck_id: Some(11),
            driver_id: None,
            truck_type: Some(TruckType::WingVan),
            helper_count: None,
            replaced_at: d.created_at,
            reason: ReplacementReason::MechanicalIssue,
            remarks: None,
        });
        assert_eq!(d.current_truck_id(), 11);
        assert_eq!(d.current_driver_id(), 20);
        assert_eq!(d.current_truck_type(), TruckType::WingVan);
        assert_eq!(d.current_helper_count(), 2);
        assert_eq!(d.truck_id, 10);
    }

    #[test]
    fn update_distinguishes_absent_from_null_milestones() {
        let update: UpdateDeployment =
            serde_json::from_str(r#"{"pickup_in": null, "departed": "2024-01-01T09:00:00Z"}"#).unwrap();
        assert_eq!(update.pickup_in, Some(None));
        assert!(update.departed.unwrap().is_some());
        assert_eq!(update.pickup_out, None);

        let current = Timeline {
            pickup_in: Some(Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap()),
            ..Timeline::default()
        };
        let merged = update.merged_timeline(&current);
        assert!(merged.departed.is_some());
        assert_eq!(merged.pickup_in, None);
    }

    fn create_request(pickup_site: &str, destination: &str) -> CreateDeployment {
        CreateDeployment {
            truck_id: 1,
            driver_id: 1,
            truck_type: None,
            helper_count: 2,
            sacks_count: 100,
            load_weight_kg: None,
            pickup_site: pickup_site.into(),
            destination: destination.into(),
        }
    }

    #[test]
    fn whitespace_only_sites_are_rejected() {
        let request = create_request("   ", "Port Area");
        assert!(request.validate().is_ok());
        assert!(matches!(request.normalized(), Err(AppError::Validation(_))));

        let update = UpdateDeployment {
            destination: Some(" \t ".into()),
            ..UpdateDeployment::default()
        };
        assert!(matches!(update.normalized(), Err(AppError::Validation(_))));
    }

    #[test]
    fn sites_are_stored_trimmed() {
        let request = create_request("  North Mill ", " Port Area").normalized().unwrap();
        assert_eq!(request.pickup_site, "North Mill");
        assert_eq!(request.destination, "Port Area");
    }

    #[test]
    fn load_weight_can_be_cleared_with_null() {
        let update: UpdateDeployment = serde_json::from_str(r#"{"load_weight_kg": null}"#).unwrap();
        assert_eq!(update.load_weight_kg, Some(None));
        let untouched: UpdateDeployment = serde_json::from_str("{}").unwrap();
        assert_eq!(untouched.load_weight_kg, None);

        let negative: UpdateDeployment = serde_json::from_str(r#"{"load_weight_kg": -1.5}"#).unwrap();
        assert!(negative.normalized().is_err());
    }

    #[test]
    fn helper_count_out_of_range_fails_validation() {
        let mut request = create_request("North Depot", "Harbor Warehouse");
        request.helper_count = 21;
        let errors = request.validate().unwrap_err().to_string();
        assert!(errors.contains("Helper count must be between 0 and 20"));
    }

    #[test]
    fn unknown_status_value_is_rejected_by_the_body_parser() {
        assert!(serde_json::from_str::<UpdateDeployment>(r#"{"status": "archived"}"#).is_err());
    }
}
