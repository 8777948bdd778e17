//! Truck model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::error::AppResult;

use super::{
    enums::{AssetStatus, TruckCondition, TruckType},
    required_text,
};

/// Truck record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Truck {
    pub id: i32,
    /// Plate number, stored trimmed and uppercase
    pub plate_no: String,
    pub truck_type: TruckType,
    pub status: AssetStatus,
    pub condition: TruckCondition,
    pub image_url: Option<String>,
    /// False once the truck has been soft-deleted
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Short truck representation embedded in deployments
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct TruckShort {
    pub id: i32,
    pub plate_no: String,
    pub truck_type: TruckType,
    pub status: AssetStatus,
}

/// Truck query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct TruckQuery {
    pub status: Option<AssetStatus>,
    pub truck_type: Option<TruckType>,
    pub condition: Option<TruckCondition>,
    /// Search in plate number
    pub search: Option<String>,
    /// Include soft-deleted trucks
    pub include_inactive: Option<bool>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Create truck request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateTruck {
    #[validate(length(min = 2, max = 16, message = "Plate number must be 2-16 characters"))]
    pub plate_no: String,
    pub truck_type: TruckType,
    pub condition: Option<TruckCondition>,
    #[validate(url(message = "Invalid image URL"))]
    pub image_url: Option<String>,
}

/// Update truck request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateTruck {
    #[validate(length(min = 2, max = 16, message = "Plate number must be 2-16 characters"))]
    pub plate_no: Option<String>,
    pub truck_type: Option<TruckType>,
    /// Only `available` and `unavailable` may be set by hand
    pub status: Option<AssetStatus>,
    pub condition: Option<TruckCondition>,
    #[validate(url(message = "Invalid image URL"))]
    pub image_url: Option<String>,
}

const PLATE_MESSAGE: &str = "Plate number must be 2-16 characters";

/// Normalize a plate number for storage and uniqueness checks
pub fn normalize_plate(plate: &str) -> String {
    plate.trim().to_uppercase()
}

impl CreateTruck {
    /// Copy with the plate normalized; the length rule applies to the trimmed plate
    pub fn normalized(mut self) -> AppResult<Self> {
        self.plate_no = normalize_plate(&required_text(&self.plate_no, 2, PLATE_MESSAGE)?);
        Ok(self)
    }
}

impl UpdateTruck {
    pub fn normalized(mut self) -> AppResult<Self> {
        if let Some(ref plate) = self.plate_no {
            self.plate_no = Some(normalize_plate(&required_text(plate, 2, PLATE_MESSAGE)?));
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plate_is_trimmed_and_uppercased() {
        assert_eq!(normalize_plate("  abc-1234 "), "ABC-1234");
    }

    #[test]
    fn padded_single_character_plate_is_rejected() {
        let request = CreateTruck {
            plate_no: "  a ".into(),
            truck_type: TruckType::WingVan,
            condition: None,
            image_url: None,
        };
        assert!(request.validate().is_ok());
        assert!(request.normalized().is_err());

        let update = UpdateTruck {
            plate_no: Some(" ab-12 ".into()),
            truck_type: None,
            status: None,
            condition: None,
            image_url: None,
        };
        assert_eq!(update.normalized().unwrap().plate_no.as_deref(), Some("AB-12"));
    }
}
