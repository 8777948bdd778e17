//! Driver model and related types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::error::AppResult;

use super::{enums::AssetStatus, required_text};

/// Driver record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Driver {
    pub id: i32,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub phone_no: String,
    pub license_no: String,
    pub license_expiry_date: NaiveDate,
    pub status: AssetStatus,
    /// Completed deployments driven
    pub trip_count: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Short driver representation embedded in deployments
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct DriverShort {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub license_no: String,
    pub status: AssetStatus,
}

impl DriverShort {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Driver query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct DriverQuery {
    pub status: Option<AssetStatus>,
    /// Search in names, phone and license number
    pub search: Option<String>,
    pub include_inactive: Option<bool>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Create driver request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateDriver {
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,
    pub middle_name: Option<String>,
    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,
    #[validate(length(min = 7, max = 20, message = "Phone number must be 7-20 characters"))]
    pub phone_no: String,
    #[validate(length(min = 3, message = "License number is required"))]
    pub license_no: String,
    pub license_expiry_date: NaiveDate,
}

impl CreateDriver {
    /// Trimmed copy; blank names and license numbers are rejected
    pub fn normalized(mut self) -> AppResult<Self> {
        self.first_name = required_text(&self.first_name, 1, "First name is required")?;
        self.last_name = required_text(&self.last_name, 1, "Last name is required")?;
        self.phone_no = required_text(&self.phone_no, 7, "Phone number must be 7-20 characters")?;
        self.license_no = required_text(&self.license_no, 3, "License number is required")?;
        Ok(self)
    }
}

/// Update driver request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateDriver {
    #[validate(length(min = 1, message = "First name cannot be empty"))]
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    #[validate(length(min = 1, message = "Last name cannot be empty"))]
    pub last_name: Option<String>,
    #[validate(length(min = 7, max = 20, message = "Phone number must be 7-20 characters"))]
    pub phone_no: Option<String>,
    #[validate(length(min = 3, message = "License number cannot be empty"))]
    pub license_no: Option<String>,
    pub license_expiry_date: Option<NaiveDate>,
    /// Only `available` and `unavailable` may be set by hand
    pub status: Option<AssetStatus>,
}

impl UpdateDriver {
    pub fn normalized(mut self) -> AppResult<Self> {
        if let Some(ref name) = self.first_name {
            self.first_name = Some(required_text(name, 1, "First name cannot be empty")?);
        }
        if let Some(ref name) = self.last_name {
            self.last_name = Some(required_text(name, 1, "Last name cannot be empty")?);
        }
        if let Some(ref phone) = self.phone_no {
            self.phone_no = Some(required_text(phone, 7, "Phone number must be 7-20 characters")?);
        }
        if let Some(ref license) = self.license_no {
            self.license_no = Some(required_text(license, 3, "License number cannot be empty")?);
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_names_fail_after_trimming() {
        let request = CreateDriver {
            first_name: "  ".into(),
            middle_name: None,
            last_name: "Reyes".into(),
            phone_no: "09171234567".into(),
            license_no: "N01-23-456789".into(),
            license_expiry_date: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
        };
        assert!(request.validate().is_ok());
        assert!(request.normalized().is_err());
    }
}
