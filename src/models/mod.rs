//! Data models for Freightdesk

pub mod activity_log;
pub mod analytics;
pub mod deployment;
pub mod driver;
pub mod enums;
pub mod timeline_log;
pub mod truck;
pub mod user;

// Re-export commonly used types
pub use deployment::{Deployment, DeploymentDetails, DeploymentSummary, Replacement, Timeline};
pub use driver::{Driver, DriverShort};
pub use enums::{
    AssetStatus, DeploymentStatus, ReplacementReason, TruckCondition, TruckType, UserRole,
    UserStatus,
};
pub use truck::{Truck, TruckShort};
pub use user::User;

use chrono::NaiveDate;

use crate::error::{AppError, AppResult};

/// Default page size for list endpoints
pub const DEFAULT_PER_PAGE: i64 = 20;
/// Upper bound for `per_page`
pub const MAX_PER_PAGE: i64 = 100;
/// Upper bound for `page`, keeps the OFFSET well inside `i64`
pub const MAX_PAGE: i64 = 1_000_000;

/// Normalized pagination window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: i64,
    pub per_page: i64,
}

impl Page {
    pub fn new(page: Option<i64>, per_page: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).clamp(1, MAX_PAGE),
            per_page: per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.per_page)
    }

    pub fn total_pages(&self, total: i64) -> i64 {
        (total + self.per_page - 1) / self.per_page
    }
}

/// Trim `value` and require at least `min_chars` characters of what is left
pub fn required_text(value: &str, min_chars: usize, message: &str) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.chars().count() < min_chars {
        return Err(AppError::Validation(message.to_string()));
    }
    Ok(trimmed.to_string())
}

/// Parse a `YYYY-MM-DD` query parameter
pub fn parse_date_param(field: &str, value: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        AppError::Validation(format!("{} must be a date in YYYY-MM-DD format", field))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_params_are_strict() {
        assert_eq!(
            parse_date_param("start", "2024-02-29").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert!(parse_date_param("start", "2023-02-29").is_err());
        assert!(parse_date_param("start", "29/02/2024").is_err());
    }

    #[test]
    fn required_text_checks_the_trimmed_value() {
        assert_eq!(required_text("  Depot 4 ", 1, "Pickup site is required").unwrap(), "Depot 4");
        assert!(matches!(
            required_text("   ", 1, "Pickup site is required"),
            Err(AppError::Validation(msg)) if msg == "Pickup site is required"
        ));
        assert!(required_text(" a ", 2, "too short").is_err());
    }

    #[test]
    fn page_defaults_and_bounds() {
        assert_eq!(Page::new(None, None), Page { page: 1, per_page: 20 });
        assert_eq!(Page::new(Some(0), Some(1000)), Page { page: 1, per_page: 100 });
        assert_eq!(Page::new(Some(3), Some(10)).offset(), 20);
    }

    #[test]
    fn huge_page_numbers_are_clamped() {
        let page = Page::new(Some(i64::MAX), Some(100));
        assert_eq!(page.page, MAX_PAGE);
        assert_eq!(page.offset(), (MAX_PAGE - 1) * 100);
        assert!(Page::new(Some(i64::MIN), None).offset() == 0);
    }

    #[test]
    fn total_pages_rounds_up() {
        let page = Page::new(None, Some(20));
        assert_eq!(page.total_pages(0), 0);
        assert_eq!(page.total_pages(20), 1);
        assert_eq!(page.total_pages(21), 2);
    }
}
