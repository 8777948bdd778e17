//! Shared domain enums stored as text columns

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Declares a text-backed enum with `as_str`, `FromStr`, `Display` and SQLx
/// conversions so it can be bound to and decoded from `TEXT` columns.
macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $text)] $variant ),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $text ),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $( $text => Ok($name::$variant), )+
                    _ => Err(format!("Invalid {}: {}", stringify!($name), s)),
                }
            }
        }

        impl sqlx::Type<sqlx::Postgres> for $name {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <String as sqlx::Type<sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
                <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
            }
        }

        impl<'r> sqlx::Decode<'r, sqlx::Postgres> for $name {
            fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
                let s: &str = sqlx::Decode::<sqlx::Postgres>::decode(value)?;
                s.parse().map_err(|e: String| e.into())
            }
        }

        impl sqlx::Encode<'_, sqlx::Postgres> for $name {
            fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
                <&str as sqlx::Encode<sqlx::Postgres>>::encode(self.as_str(), buf)
            }
        }
    };
}

text_enum! {
    /// Deployment lifecycle state
    pub enum DeploymentStatus {
        Preparing => "preparing",
        Ongoing => "ongoing",
        Completed => "completed",
        Canceled => "canceled",
    }
}

text_enum! {
    /// Assignment state shared by trucks and drivers
    pub enum AssetStatus {
        Available => "available",
        Deployed => "deployed",
        Unavailable => "unavailable",
    }
}

text_enum! {
    /// Mechanical condition of a truck
    pub enum TruckCondition {
        Good => "good",
        MaintenanceRequired => "maintenance_required",
        UnderMaintenance => "under_maintenance",
    }
}

text_enum! {
    /// Truck body type
    pub enum TruckType {
        SixWheeler => "six_wheeler",
        TenWheeler => "ten_wheeler",
        TwelveWheeler => "twelve_wheeler",
        WingVan => "wing_van",
        Trailer => "trailer",
        Other => "other",
    }
}

text_enum! {
    /// Why a truck or driver was swapped mid-run
    pub enum ReplacementReason {
        DriverIssue => "driver_issue",
        MechanicalIssue => "mechanical_issue",
        Accident => "accident",
        Other => "other",
    }
}

text_enum! {
    /// Back-office role
    pub enum UserRole {
        Visitor => "visitor",
        Admin => "admin",
        HeadAdmin => "head_admin",
    }
}

text_enum! {
    /// Account approval state
    pub enum UserStatus {
        Pending => "pending",
        Active => "active",
        Inactive => "inactive",
        Rejected => "rejected",
        Revoked => "revoked",
    }
}

impl Default for DeploymentStatus {
    fn default() -> Self {
        DeploymentStatus::Preparing
    }
}

impl Default for AssetStatus {
    fn default() -> Self {
        AssetStatus::Available
    }
}

impl Default for TruckCondition {
    fn default() -> Self {
        TruckCondition::Good
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("ONGOING".parse::<DeploymentStatus>(), Ok(DeploymentStatus::Ongoing));
        assert_eq!(" head_admin ".parse::<UserRole>(), Ok(UserRole::HeadAdmin));
        assert!("archived".parse::<DeploymentStatus>().is_err());
    }

    #[test]
    fn serde_uses_snake_case_text() {
        let json = serde_json::to_string(&ReplacementReason::MechanicalIssue).unwrap();
        assert_eq!(json, "\"mechanical_issue\"");
        let parsed: TruckCondition = serde_json::from_str("\"under_maintenance\"").unwrap();
        assert_eq!(parsed, TruckCondition::UnderMaintenance);
    }

    #[test]
    fn display_matches_stored_text() {
        for status in AssetStatus::ALL {
            assert_eq!(status.to_string().parse::<AssetStatus>(), Ok(*status));
        }
    }
}
