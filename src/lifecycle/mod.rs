//! Deployment lifecycle rules.
//!
//! Pure state and validation logic shared by every write path: status
//! transitions and their side effects, milestone gating, unloading time,
//! replacement planning and account approval. Nothing in here touches the
//! database; the services lock rows, call into these functions and persist
//! the resulting plan in one transaction.

pub mod account;
pub mod replacement;
pub mod status;
pub mod timeline;

pub use replacement::{plan_replacement, AssetCandidate, AssetKind, ReplacementPlan};
pub use status::{plan_status_change, StatusEffects};
pub use timeline::{unloading_time, validate_timeline, Milestone};
