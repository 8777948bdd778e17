//! Deployment status transitions.
//!
//! Transition rules:
//! - `preparing` -> `ongoing`, `completed`, `canceled`
//! - `ongoing`   -> `completed`, `canceled`
//! - `completed`, `canceled` are terminal
//!
//! Writing the current status again is accepted and has no effect, which is
//! what makes terminal side effects apply exactly once.

use crate::{
    error::{AppError, AppResult},
    models::enums::DeploymentStatus,
};

impl DeploymentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DeploymentStatus::Completed | DeploymentStatus::Canceled)
    }
}

/// Returns the statuses that `from` may move to.
pub fn valid_transitions(from: DeploymentStatus) -> &'static [DeploymentStatus] {
    use DeploymentStatus::*;
    match from {
        Preparing => &[Ongoing, Completed, Canceled],
        Ongoing => &[Completed, Canceled],
        Completed | Canceled => &[],
    }
}

/// Validate a move from `current` to `next`. Same-status writes are allowed.
pub fn validate_transition(current: DeploymentStatus, next: DeploymentStatus) -> AppResult<()> {
    if current == next || valid_transitions(current).contains(&next) {
        return Ok(());
    }
    let allowed: Vec<&str> = valid_transitions(current).iter().map(|s| s.as_str()).collect();
    Err(AppError::InvalidTransition(format!(
        "Cannot move deployment from '{}' to '{}'. Allowed: [{}]",
        current,
        next,
        allowed.join(", ")
    )))
}

/// Side effects a status change has on the assigned truck and driver
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusEffects {
    /// Set the current truck and driver back to `available`
    pub release_assets: bool,
    /// Add one trip to the current driver
    pub increment_trip_count: bool,
}

impl StatusEffects {
    pub fn is_noop(&self) -> bool {
        !self.release_assets && !self.increment_trip_count
    }
}

/// Validate a status change and work out its side effects.
pub fn plan_status_change(
    current: DeploymentStatus,
    next: DeploymentStatus,
) -> AppResult<StatusEffects> {
    validate_transition(current, next)?;
    if current == next {
        return Ok(StatusEffects::default());
    }
    Ok(match next {
        DeploymentStatus::Completed => StatusEffects {
            release_assets: true,
            increment_trip_count: true,
        },
        DeploymentStatus::Canceled => StatusEffects {
            release_assets: true,
            increment_trip_count: false,
        },
        DeploymentStatus::Preparing | DeploymentStatus::Ongoing => StatusEffects::default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use DeploymentStatus::*;

    #[test]
    fn forward_moves_are_allowed() {
        assert!(validate_transition(Preparing, Ongoing).is_ok());
        assert!(validate_transition(Ongoing, Completed).is_ok());
        assert!(validate_transition(Preparing, Completed).is_ok());
    }

    #[test]
    fn any_non_terminal_state_can_cancel() {
        assert!(validate_transition(Preparing, Canceled).is_ok());
        assert!(validate_transition(Ongoing, Canceled).is_ok());
    }

    #[test]
    fn backward_and_terminal_moves_are_rejected() {
        let rejected = [
            (Ongoing, Preparing),
            (Completed, Ongoing),
            (Completed, Preparing),
            (Completed, Canceled),
            (Canceled, Ongoing),
            (Canceled, Completed),
        ];
        for (from, to) in rejected {
            match validate_transition(from, to) {
                Err(AppError::InvalidTransition(_)) => {}
                other => panic!("{} -> {} should be rejected, got {:?}", from, to, other),
            }
        }
    }

    #[test]
    fn every_pair_follows_the_table() {
        for from in DeploymentStatus::ALL {
            for to in DeploymentStatus::ALL {
                let expected = from == to || valid_transitions(*from).contains(to);
                assert_eq!(validate_transition(*from, *to).is_ok(), expected, "{} -> {}", from, to);
            }
        }
    }

    #[test]
    fn completion_releases_and_counts_a_trip() {
        let effects = plan_status_change(Ongoing, Completed).unwrap();
        assert!(effects.release_assets);
        assert!(effects.increment_trip_count);
    }

    #[test]
    fn cancellation_releases_without_counting() {
        let effects = plan_status_change(Preparing, Canceled).unwrap();
        assert!(effects.release_assets);
        assert!(!effects.increment_trip_count);
    }

    #[test]
    fn repeated_terminal_write_has_no_effect() {
        // First write applies the effects, the repeat finds the deployment already completed.
        let first = plan_status_change(Ongoing, Completed).unwrap();
        let second = plan_status_change(Completed, Completed).unwrap();
        let trips = [first, second].iter().filter(|e| e.increment_trip_count).count();
        assert_eq!(trips, 1);
        assert!(second.is_noop());
        assert!(plan_status_change(Canceled, Canceled).unwrap().is_noop());
    }

    #[test]
    fn starting_a_run_has_no_asset_effects() {
        assert!(plan_status_change(Preparing, Ongoing).unwrap().is_noop());
    }
}
