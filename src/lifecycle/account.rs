//! Account approval state machine.
//!
//! - `pending`  -> `active` (approved), `rejected`
//! - `active`   -> `revoked`, `inactive`
//! - `inactive` -> `active`
//! - `revoked`  -> `active`
//! - `rejected` is terminal
//!
//! Soft delete sits outside the table: any account that is neither
//! `inactive` nor `rejected` can be deactivated.

use crate::{
    error::{AppError, AppResult},
    models::{
        enums::{UserRole, UserStatus},
        user::UserClaims,
    },
};

pub fn valid_transitions(from: UserStatus) -> &'static [UserStatus] {
    use UserStatus::*;
    match from {
        Pending => &[Active, Rejected],
        Active => &[Revoked, Inactive],
        Inactive => &[Active],
        Revoked => &[Active],
        Rejected => &[],
    }
}

pub fn validate_transition(current: UserStatus, next: UserStatus) -> AppResult<()> {
    if valid_transitions(current).contains(&next) {
        return Ok(());
    }
    Err(AppError::InvalidTransition(format!(
        "Cannot change account status from '{}' to '{}'",
        current, next
    )))
}

/// Status a new account starts in
pub fn initial_status(self_registered: bool) -> UserStatus {
    if self_registered {
        UserStatus::Pending
    } else {
        UserStatus::Active
    }
}

/// Reason a login is refused, or `Ok` for active accounts
pub fn ensure_can_authenticate(status: UserStatus) -> AppResult<()> {
    let message = match status {
        UserStatus::Active => return Ok(()),
        UserStatus::Pending => "Account is pending approval",
        UserStatus::Rejected => "Account registration was rejected",
        UserStatus::Revoked => "Account access has been revoked",
        UserStatus::Inactive => "Account is inactive",
    };
    Err(AppError::Authentication(message.to_string()))
}

/// Soft delete moves an account to `inactive` from any live status
pub fn validate_soft_delete(current: UserStatus) -> AppResult<()> {
    match current {
        UserStatus::Pending | UserStatus::Active | UserStatus::Revoked => Ok(()),
        UserStatus::Inactive => Err(AppError::InvalidTransition(
            "Account is already inactive".to_string(),
        )),
        UserStatus::Rejected => Err(AppError::InvalidTransition(
            "Rejected registrations cannot be deleted".to_string(),
        )),
    }
}

/// Re-check a decoded token against the stored account. The stored role
/// wins over the one baked into the token, so demotions apply immediately.
pub fn session_claims(claims: UserClaims, status: UserStatus, role: UserRole) -> AppResult<UserClaims> {
    ensure_can_authenticate(status)?;
    Ok(UserClaims { role, ..claims })
}

/// Only head admins may hand out or manage the head admin role
pub fn ensure_can_assign_role(actor: UserRole, role: UserRole) -> AppResult<()> {
    match (actor, role) {
        (UserRole::HeadAdmin, _) => Ok(()),
        (UserRole::Admin, UserRole::Admin | UserRole::Visitor) => Ok(()),
        _ => Err(AppError::Authorization(format!(
            "Not allowed to assign the {} role",
            role
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use UserStatus::*;

    fn token_claims(role: UserRole) -> UserClaims {
        UserClaims {
            sub: "dispatch@example.com".into(),
            user_id: 7,
            role,
            exp: 0,
            iat: 0,
        }
    }

    #[test]
    fn revoked_account_token_is_refused() {
        let err = session_claims(token_claims(UserRole::Admin), Revoked, UserRole::Admin).unwrap_err();
        assert!(matches!(err, AppError::Authentication(msg) if msg == "Account access has been revoked"));
        assert!(session_claims(token_claims(UserRole::Admin), Inactive, UserRole::Admin).is_err());
    }

    #[test]
    fn demotion_applies_to_existing_tokens() {
        let claims = session_claims(token_claims(UserRole::Admin), Active, UserRole::Visitor).unwrap();
        assert_eq!(claims.role, UserRole::Visitor);
        assert!(claims.require_admin().is_err());
    }

    #[test]
    fn soft_delete_covers_pending_and_revoked_accounts() {
        assert!(validate_soft_delete(Pending).is_ok());
        assert!(validate_soft_delete(Active).is_ok());
        assert!(validate_soft_delete(Revoked).is_ok());
        assert!(validate_soft_delete(Inactive).is_err());
        assert!(validate_soft_delete(Rejected).is_err());
        // the approval table alone would refuse these
        assert!(validate_transition(Pending, Inactive).is_err());
        assert!(validate_transition(Revoked, Inactive).is_err());
    }

    #[test]
    fn pending_accounts_are_approved_or_rejected() {
        assert!(validate_transition(Pending, Active).is_ok());
        assert!(validate_transition(Pending, Rejected).is_ok());
        assert!(validate_transition(Pending, Revoked).is_err());
    }

    #[test]
    fn rejected_is_terminal() {
        for next in UserStatus::ALL {
            assert!(validate_transition(Rejected, *next).is_err());
        }
    }

    #[test]
    fn revoked_and_inactive_can_be_restored() {
        assert!(validate_transition(Revoked, Active).is_ok());
        assert!(validate_transition(Inactive, Active).is_ok());
        assert!(validate_transition(Active, Pending).is_err());
    }

    #[test]
    fn only_active_accounts_authenticate() {
        assert!(ensure_can_authenticate(Active).is_ok());
        for status in [Pending, Rejected, Revoked, Inactive] {
            assert!(matches!(
                ensure_can_authenticate(status),
                Err(AppError::Authentication(_))
            ));
        }
    }

    #[test]
    fn self_registration_starts_pending() {
        assert_eq!(initial_status(true), Pending);
        assert_eq!(initial_status(false), Active);
    }

    #[test]
    fn admins_cannot_create_head_admins() {
        assert!(ensure_can_assign_role(UserRole::Admin, UserRole::HeadAdmin).is_err());
        assert!(ensure_can_assign_role(UserRole::Admin, UserRole::Admin).is_ok());
        assert!(ensure_can_assign_role(UserRole::HeadAdmin, UserRole::HeadAdmin).is_ok());
        assert!(ensure_can_assign_role(UserRole::Visitor, UserRole::Visitor).is_err());
    }
}
