//! Authentication and user management service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use validator::Validate;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    lifecycle::account,
    models::{
        activity_log::NewActivityLog,
        enums::{UserRole, UserStatus},
        user::{CreateUser, RegisterUser, UpdateProfile, UpdateUser, User, UserClaims, UserQuery},
        Page,
    },
    repository::{users::NewUser, Repository},
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    config: AuthConfig,
}

impl UsersService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Authenticate by email and password and return a JWT token
    pub async fn authenticate(&self, email: &str, password: &str) -> AppResult<(String, User)> {
        let user = match self.repository.users.get_by_email(email).await? {
            Some(user) => user,
            None => {
                tracing::warn!("Login rejected for unknown email {}", email);
                return Err(AppError::Authentication("Invalid email or password".to_string()));
            }
        };

        if !self.verify_password(&user, password)? {
            tracing::warn!("Login rejected for user {}: wrong password", user.id);
            return Err(AppError::Authentication("Invalid email or password".to_string()));
        }

        if let Err(e) = account::ensure_can_authenticate(user.status) {
            tracing::warn!("Login rejected for user {}: status {}", user.id, user.status);
            return Err(e);
        }

        let mut tx = self.repository.pool.begin().await?;
        let user = self.repository.users.record_login(&mut tx, user.id).await?;
        self.repository
            .activity_logs
            .insert(&mut tx, &NewActivityLog::new(user.id, "Logged in", user.status))
            .await?;
        tx.commit().await?;

        let token = self.create_token_for_user(&user)?;
        Ok((token, user))
    }

    /// Create JWT token for a user
    fn create_token_for_user(&self, user: &User) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let exp = now + (self.config.jwt_expiration_hours as i64 * 3600);

        let claims = UserClaims {
            sub: user.email.clone(),
            user_id: user.id,
            role: user.role,
            exp,
            iat: now,
        };

        claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    fn verify_password(&self, user: &User, password: &str) -> AppResult<bool> {
        let parsed_hash = PasswordHash::new(&user.password)
            .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Hash a password using Argon2
    pub fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
        Ok(hash.to_string())
    }

    /// Visitor self-registration; the account waits for approval
    pub async fn register(&self, data: RegisterUser) -> AppResult<User> {
        data.validate()?;

        if self.repository.users.email_exists(&data.email, None).await? {
            return Err(AppError::Conflict("Email already exists".to_string()));
        }

        let new_user = NewUser {
            first_name: &data.first_name,
            last_name: &data.last_name,
            email: &data.email,
            phone_no: data.phone_no.as_deref(),
            password_hash: self.hash_password(&data.password)?,
            role: UserRole::Visitor,
            status: account::initial_status(true),
        };

        let mut tx = self.repository.pool.begin().await?;
        let user = self.repository.users.create(&mut tx, &new_user).await?;
        self.repository
            .activity_logs
            .insert(&mut tx, &NewActivityLog::new(user.id, "Registered an account", user.status))
            .await?;
        tx.commit().await?;

        tracing::info!("User {} registered, pending approval", user.id);
        Ok(user)
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<User> {
        self.repository.users.get_by_id(id).await
    }

    /// Search users
    pub async fn list(&self, query: &UserQuery) -> AppResult<(Vec<User>, i64, Page)> {
        let page = Page::new(query.page, query.per_page);
        let (users, total) = self.repository.users.list(query, page).await?;
        Ok((users, total, page))
    }

    /// Create an account on behalf of an administrator; it starts active
    pub async fn create_user(&self, actor: &UserClaims, data: CreateUser) -> AppResult<User> {
        data.validate()?;
        account::ensure_can_assign_role(actor.role, data.role)?;

        if self.repository.users.email_exists(&data.email, None).await? {
            return Err(AppError::Conflict("Email already exists".to_string()));
        }

        let new_user = NewUser {
            first_name: &data.first_name,
            last_name: &data.last_name,
            email: &data.email,
            phone_no: data.phone_no.as_deref(),
            password_hash: self.hash_password(&data.password)?,
            role: data.role,
            status: account::initial_status(false),
        };

        let mut tx = self.repository.pool.begin().await?;
        let user = self.repository.users.create(&mut tx, &new_user).await?;
        self.repository
            .activity_logs
            .insert(
                &mut tx,
                &NewActivityLog::new(
                    actor.user_id,
                    format!("Created {} account for {}", user.role, user.email),
                    user.status,
                ),
            )
            .await?;
        tx.commit().await?;

        Ok(user)
    }

    /// Update an existing user
    pub async fn update_user(&self, actor: &UserClaims, id: i32, data: UpdateUser) -> AppResult<User> {
        data.validate()?;

        if let Some(ref email) = data.email {
            if self.repository.users.email_exists(email, Some(id)).await? {
                return Err(AppError::Conflict("Email already exists".to_string()));
            }
        }

        let password = match data.password {
            Some(ref p) => Some(self.hash_password(p)?),
            None => None,
        };

        let mut tx = self.repository.pool.begin().await?;
        let target = self.repository.users.lock(&mut tx, id).await?;
        ensure_can_manage(actor, &target)?;
        if let Some(role) = data.role {
            if role != target.role {
                if actor.user_id == id {
                    return Err(AppError::Validation("You cannot change your own role".to_string()));
                }
                account::ensure_can_assign_role(actor.role, role)?;
            }
        }

        let user = self
            .repository
            .users
            .update(&mut tx, id, &data, password)
            .await?;
        self.repository
            .activity_logs
            .insert(
                &mut tx,
                &NewActivityLog::new(actor.user_id, format!("Updated user {}", user.email), user.status),
            )
            .await?;
        tx.commit().await?;

        Ok(user)
    }

    /// Update the caller's own profile; a new password needs the current one
    pub async fn update_profile(&self, user_id: i32, profile: UpdateProfile) -> AppResult<User> {
        profile.validate()?;

        let mut tx = self.repository.pool.begin().await?;
        let user = self.repository.users.lock(&mut tx, user_id).await?;

        let password = match profile.new_password {
            Some(ref new_password) => {
                let current = profile.current_password.as_deref().ok_or_else(|| {
                    AppError::Validation("Current password is required to set a new one".to_string())
                })?;
                if !self.verify_password(&user, current)? {
                    return Err(AppError::Authentication("Current password is incorrect".to_string()));
                }
                Some(self.hash_password(new_password)?)
            }
            None => None,
        };

        let user = self
            .repository
            .users
            .update_profile(&mut tx, user_id, &profile, password)
            .await?;
        self.repository
            .activity_logs
            .insert(&mut tx, &NewActivityLog::new(user_id, "Updated own profile", user.status))
            .await?;
        tx.commit().await?;

        Ok(user)
    }

    /// Move an account through the approval state machine
    pub async fn change_status(&self, actor: &UserClaims, id: i32, status: UserStatus) -> AppResult<User> {
        self.apply_status(actor, id, status, |current| account::validate_transition(current, status))
            .await
    }

    /// Soft delete: any live account becomes inactive
    pub async fn delete_user(&self, actor: &UserClaims, id: i32) -> AppResult<()> {
        if actor.user_id == id {
            return Err(AppError::Validation("You cannot delete your own account".to_string()));
        }
        self.apply_status(actor, id, UserStatus::Inactive, account::validate_soft_delete)
            .await?;
        Ok(())
    }

    async fn apply_status(
        &self,
        actor: &UserClaims,
        id: i32,
        status: UserStatus,
        check: impl FnOnce(UserStatus) -> AppResult<()>,
    ) -> AppResult<User> {
        if actor.user_id == id {
            return Err(AppError::Validation(
                "You cannot change your own account status".to_string(),
            ));
        }

        let mut tx = self.repository.pool.begin().await?;
        let target = self.repository.users.lock(&mut tx, id).await?;
        ensure_can_manage(actor, &target)?;
        check(target.status)?;

        let user = self.repository.users.set_status(&mut tx, id, status).await?;
        let action = match (target.status, status) {
            (UserStatus::Pending, UserStatus::Active) => {
                format!("Approved account of {} ({})", user.full_name(), user.email)
            }
            (UserStatus::Pending, UserStatus::Rejected) => {
                format!("Rejected account of {} ({})", user.full_name(), user.email)
            }
            (_, UserStatus::Revoked) => format!("Revoked access of {}", user.email),
            (_, UserStatus::Inactive) => format!("Deactivated account of {}", user.email),
            _ => format!("Reactivated account of {}", user.email),
        };
        self.repository
            .activity_logs
            .insert(&mut tx, &NewActivityLog::new(actor.user_id, action, user.status))
            .await?;
        tx.commit().await?;

        tracing::info!("User {} status {} -> {}", id, target.status, status);
        Ok(user)
    }

    /// Confirm a decoded token still belongs to an active account, with the
    /// account's current role
    pub async fn session(&self, claims: UserClaims) -> AppResult<UserClaims> {
        let user = match self.repository.users.get_by_id(claims.user_id).await {
            Ok(user) => user,
            Err(AppError::NotFound(_)) => {
                return Err(AppError::Authentication("Account no longer exists".to_string()))
            }
            Err(e) => return Err(e),
        };
        account::session_claims(claims, user.status, user.role)
    }

    /// Create the first head admin from configuration when none exists
    pub async fn bootstrap_head_admin(&self) -> AppResult<()> {
        let (Some(email), Some(password)) = (
            self.config.bootstrap_email.as_deref(),
            self.config.bootstrap_password.as_deref(),
        ) else {
            return Ok(());
        };

        if self.repository.users.head_admin_exists().await? {
            return Ok(());
        }

        let new_user = NewUser {
            first_name: "Head",
            last_name: "Administrator",
            email,
            phone_no: None,
            password_hash: self.hash_password(password)?,
            role: UserRole::HeadAdmin,
            status: UserStatus::Active,
        };

        let mut tx = self.repository.pool.begin().await?;
        let user = self.repository.users.create(&mut tx, &new_user).await?;
        tx.commit().await?;

        tracing::info!("Bootstrapped head admin {} ({})", user.id, user.email);
        Ok(())
    }
}

/// Admins may not manage head admin accounts
fn ensure_can_manage(actor: &UserClaims, target: &User) -> AppResult<()> {
    if target.role == UserRole::HeadAdmin && !actor.is_head_admin() {
        return Err(AppError::Authorization(
            "Only a head administrator can manage this account".to_string(),
        ));
    }
    Ok(())
}
