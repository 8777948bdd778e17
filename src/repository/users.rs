//! Users repository for database operations

use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        enums::{UserRole, UserStatus},
        user::{UpdateProfile, UpdateUser, User, UserQuery},
        Page,
    },
};

const EMAIL_TAKEN: &str = "Email already exists";

/// Insert payload with the password already hashed
pub struct NewUser<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
    pub phone_no: Option<&'a str>,
    pub password_hash: String,
    pub role: UserRole,
    pub status: UserStatus,
}

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    /// Get user by email (login identifier)
    pub async fn get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Check if email already exists
    pub async fn email_exists(&self, email: &str, exclude_id: Option<i32>) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1) AND ($2::INT IS NULL OR id <> $2))",
        )
        .bind(email.trim())
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Read a user and hold its row lock until the transaction ends
    pub async fn lock(&self, conn: &mut PgConnection, id: i32) -> AppResult<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    /// Search users with pagination
    pub async fn list(&self, query: &UserQuery, page: Page) -> AppResult<(Vec<User>, i64)> {
        let mut conditions = Vec::new();
        let mut idx = 1;

        if query.role.is_some() {
            conditions.push(format!("role = ${}", idx));
            idx += 1;
        }
        if query.status.is_some() {
            conditions.push(format!("status = ${}", idx));
            idx += 1;
        }
        let search = query
            .search
            .as_ref()
            .map(|s| format!("%{}%", s.trim().to_lowercase()));
        if search.is_some() {
            conditions.push(format!(
                "(LOWER(first_name || ' ' || last_name) LIKE ${0} OR LOWER(email) LIKE ${0})",
                idx
            ));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let count_q = format!("SELECT COUNT(*) FROM users {}", where_clause);
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_q);
        if let Some(r) = query.role {
            count_builder = count_builder.bind(r);
        }
        if let Some(s) = query.status {
            count_builder = count_builder.bind(s);
        }
        if let Some(ref s) = search {
            count_builder = count_builder.bind(s);
        }
        let total = count_builder.fetch_one(&self.pool).await?;

        let select_q = format!(
            "SELECT * FROM users {} ORDER BY last_name, first_name LIMIT {} OFFSET {}",
            where_clause,
            page.per_page,
            page.offset()
        );
        let mut builder = sqlx::query_as::<_, User>(&select_q);
        if let Some(r) = query.role {
            builder = builder.bind(r);
        }
        if let Some(s) = query.status {
            builder = builder.bind(s);
        }
        if let Some(ref s) = search {
            builder = builder.bind(s);
        }

        let users = builder.fetch_all(&self.pool).await?;
        Ok((users, total))
    }

    /// Create a new user
    pub async fn create(&self, conn: &mut PgConnection, user: &NewUser<'_>) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (first_name, last_name, email, phone_no, password, role, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(user.first_name.trim())
        .bind(user.last_name.trim())
        .bind(user.email.trim().to_lowercase())
        .bind(user.phone_no.map(str::trim))
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(user.status)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| AppError::from_unique_violation(e, EMAIL_TAKEN))
    }

    /// Update an existing user
    pub async fn update(
        &self,
        conn: &mut PgConnection,
        id: i32,
        user: &UpdateUser,
        password: Option<String>,
    ) -> AppResult<User> {
        let mut sets = vec!["updated_at = NOW()".to_string()];
        let mut idx = 1;

        macro_rules! add_field {
            ($field:expr, $name:expr) => {
                if $field.is_some() {
                    sets.push(format!("{} = ${}", $name, idx));
                    idx += 1;
                }
            };
        }

        let email = user.email.as_deref().map(|e| e.trim().to_lowercase());
        add_field!(user.first_name, "first_name");
        add_field!(user.last_name, "last_name");
        add_field!(email, "email");
        add_field!(user.phone_no, "phone_no");
        add_field!(user.role, "role");
        add_field!(password, "password");

        let query = format!(
            "UPDATE users SET {} WHERE id = ${} RETURNING *",
            sets.join(", "),
            idx
        );

        let mut builder = sqlx::query_as::<_, User>(&query);

        macro_rules! bind_field {
            ($field:expr) => {
                if let Some(ref val) = $field {
                    builder = builder.bind(val);
                }
            };
        }

        bind_field!(user.first_name);
        bind_field!(user.last_name);
        bind_field!(email);
        bind_field!(user.phone_no);
        bind_field!(user.role);
        bind_field!(password);

        builder
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| AppError::from_unique_violation(e, EMAIL_TAKEN))?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    /// Update user's own profile (names, phone, password)
    pub async fn update_profile(
        &self,
        conn: &mut PgConnection,
        id: i32,
        profile: &UpdateProfile,
        password: Option<String>,
    ) -> AppResult<User> {
        let mut sets = vec!["updated_at = NOW()".to_string()];
        let mut idx = 1;

        macro_rules! add_field {
            ($field:expr, $name:expr) => {
                if $field.is_some() {
                    sets.push(format!("{} = ${}", $name, idx));
                    idx += 1;
                }
            };
        }

        add_field!(profile.first_name, "first_name");
        add_field!(profile.last_name, "last_name");
        add_field!(profile.phone_no, "phone_no");
        add_field!(password, "password");

        let query = format!(
            "UPDATE users SET {} WHERE id = ${} RETURNING *",
            sets.join(", "),
            idx
        );

        let mut builder = sqlx::query_as::<_, User>(&query);

        macro_rules! bind_field {
            ($field:expr) => {
                if let Some(ref val) = $field {
                    builder = builder.bind(val);
                }
            };
        }

        bind_field!(profile.first_name);
        bind_field!(profile.last_name);
        bind_field!(profile.phone_no);
        bind_field!(password);

        builder
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    pub async fn set_status(&self, conn: &mut PgConnection, id: i32, status: UserStatus) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            "UPDATE users SET status = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
        )
        .bind(status)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    /// Bump the login counter and stamp the login time
    pub async fn record_login(&self, conn: &mut PgConnection, id: i32) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET login_count = login_count + 1, last_login = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_one(&mut *conn)
        .await
        .map_err(Into::into)
    }

    pub async fn count_with_status(&self, status: UserStatus) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE status = $1")
            .bind(status)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn head_admin_exists(&self) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE role = 'head_admin')")
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }
}
