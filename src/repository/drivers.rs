//! Drivers repository for database operations

use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    lifecycle::{AssetCandidate, AssetKind},
    models::{
        analytics::DriverTripEntry,
        driver::{CreateDriver, Driver, DriverQuery, DriverShort, UpdateDriver},
        enums::AssetStatus,
        Page,
    },
};

const LICENSE_TAKEN: &str = "License number already exists";

#[derive(Clone)]
pub struct DriversRepository {
    pool: Pool<Postgres>,
}

impl DriversRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List drivers with filters and pagination
    pub async fn list(&self, query: &DriverQuery, page: Page) -> AppResult<(Vec<Driver>, i64)> {
        let mut conditions = Vec::new();
        let mut idx = 1;

        if !query.include_inactive.unwrap_or(false) {
            conditions.push("is_active = TRUE".to_string());
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
                "(LOWER(first_name || ' ' || last_name) LIKE ${0} OR LOWER(license_no) LIKE ${0} OR phone_no LIKE ${0})",
                idx
            ));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let count_q = format!("SELECT COUNT(*) FROM drivers {}", where_clause);
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_q);
        if let Some(s) = query.status {
            count_builder = count_builder.bind(s);
        }
        if let Some(ref s) = search {
            count_builder = count_builder.bind(s);
        }
        let total = count_builder.fetch_one(&self.pool).await?;

        let select_q = format!(
            "SELECT * FROM drivers {} ORDER BY last_name, first_name LIMIT {} OFFSET {}",
            where_clause,
            page.per_page,
            page.offset()
        );
        let mut builder = sqlx::query_as::<_, Driver>(&select_q);
        if let Some(s) = query.status {
            builder = builder.bind(s);
        }
        if let Some(ref s) = search {
            builder = builder.bind(s);
        }

        let rows = builder.fetch_all(&self.pool).await?;
        Ok((rows, total))
    }

    /// Get driver by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Driver> {
        sqlx::query_as::<_, Driver>("SELECT * FROM drivers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Driver {} not found", id)))
    }

    pub async fn get_short(&self, id: i32) -> AppResult<DriverShort> {
        sqlx::query_as::<_, DriverShort>(
            "SELECT id, first_name, last_name, license_no, status FROM drivers WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Driver {} not found", id)))
    }

    /// Create a driver
    pub async fn create(&self, conn: &mut PgConnection, data: &CreateDriver) -> AppResult<Driver> {
        sqlx::query_as::<_, Driver>(
            r#"
            INSERT INTO drivers (first_name, middle_name, last_name, phone_no, license_no, license_expiry_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(data.first_name.trim())
        .bind(data.middle_name.as_deref().map(str::trim).filter(|m| !m.is_empty()))
        .bind(data.last_name.trim())
        .bind(data.phone_no.trim())
        .bind(data.license_no.trim().to_uppercase())
        .bind(data.license_expiry_date)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| AppError::from_unique_violation(e, LICENSE_TAKEN))
    }

    /// Update a driver
    pub async fn update(&self, conn: &mut PgConnection, id: i32, data: &UpdateDriver) -> AppResult<Driver> {
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

        add_field!(data.first_name, "first_name");
        add_field!(data.middle_name, "middle_name");
        add_field!(data.last_name, "last_name");
        add_field!(data.phone_no, "phone_no");
        add_field!(data.license_no, "license_no");
        add_field!(data.license_expiry_date, "license_expiry_date");
        add_field!(data.status, "status");

        let query = format!(
            "UPDATE drivers SET {} WHERE id = ${} AND is_active = TRUE RETURNING *",
            sets.join(", "),
            idx
        );

        let mut builder = sqlx::query_as::<_, Driver>(&query);

        macro_rules! bind_field {
            ($field:expr) => {
                if let Some(ref val) = $field {
                    builder = builder.bind(val);
                }
            };
        }

        let license_no = data.license_no.as_deref().map(|l| l.trim().to_uppercase());
        bind_field!(data.first_name);
        bind_field!(data.middle_name);
        bind_field!(data.last_name);
        bind_field!(data.phone_no);
        bind_field!(license_no);
        bind_field!(data.license_expiry_date);
        bind_field!(data.status);

        builder
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| AppError::from_unique_violation(e, LICENSE_TAKEN))?
            .ok_or_else(|| AppError::NotFound(format!("Driver {} not found", id)))
    }

    /// Soft delete: mark inactive and unavailable
    pub async fn soft_delete(&self, conn: &mut PgConnection, id: i32) -> AppResult<Driver> {
        sqlx::query_as::<_, Driver>(
            r#"
            UPDATE drivers SET is_active = FALSE, status = 'unavailable', updated_at = NOW()
            WHERE id = $1 AND is_active = TRUE
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Driver {} not found", id)))
    }

    /// Lock a driver row for the rest of the transaction and snapshot it
    pub async fn lock_candidate(&self, conn: &mut PgConnection, id: i32) -> AppResult<AssetCandidate> {
        let driver = sqlx::query_as::<_, Driver>("SELECT * FROM drivers WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Driver {} not found", id)))?;

        Ok(AssetCandidate {
            kind: AssetKind::Driver,
            id: driver.id,
            label: format!("{} {}", driver.first_name, driver.last_name),
            status: driver.status,
            is_active: driver.is_active,
            truck_type: None,
        })
    }

    /// Move an available driver to `deployed`. Returns false when they were
    /// no longer available at write time.
    pub async fn claim(&self, conn: &mut PgConnection, id: i32) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE drivers SET status = 'deployed', updated_at = NOW()
            WHERE id = $1 AND status = 'available' AND is_active = TRUE
            "#,
        )
        .bind(id)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn set_status(&self, conn: &mut PgConnection, id: i32, status: AssetStatus) -> AppResult<()> {
        sqlx::query("UPDATE drivers SET status = $1, updated_at = NOW() WHERE id = $2")
            .bind(status)
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    /// Credit one completed trip
    pub async fn increment_trip_count(&self, conn: &mut PgConnection, id: i32) -> AppResult<()> {
        sqlx::query("UPDATE drivers SET trip_count = trip_count + 1, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    /// Active drivers grouped by status
    pub async fn count_by_status(&self) -> AppResult<Vec<(AssetStatus, i64)>> {
        let rows = sqlx::query_as::<_, (AssetStatus, i64)>(
            "SELECT status, COUNT(*) FROM drivers WHERE is_active = TRUE GROUP BY status",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Drivers with the most completed trips
    pub async fn top_by_trips(&self, limit: i64) -> AppResult<Vec<DriverTripEntry>> {
        let rows = sqlx::query_as::<_, (i32, String, i32)>(
            r#"
            SELECT id, first_name || ' ' || last_name, trip_count
            FROM drivers
            WHERE is_active = TRUE AND trip_count > 0
            ORDER BY trip_count DESC, last_name
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(driver_id, name, trip_count)| DriverTripEntry {
                driver_id,
                name,
                trip_count,
            })
            .collect())
    }
}
