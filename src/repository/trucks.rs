//! Trucks repository for database operations

use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    lifecycle::{AssetCandidate, AssetKind},
    models::{
        enums::AssetStatus,
        truck::{normalize_plate, CreateTruck, Truck, TruckQuery, TruckShort, UpdateTruck},
        Page,
    },
};

#[derive(Clone)]
pub struct TrucksRepository {
    pool: Pool<Postgres>,
}

impl TrucksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List trucks with filters and pagination
    pub async fn list(&self, query: &TruckQuery, page: Page) -> AppResult<(Vec<Truck>, i64)> {
        let mut conditions = Vec::new();
        let mut idx = 1;

        if !query.include_inactive.unwrap_or(false) {
            conditions.push("is_active = TRUE".to_string());
        }
        if query.status.is_some() {
            conditions.push(format!("status = ${}", idx));
            idx += 1;
        }
        if query.truck_type.is_some() {
            conditions.push(format!("truck_type = ${}", idx));
            idx += 1;
        }
        if query.condition.is_some() {
            conditions.push(format!("condition = ${}", idx));
            idx += 1;
        }
        let search = query.search.as_ref().map(|s| format!("%{}%", s.trim()));
        if search.is_some() {
            conditions.push(format!("plate_no ILIKE ${}", idx));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let count_q = format!("SELECT COUNT(*) FROM trucks {}", where_clause);
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_q);
        if let Some(s) = query.status { count_builder = count_builder.bind(s); }
        if let Some(t) = query.truck_type { count_builder = count_builder.bind(t); }
        if let Some(c) = query.condition { count_builder = count_builder.bind(c); }
        if let Some(ref s) = search { count_builder = count_builder.bind(s); }
        let total = count_builder.fetch_one(&self.pool).await?;

        let select_q = format!(
            "SELECT * FROM trucks {} ORDER BY plate_no LIMIT {} OFFSET {}",
            where_clause,
            page.per_page,
            page.offset()
        );
        let mut builder = sqlx::query_as::<_, Truck>(&select_q);
        if let Some(s) = query.status { builder = builder.bind(s); }
        if let Some(t) = query.truck_type { builder = builder.bind(t); }
        if let Some(c) = query.condition { builder = builder.bind(c); }
        if let Some(ref s) = search { builder = builder.bind(s); }

        let rows = builder.fetch_all(&self.pool).await?;
        Ok((rows, total))
    }

    /// Get truck by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Truck> {
        sqlx::query_as::<_, Truck>("SELECT * FROM trucks WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Truck {} not found", id)))
    }

    /// Short representation, including soft-deleted trucks referenced by history
    pub async fn get_short(&self, id: i32) -> AppResult<TruckShort> {
        sqlx::query_as::<_, TruckShort>(
            "SELECT id, plate_no, truck_type, status FROM trucks WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Truck {} not found", id)))
    }

    /// Check whether a plate number is already used by another truck
    pub async fn plate_exists(&self, plate_no: &str, exclude_id: Option<i32>) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM trucks WHERE plate_no = $1 AND ($2::INT IS NULL OR id <> $2))",
        )
        .bind(normalize_plate(plate_no))
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Create a truck
    pub async fn create(&self, conn: &mut PgConnection, data: &CreateTruck) -> AppResult<Truck> {
        sqlx::query_as::<_, Truck>(
            r#"
            INSERT INTO trucks (plate_no, truck_type, condition, image_url)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(normalize_plate(&data.plate_no))
        .bind(data.truck_type)
        .bind(data.condition.unwrap_or_default())
        .bind(&data.image_url)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| AppError::from_unique_violation(e, "Plate number already exists"))
    }

    /// Update a truck
    pub async fn update(&self, conn: &mut PgConnection, id: i32, data: &UpdateTruck) -> AppResult<Truck> {
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

        add_field!(data.plate_no, "plate_no");
        add_field!(data.truck_type, "truck_type");
        add_field!(data.status, "status");
        add_field!(data.condition, "condition");
        add_field!(data.image_url, "image_url");

        let query = format!(
            "UPDATE trucks SET {} WHERE id = ${} AND is_active = TRUE RETURNING *",
            sets.join(", "),
            idx
        );

        let mut builder = sqlx::query_as::<_, Truck>(&query);

        macro_rules! bind_field {
            ($field:expr) => {
                if let Some(ref val) = $field {
                    builder = builder.bind(val);
                }
            };
        }

        let plate = data.plate_no.as_deref().map(normalize_plate);
        bind_field!(plate);
        bind_field!(data.truck_type);
        bind_field!(data.status);
        bind_field!(data.condition);
        bind_field!(data.image_url);

        builder
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| AppError::from_unique_violation(e, "Plate number already exists"))?
            .ok_or_else(|| AppError::NotFound(format!("Truck {} not found", id)))
    }

    /// Soft delete: mark inactive and unavailable
    pub async fn soft_delete(&self, conn: &mut PgConnection, id: i32) -> AppResult<Truck> {
        sqlx::query_as::<_, Truck>(
            r#"
            UPDATE trucks SET is_active = FALSE, status = 'unavailable', updated_at = NOW()
            WHERE id = $1 AND is_active = TRUE
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Truck {} not found", id)))
    }

    /// Lock a truck row for the rest of the transaction and snapshot it
    pub async fn lock_candidate(&self, conn: &mut PgConnection, id: i32) -> AppResult<AssetCandidate> {
        let truck = sqlx::query_as::<_, Truck>("SELECT * FROM trucks WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Truck {} not found", id)))?;

        Ok(AssetCandidate {
            kind: AssetKind::Truck,
            id: truck.id,
            label: truck.plate_no,
            status: truck.status,
            is_active: truck.is_active,
            truck_type: Some(truck.truck_type),
        })
    }

    /// Move an available truck to `deployed`. Returns false when it was no
    /// longer available at write time.
    pub async fn claim(&self, conn: &mut PgConnection, id: i32) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE trucks SET status = 'deployed', updated_at = NOW()
            WHERE id = $1 AND status = 'available' AND is_active = TRUE
            "#,
        )
        .bind(id)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Set the assignment status of a truck
    pub async fn set_status(&self, conn: &mut PgConnection, id: i32, status: AssetStatus) -> AppResult<()> {
        sqlx::query("UPDATE trucks SET status = $1, updated_at = NOW() WHERE id = $2")
            .bind(status)
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    /// Active trucks grouped by status
    pub async fn count_by_status(&self) -> AppResult<Vec<(AssetStatus, i64)>> {
        let rows = sqlx::query_as::<_, (AssetStatus, i64)>(
            "SELECT status, COUNT(*) FROM trucks WHERE is_active = TRUE GROUP BY status",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
