//! Deployments repository for database operations

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgConnection, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        deployment::{
            CalendarEvent, CreateDeployment, Deployment, DeploymentQuery, DeploymentRow,
            DeploymentSummary,
        },
        enums::{DeploymentStatus, TruckType},
        Page,
    },
};

const SUMMARY_SELECT: &str = r#"
    SELECT d.id, d.deployment_code, d.status,
           COALESCE(d.replacement_truck_type, d.truck_type) AS truck_type,
           d.pickup_site, d.destination, d.sacks_count,
           COALESCE(rt.plate_no, t.plate_no) AS current_truck_plate,
           COALESCE(rd.first_name || ' ' || rd.last_name, dr.first_name || ' ' || dr.last_name) AS current_driver_name,
           (d.replaced_at IS NOT NULL) AS is_replaced,
           d.departed, d.dest_arrival, d.dest_departure, d.created_at
    FROM deployments d
    JOIN trucks t ON t.id = d.truck_id
    JOIN drivers dr ON dr.id = d.driver_id
    LEFT JOIN trucks rt ON rt.id = d.replacement_truck_id
    LEFT JOIN drivers rd ON rd.id = d.replacement_driver_id
"#;

#[derive(FromRow)]
struct CalendarRow {
    id: i32,
    deployment_code: String,
    destination: String,
    status: DeploymentStatus,
    starts_at: DateTime<Utc>,
    ends_at: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct DeploymentsRepository {
    pool: Pool<Postgres>,
}

impl DeploymentsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get deployment by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Deployment> {
        sqlx::query_as::<_, DeploymentRow>("SELECT * FROM deployments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Deployment::from)
            .ok_or_else(|| AppError::NotFound(format!("Deployment {} not found", id)))
    }

    /// Read a deployment and hold its row lock until the transaction ends
    pub async fn lock(&self, conn: &mut PgConnection, id: i32) -> AppResult<Deployment> {
        sqlx::query_as::<_, DeploymentRow>("SELECT * FROM deployments WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .map(Deployment::from)
            .ok_or_else(|| AppError::NotFound(format!("Deployment {} not found", id)))
    }

    pub async fn code_exists(&self, conn: &mut PgConnection, code: &str) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM deployments WHERE deployment_code = $1)")
                .bind(code)
                .fetch_one(&mut *conn)
                .await?;
        Ok(exists)
    }

    /// Insert a new deployment in `preparing` status
    pub async fn create(
        &self,
        conn: &mut PgConnection,
        code: &str,
        data: &CreateDeployment,
        truck_type: TruckType,
        created_by: i32,
    ) -> AppResult<Deployment> {
        let row = sqlx::query_as::<_, DeploymentRow>(
            r#"
            INSERT INTO deployments (
                deployment_code, truck_id, driver_id, truck_type, helper_count,
                sacks_count, load_weight_kg, pickup_site, destination, status, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'preparing', $10)
            RETURNING *
            "#,
        )
        .bind(code)
        .bind(data.truck_id)
        .bind(data.driver_id)
        .bind(truck_type)
        .bind(data.helper_count)
        .bind(data.sacks_count)
        .bind(data.load_weight_kg)
        .bind(data.pickup_site.trim())
        .bind(data.destination.trim())
        .bind(created_by)
        .fetch_one(&mut *conn)
        .await
        .map_err(map_assignment_violation)?;

        Ok(row.into())
    }

    /// Persist every mutable column of a deployment
    pub async fn save(&self, conn: &mut PgConnection, d: &Deployment) -> AppResult<Deployment> {
        let replacement = d.replacement.as_ref();
        let row = sqlx::query_as::<_, DeploymentRow>(
            r#"
            UPDATE deployments SET
                truck_type = $2, helper_count = $3, sacks_count = $4, load_weight_kg = $5,
                pickup_site = $6, destination = $7, status = $8,
                departed = $9, pickup_in = $10, pickup_out = $11, dest_arrival = $12, dest_departure = $13,
                replacement_truck_id = $14, replacement_driver_id = $15, replacement_truck_type = $16,
                replacement_helper_count = $17, replaced_at = $18, replacement_reason = $19,
                replacement_remarks = $20, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(d.id)
        .bind(d.truck_type)
        .bind(d.helper_count)
        .bind(d.sacks_count)
        .bind(d.load_weight_kg)
        .bind(&d.pickup_site)
        .bind(&d.destination)
        .bind(d.status)
        .bind(d.timeline.departed)
        .bind(d.timeline.pickup_in)
        .bind(d.timeline.pickup_out)
        .bind(d.timeline.dest_arrival)
        .bind(d.timeline.dest_departure)
        .bind(replacement.and_then(|r| r.truck_id))
        .bind(replacement.and_then(|r| r.driver_id))
        .bind(replacement.and_then(|r| r.truck_type))
        .bind(replacement.and_then(|r| r.helper_count))
        .bind(replacement.map(|r| r.replaced_at))
        .bind(replacement.map(|r| r.reason))
        .bind(replacement.and_then(|r| r.remarks.clone()))
        .fetch_optional(&mut *conn)
        .await
        .map_err(map_assignment_violation)?
        .ok_or_else(|| AppError::NotFound(format!("Deployment {} not found", d.id)))?;

        Ok(row.into())
    }

    /// List deployments with filters, sorting and pagination
    pub async fn list(
        &self,
        query: &DeploymentQuery,
        assigned_date: Option<NaiveDate>,
        departed_date: Option<NaiveDate>,
        page: Page,
    ) -> AppResult<(Vec<DeploymentSummary>, i64)> {
        let mut conditions = Vec::new();
        let mut idx = 1;

        if query.status.is_some() {
            conditions.push(format!("d.status = ${}", idx));
            idx += 1;
        }
        if assigned_date.is_some() {
            conditions.push(format!("(d.created_at AT TIME ZONE 'UTC')::date = ${}", idx));
            idx += 1;
        }
        if departed_date.is_some() {
            conditions.push(format!("(d.departed AT TIME ZONE 'UTC')::date = ${}", idx));
            idx += 1;
        }
        let search = query
            .search
            .as_ref()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s.to_lowercase()));
        if search.is_some() {
            conditions.push(format!(
                r#"(LOWER(d.deployment_code) LIKE ${0}
                    OR LOWER(d.pickup_site) LIKE ${0}
                    OR LOWER(d.destination) LIKE ${0}
                    OR LOWER(COALESCE(rt.plate_no, t.plate_no)) LIKE ${0}
                    OR LOWER(dr.first_name || ' ' || dr.last_name) LIKE ${0}
                    OR LOWER(COALESCE(rd.first_name || ' ' || rd.last_name, '')) LIKE ${0})"#,
                idx
            ));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let count_q = format!(
            r#"
            SELECT COUNT(*)
            FROM deployments d
            JOIN trucks t ON t.id = d.truck_id
            JOIN drivers dr ON dr.id = d.driver_id
            LEFT JOIN trucks rt ON rt.id = d.replacement_truck_id
            LEFT JOIN drivers rd ON rd.id = d.replacement_driver_id
            {}
            "#,
            where_clause
        );
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_q);
        if let Some(s) = query.status {
            count_builder = count_builder.bind(s);
        }
        if let Some(date) = assigned_date {
            count_builder = count_builder.bind(date);
        }
        if let Some(date) = departed_date {
            count_builder = count_builder.bind(date);
        }
        if let Some(ref s) = search {
            count_builder = count_builder.bind(s);
        }
        let total = count_builder.fetch_one(&self.pool).await?;

        let order = query.sort.unwrap_or_default().as_sql();
        let select_q = format!(
            "{} {} ORDER BY d.created_at {}, d.id {} LIMIT {} OFFSET {}",
            SUMMARY_SELECT,
            where_clause,
            order,
            order,
            page.per_page,
            page.offset()
        );
        let mut builder = sqlx::query_as::<_, DeploymentSummary>(&select_q);
        if let Some(s) = query.status {
            builder = builder.bind(s);
        }
        if let Some(date) = assigned_date {
            builder = builder.bind(date);
        }
        if let Some(date) = departed_date {
            builder = builder.bind(date);
        }
        if let Some(ref s) = search {
            builder = builder.bind(s);
        }

        let rows = builder.fetch_all(&self.pool).await?;
        Ok((rows, total))
    }

    /// Deployments whose departure (or creation, if not departed) falls in the range
    pub async fn calendar(&self, start: NaiveDate, end: NaiveDate) -> AppResult<Vec<CalendarEvent>> {
        let rows = sqlx::query_as::<_, CalendarRow>(
            r#"
            SELECT id, deployment_code, destination, status,
                   COALESCE(departed, created_at) AS starts_at,
                   dest_departure AS ends_at
            FROM deployments
            WHERE (COALESCE(departed, created_at) AT TIME ZONE 'UTC')::date BETWEEN $1 AND $2
            ORDER BY starts_at
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| CalendarEvent {
                deployment_id: row.id,
                title: format!("{} to {}", row.deployment_code, row.destination),
                status: row.status,
                start: row.starts_at,
                end: row.ends_at,
            })
            .collect())
    }
}

/// The partial unique indexes on active trucks and drivers back up the
/// row-lock availability checks.
fn map_assignment_violation(err: sqlx::Error) -> AppError {
    if let Some(db) = err.as_database_error() {
        if db.code().as_deref() == Some("23505") {
            return match db.constraint() {
                Some("deployments_active_truck") => {
                    AppError::NotAvailable("Truck is already on an active deployment".to_string())
                }
                Some("deployments_active_driver") => {
                    AppError::NotAvailable("Driver is already on an active deployment".to_string())
                }
                _ => AppError::Conflict("Deployment code already exists".to_string()),
            };
        }
    }
    AppError::Database(err)
}
