//! Timeline logs repository

use chrono::NaiveDate;
use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::AppResult,
    models::{
        timeline_log::{NewTimelineLog, TimelineLogEntry, TimelineLogQuery},
        Page,
    },
};

const ENTRY_SELECT: &str = r#"
    SELECT l.id, l.performed_by, u.first_name || ' ' || u.last_name AS performed_by_name,
           l.target_deployment, d.deployment_code, l.action, l.status, l.timestamp
    FROM timeline_logs l
    JOIN deployments d ON d.id = l.target_deployment
    LEFT JOIN users u ON u.id = l.performed_by
"#;

#[derive(Clone)]
pub struct TimelineLogsRepository {
    pool: Pool<Postgres>,
}

impl TimelineLogsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Append an entry; must run in the transaction of the change it records
    pub async fn insert(&self, conn: &mut PgConnection, entry: &NewTimelineLog) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO timeline_logs (performed_by, target_deployment, action, status)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(entry.performed_by)
        .bind(entry.target_deployment)
        .bind(&entry.action)
        .bind(entry.status)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// Entries of one deployment, oldest first
    pub async fn for_deployment(&self, deployment_id: i32) -> AppResult<Vec<TimelineLogEntry>> {
        let q = format!("{} WHERE l.target_deployment = $1 ORDER BY l.timestamp, l.id", ENTRY_SELECT);
        let rows = sqlx::query_as::<_, TimelineLogEntry>(&q)
            .bind(deployment_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// List entries, newest first
    pub async fn list(
        &self,
        query: &TimelineLogQuery,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        page: Page,
    ) -> AppResult<(Vec<TimelineLogEntry>, i64)> {
        let mut conditions = Vec::new();
        let mut idx = 1;

        if query.deployment_id.is_some() {
            conditions.push(format!("l.target_deployment = ${}", idx));
            idx += 1;
        }
        if query.performed_by.is_some() {
            conditions.push(format!("l.performed_by = ${}", idx));
            idx += 1;
        }
        if start_date.is_some() {
            conditions.push(format!("(l.timestamp AT TIME ZONE 'UTC')::date >= ${}", idx));
            idx += 1;
        }
        if end_date.is_some() {
            conditions.push(format!("(l.timestamp AT TIME ZONE 'UTC')::date <= ${}", idx));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let count_q = format!("SELECT COUNT(*) FROM timeline_logs l {}", where_clause);
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_q);
        if let Some(id) = query.deployment_id {
            count_builder = count_builder.bind(id);
        }
        if let Some(id) = query.performed_by {
            count_builder = count_builder.bind(id);
        }
        if let Some(date) = start_date {
            count_builder = count_builder.bind(date);
        }
        if let Some(date) = end_date {
            count_builder = count_builder.bind(date);
        }
        let total = count_builder.fetch_one(&self.pool).await?;

        let select_q = format!(
            "{} {} ORDER BY l.timestamp DESC, l.id DESC LIMIT {} OFFSET {}",
            ENTRY_SELECT,
            where_clause,
            page.per_page,
            page.offset()
        );
        let mut builder = sqlx::query_as::<_, TimelineLogEntry>(&select_q);
        if let Some(id) = query.deployment_id {
            builder = builder.bind(id);
        }
        if let Some(id) = query.performed_by {
            builder = builder.bind(id);
        }
        if let Some(date) = start_date {
            builder = builder.bind(date);
        }
        if let Some(date) = end_date {
            builder = builder.bind(date);
        }

        let rows = builder.fetch_all(&self.pool).await?;
        Ok((rows, total))
    }
}
