//! Activity logs repository

use chrono::NaiveDate;
use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::AppResult,
    models::{
        activity_log::{ActivityLogEntry, ActivityLogQuery, NewActivityLog},
        Page,
    },
};

#[derive(Clone)]
pub struct ActivityLogsRepository {
    pool: Pool<Postgres>,
}

impl ActivityLogsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Append an entry; must run in the transaction of the change it records
    pub async fn insert(&self, conn: &mut PgConnection, entry: &NewActivityLog) -> AppResult<()> {
        sqlx::query("INSERT INTO activity_logs (performed_by, action, status) VALUES ($1, $2, $3)")
            .bind(entry.performed_by)
            .bind(&entry.action)
            .bind(&entry.status)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    /// List entries, newest first
    pub async fn list(
        &self,
        query: &ActivityLogQuery,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        page: Page,
    ) -> AppResult<(Vec<ActivityLogEntry>, i64)> {
        let mut conditions = Vec::new();
        let mut idx = 1;

        if query.performed_by.is_some() {
            conditions.push(format!("l.performed_by = ${}", idx));
            idx += 1;
        }
        let search = query
            .search
            .as_ref()
            .map(|s| format!("%{}%", s.trim().to_lowercase()));
        if search.is_some() {
            conditions.push(format!("LOWER(l.action) LIKE ${}", idx));
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

        let count_q = format!("SELECT COUNT(*) FROM activity_logs l {}", where_clause);
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_q);
        if let Some(id) = query.performed_by {
            count_builder = count_builder.bind(id);
        }
        if let Some(ref s) = search {
            count_builder = count_builder.bind(s);
        }
        if let Some(date) = start_date {
            count_builder = count_builder.bind(date);
        }
        if let Some(date) = end_date {
            count_builder = count_builder.bind(date);
        }
        let total = count_builder.fetch_one(&self.pool).await?;

        let select_q = format!(
            r#"
            SELECT l.id, l.performed_by, u.first_name || ' ' || u.last_name AS performed_by_name,
                   l.action, l.status, l.timestamp
            FROM activity_logs l
            LEFT JOIN users u ON u.id = l.performed_by
            {}
            ORDER BY l.timestamp DESC, l.id DESC
            LIMIT {} OFFSET {}
            "#,
            where_clause,
            page.per_page,
            page.offset()
        );
        let mut builder = sqlx::query_as::<_, ActivityLogEntry>(&select_q);
        if let Some(id) = query.performed_by {
            builder = builder.bind(id);
        }
        if let Some(ref s) = search {
            builder = builder.bind(s);
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
