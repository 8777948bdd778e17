//! Aggregate queries behind the dashboard

use sqlx::{FromRow, Pool, Postgres, Row};

use crate::{
    error::AppResult,
    models::analytics::{DeploymentStats, MonthlyEntry},
};

#[derive(FromRow)]
struct MonthlyRow {
    month: String,
    total: i64,
    completed: i64,
    canceled: i64,
}

#[derive(Clone)]
pub struct AnalyticsRepository {
    pool: Pool<Postgres>,
}

impl AnalyticsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Deployment counters, replacement count and mean unloading time
    pub async fn deployment_stats(&self) -> AppResult<DeploymentStats> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE status = 'preparing') AS preparing,
                COUNT(*) FILTER (WHERE status = 'ongoing') AS ongoing,
                COUNT(*) FILTER (WHERE status = 'completed') AS completed,
                COUNT(*) FILTER (WHERE status = 'canceled') AS canceled,
                COUNT(*) FILTER (WHERE replaced_at IS NOT NULL) AS replaced,
                AVG(ABS(EXTRACT(EPOCH FROM (dest_departure - dest_arrival))) / 60.0)::FLOAT8
                    AS average_unloading_minutes
            FROM deployments
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(DeploymentStats {
            total: row.get("total"),
            preparing: row.get("preparing"),
            ongoing: row.get("ongoing"),
            completed: row.get("completed"),
            canceled: row.get("canceled"),
            replaced: row.get("replaced"),
            average_unloading_minutes: row.get("average_unloading_minutes"),
        })
    }

    /// Deployments created per month over the last `months` months, oldest
    /// first, with empty months included
    pub async fn monthly(&self, months: i32) -> AppResult<Vec<MonthlyEntry>> {
        let rows = sqlx::query_as::<_, MonthlyRow>(
            r#"
            WITH months AS (
                SELECT generate_series(
                    date_trunc('month', NOW() AT TIME ZONE 'UTC') - make_interval(months => $1 - 1),
                    date_trunc('month', NOW() AT TIME ZONE 'UTC'),
                    INTERVAL '1 month'
                ) AS month
            )
            SELECT to_char(m.month, 'YYYY-MM') AS month,
                   COUNT(d.id) AS total,
                   COUNT(d.id) FILTER (WHERE d.status = 'completed') AS completed,
                   COUNT(d.id) FILTER (WHERE d.status = 'canceled') AS canceled
            FROM months m
            LEFT JOIN deployments d
                ON date_trunc('month', d.created_at AT TIME ZONE 'UTC') = m.month
            GROUP BY m.month
            ORDER BY m.month
            "#,
        )
        .bind(months)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| MonthlyEntry {
                month: r.month,
                total: r.total,
                completed: r.completed,
                canceled: r.canceled,
            })
            .collect())
    }
}
