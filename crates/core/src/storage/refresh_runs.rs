use crate::sync::refresh::RefreshSummary;
use anyhow::Context;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Audit row for one scheduled refresh run.
pub async fn record_refresh_run(
    pool: &sqlx::PgPool,
    started_at: DateTime<Utc>,
    summary: &RefreshSummary,
    status: &str,
    error: Option<&str>,
) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    let finished_at: DateTime<Utc> = Utc::now();

    sqlx::query(
        "INSERT INTO momentum_refresh_runs \
           (id, started_at, finished_at, updated, skipped, failed, status, error) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .persistent(false)
    .bind(id)
    .bind(started_at)
    .bind(finished_at)
    .bind(summary.updated as i64)
    .bind(summary.skipped as i64)
    .bind(summary.failed as i64)
    .bind(status)
    .bind(error)
    .execute(pool)
    .await
    .context("insert momentum_refresh_runs failed")?;

    Ok(id)
}
