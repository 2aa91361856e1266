use anyhow::Context;

// Advisory locks are scoped to the Postgres session. Used as a best-effort
// guard against overlapping scheduled momentum-refresh runs.
const LOCK_NAMESPACE: i64 = 0x494E_5645_5354; // "INVEST" as hex-ish namespace.
const MOMENTUM_REFRESH_JOB: i64 = 1;

fn refresh_lock_key() -> i64 {
    LOCK_NAMESPACE ^ MOMENTUM_REFRESH_JOB
}

pub async fn try_acquire_refresh_lock(pool: &sqlx::PgPool) -> anyhow::Result<bool> {
    let key = refresh_lock_key();
    let acquired: (bool,) = sqlx::query_as("SELECT pg_try_advisory_lock($1)")
        .persistent(false)
        .bind(key)
        .fetch_one(pool)
        .await
        .with_context(|| format!("failed to acquire advisory lock (key={key})"))?;
    Ok(acquired.0)
}

pub async fn release_refresh_lock(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let key = refresh_lock_key();
    sqlx::query("SELECT pg_advisory_unlock($1)")
        .persistent(false)
        .bind(key)
        .execute(pool)
        .await
        .with_context(|| format!("failed to release advisory lock (key={key})"))?;
    Ok(())
}
