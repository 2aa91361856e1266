use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use investwise_core::marketdata::yahoo::YahooRapidApiClient;
use investwise_core::storage::securities::PgSecurityStore;
use investwise_core::sync::refresh::{refresh_all, refresh_one, RefreshOutcome, RefreshSummary};

mod seed;

#[derive(Debug, Parser)]
#[command(name = "investwise_worker")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Recompute price-change momentum for stored securities from recent
    /// candle history. Runs sequentially to respect provider rate limits.
    Refresh {
        /// Refresh a single symbol instead of the full universe.
        #[arg(long)]
        symbol: Option<String>,

        /// Do everything except connecting to the database.
        #[arg(long)]
        dry_run: bool,
    },
    /// Upsert the sample security universe.
    Seed,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = investwise_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    match args.command {
        Command::Refresh { symbol, dry_run } => run_refresh(&settings, symbol, dry_run).await,
        Command::Seed => run_seed(&settings).await,
    }
}

async fn run_refresh(
    settings: &investwise_core::config::Settings,
    symbol: Option<String>,
    dry_run: bool,
) -> anyhow::Result<()> {
    if dry_run {
        tracing::info!(?symbol, dry_run = true, "momentum refresh (dry-run)");
        return Ok(());
    }

    let db_url = settings.require_database_url()?;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(db_url)
        .await
        .context("connect DATABASE_URL failed")?;

    investwise_core::storage::migrate(&pool).await?;

    let acquired = investwise_core::storage::lock::try_acquire_refresh_lock(&pool).await?;
    if !acquired {
        tracing::warn!("refresh lock not acquired; another run in progress");
        return Ok(());
    }

    let history = YahooRapidApiClient::from_settings(settings)?;
    let store = PgSecurityStore::new(pool.clone());
    let started_at = chrono::Utc::now();

    let result = match symbol.as_deref() {
        Some(symbol) => refresh_one(&store, &history, symbol).await.map(|outcome| {
            let mut summary = RefreshSummary::default();
            match outcome {
                RefreshOutcome::Updated => summary.updated = 1,
                RefreshOutcome::Skipped => summary.skipped = 1,
            }
            summary
        }),
        None => refresh_all(&store, &history).await,
    };

    match result {
        Ok(summary) => {
            let run_id = investwise_core::storage::refresh_runs::record_refresh_run(
                &pool, started_at, &summary, "success", None,
            )
            .await?;
            tracing::info!(
                %run_id,
                updated = summary.updated,
                skipped = summary.skipped,
                failed = summary.failed,
                "recorded momentum refresh run"
            );
        }
        Err(err) => {
            sentry_anyhow::capture_anyhow(&err);
            let summary = RefreshSummary::default();
            let run_id = investwise_core::storage::refresh_runs::record_refresh_run(
                &pool,
                started_at,
                &summary,
                "error",
                Some(&format!("{err:#}")),
            )
            .await?;
            tracing::error!(%run_id, error = %err, "momentum refresh run failed");
        }
    }

    let _ = investwise_core::storage::lock::release_refresh_lock(&pool).await;
    Ok(())
}

async fn run_seed(settings: &investwise_core::config::Settings) -> anyhow::Result<()> {
    let db_url = settings.require_database_url()?;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(db_url)
        .await
        .context("connect DATABASE_URL failed")?;

    investwise_core::storage::migrate(&pool).await?;

    let upserted = seed::seed_sample_securities(&pool).await?;
    tracing::info!(upserted, "seeded sample securities");
    Ok(())
}

fn init_sentry(settings: &investwise_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
