use crate::marketdata::HistoryProvider;
use crate::momentum::SeriesChanges;
use crate::storage::SecurityStore;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Updated,
    /// Fewer than 2 candles came back; no store write happened.
    Skipped,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct RefreshSummary {
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Recompute one symbol's price changes from recent candles and merge them
/// into the store. A short series (fewer than 2 points) is not an error; it
/// just performs no update.
pub async fn refresh_one(
    store: &dyn SecurityStore,
    history: &dyn HistoryProvider,
    symbol: &str,
) -> anyhow::Result<RefreshOutcome> {
    let candles = history.fetch_recent_candles(symbol).await?;
    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();

    let Some(changes) = SeriesChanges::from_closes(&closes) else {
        tracing::debug!(symbol, points = closes.len(), "series too short; no update");
        return Ok(RefreshOutcome::Skipped);
    };

    store.apply_series_changes(symbol, &changes).await?;
    tracing::debug!(
        symbol,
        change_1m = changes.change_1m,
        "refreshed momentum changes"
    );
    Ok(RefreshOutcome::Updated)
}

/// Refresh every stored symbol, strictly sequentially: the history provider
/// is rate-limited and this loop is the only throttle. Per-symbol failures
/// are logged and counted, never fatal to the remaining iterations.
pub async fn refresh_all(
    store: &dyn SecurityStore,
    history: &dyn HistoryProvider,
) -> anyhow::Result<RefreshSummary> {
    let symbols = store.list_symbols().await?;
    tracing::info!(count = symbols.len(), "refreshing momentum for stored symbols");

    let mut summary = RefreshSummary::default();
    for symbol in &symbols {
        match refresh_one(store, history, symbol).await {
            Ok(RefreshOutcome::Updated) => summary.updated += 1,
            Ok(RefreshOutcome::Skipped) => summary.skipped += 1,
            Err(err) => {
                summary.failed += 1;
                tracing::warn!(symbol = %symbol, error = %err, "momentum refresh failed for symbol");
            }
        }
    }

    tracing::info!(
        updated = summary.updated,
        skipped = summary.skipped,
        failed = summary.failed,
        "momentum refresh finished"
    );
    Ok(summary)
}
