pub mod lock;
pub mod refresh_runs;
pub mod securities;

use crate::domain::security::{RiskBucket, SecurityRecord};
use crate::momentum::{MomentumLabel, SeriesChanges};
use crate::risk::selection::SelectionQuery;
use anyhow::Context;

pub async fn migrate(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("sqlx migrations failed")?;
    Ok(())
}

/// Merge-update produced by the quote reconciliation. Carries only the
/// fields that path owns; everything else in the row is left untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteSyncUpdate {
    /// Bare, uppercased symbol (store identity, not the provider form).
    pub symbol: String,
    pub name: String,
    pub exchange: String,
    pub risk_bucket: RiskBucket,
    pub current_price: Option<f64>,
    pub change_1d: Option<f64>,
    /// 52-week change from the quote provider, persisted into the store's
    /// `change_1m` column as a long-term proxy. Distinct from the history
    /// job's true 1-month change; nothing converts one into the other.
    pub change_long_term: Option<f64>,
    pub momentum: MomentumLabel,
    pub pe_ratio: Option<f64>,
    pub price_to_book: Option<f64>,
    pub market_cap: Option<f64>,
}

/// Persistent-store capability consumed by the selection and sync paths.
/// Each write is a single independently-atomic statement per symbol;
/// concurrent writers race with last-writer-wins field semantics.
#[async_trait::async_trait]
pub trait SecurityStore: Send + Sync {
    async fn find_securities(
        &self,
        query: &SelectionQuery,
        limit: i64,
    ) -> anyhow::Result<Vec<SecurityRecord>>;

    /// Insert-if-absent, else update only the quote-owned fields. Always
    /// clears `change_1w` (the quote provider cannot supply it, so a stale
    /// history value must not survive); never touches sector, beta,
    /// dividend_yield, debt_to_equity or profit_margin on update. Returns
    /// the post-upsert record.
    async fn upsert_from_quote(
        &self,
        update: &QuoteSyncUpdate,
    ) -> anyhow::Result<SecurityRecord>;

    /// Merge-update of price/change fields plus `last_updated` for an
    /// already-stored symbol. No row is created if the symbol is absent.
    async fn apply_series_changes(
        &self,
        symbol: &str,
        changes: &SeriesChanges,
    ) -> anyhow::Result<()>;

    async fn list_symbols(&self) -> anyhow::Result<Vec<String>>;
}
