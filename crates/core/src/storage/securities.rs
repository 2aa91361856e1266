use crate::domain::security::{RiskBucket, SecurityRecord};
use crate::momentum::{MomentumLabel, SeriesChanges};
use crate::risk::selection::{SelectionQuery, SortKey};
use crate::storage::{QuoteSyncUpdate, SecurityStore};
use anyhow::Context;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

/// Safety cap for the unfiltered listing endpoint.
pub const MAX_LIST_LIMIT: i64 = 100;

const SELECT_COLUMNS: &str = "symbol, name, exchange, sector, current_price, pe_ratio, beta, \
     dividend_yield, debt_to_equity, profit_margin, risk_bucket, change_1d, change_1w, \
     change_1m, momentum, price_to_book, market_cap, last_updated";

#[derive(Debug, Clone)]
pub struct PgSecurityStore {
    pool: PgPool,
}

impl PgSecurityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl SecurityStore for PgSecurityStore {
    async fn find_securities(
        &self,
        query: &SelectionQuery,
        limit: i64,
    ) -> anyhow::Result<Vec<SecurityRecord>> {
        let buckets: Vec<String> = query
            .buckets
            .iter()
            .map(|b| b.as_str().to_string())
            .collect();

        let mut qb = sqlx::QueryBuilder::new(format!(
            "SELECT {SELECT_COLUMNS} FROM securities WHERE risk_bucket = ANY("
        ));
        qb.push_bind(buckets);
        qb.push(")");

        if let Some(max_beta) = query.max_beta {
            qb.push(" AND (beta <= ");
            qb.push_bind(max_beta);
            qb.push(" OR beta IS NULL)");
        }
        if let Some(max_dte) = query.max_debt_to_equity {
            qb.push(" AND (debt_to_equity <= ");
            qb.push_bind(max_dte);
            qb.push(" OR debt_to_equity IS NULL)");
        }

        qb.push(" ORDER BY ");
        for key in query.sort {
            qb.push(sort_sql(*key));
            qb.push(", ");
        }
        qb.push("symbol ASC LIMIT ");
        qb.push_bind(limit);

        let rows: Vec<SecurityRow> = qb
            .build_query_as()
            .persistent(false)
            .fetch_all(&self.pool)
            .await
            .context("select securities failed")?;

        Ok(rows.into_iter().map(SecurityRecord::from).collect())
    }

    async fn upsert_from_quote(
        &self,
        update: &QuoteSyncUpdate,
    ) -> anyhow::Result<SecurityRecord> {
        let row: SecurityRow = sqlx::query_as(&format!(
            "INSERT INTO securities \
               (symbol, name, exchange, risk_bucket, current_price, change_1d, change_1w, \
                change_1m, momentum, pe_ratio, price_to_book, market_cap, last_updated) \
             VALUES ($1, $2, $3, $4, $5, $6, NULL, $7, $8, $9, $10, $11, now()) \
             ON CONFLICT (symbol) DO UPDATE SET \
               name = EXCLUDED.name, \
               exchange = EXCLUDED.exchange, \
               risk_bucket = EXCLUDED.risk_bucket, \
               current_price = EXCLUDED.current_price, \
               change_1d = EXCLUDED.change_1d, \
               change_1w = NULL, \
               change_1m = EXCLUDED.change_1m, \
               momentum = EXCLUDED.momentum, \
               pe_ratio = EXCLUDED.pe_ratio, \
               price_to_book = EXCLUDED.price_to_book, \
               market_cap = EXCLUDED.market_cap, \
               last_updated = now() \
             RETURNING {SELECT_COLUMNS}"
        ))
        .persistent(false)
        .bind(&update.symbol)
        .bind(&update.name)
        .bind(&update.exchange)
        .bind(update.risk_bucket.as_str())
        .bind(update.current_price)
        .bind(update.change_1d)
        .bind(update.change_long_term)
        .bind(update.momentum.as_str())
        .bind(update.pe_ratio)
        .bind(update.price_to_book)
        .bind(update.market_cap)
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("upsert security {} failed", update.symbol))?;

        Ok(row.into())
    }

    async fn apply_series_changes(
        &self,
        symbol: &str,
        changes: &SeriesChanges,
    ) -> anyhow::Result<()> {
        sqlx::query(
            "UPDATE securities SET \
               current_price = $2, change_1d = $3, change_1w = $4, change_1m = $5, \
               last_updated = now() \
             WHERE symbol = $1",
        )
        .persistent(false)
        .bind(symbol)
        .bind(changes.current_price)
        .bind(changes.change_1d)
        .bind(changes.change_1w)
        .bind(changes.change_1m)
        .execute(&self.pool)
        .await
        .with_context(|| format!("update series changes for {symbol} failed"))?;
        Ok(())
    }

    async fn list_symbols(&self) -> anyhow::Result<Vec<String>> {
        let symbols: Vec<String> =
            sqlx::query_scalar("SELECT symbol FROM securities ORDER BY symbol ASC")
                .persistent(false)
                .fetch_all(&self.pool)
                .await
                .context("list security symbols failed")?;
        Ok(symbols)
    }
}

pub async fn fetch_all(pool: &PgPool, limit: i64) -> anyhow::Result<Vec<SecurityRecord>> {
    let limit = limit.clamp(1, MAX_LIST_LIMIT);
    let rows: Vec<SecurityRow> = sqlx::query_as(&format!(
        "SELECT {SELECT_COLUMNS} FROM securities ORDER BY symbol ASC LIMIT $1"
    ))
    .persistent(false)
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("list securities failed")?;

    Ok(rows.into_iter().map(SecurityRecord::from).collect())
}

pub async fn fetch_by_symbol(
    pool: &PgPool,
    symbol: &str,
) -> anyhow::Result<Option<SecurityRecord>> {
    let row: Option<SecurityRow> = sqlx::query_as(&format!(
        "SELECT {SELECT_COLUMNS} FROM securities WHERE symbol = $1 LIMIT 1"
    ))
    .persistent(false)
    .bind(symbol.trim().to_uppercase())
    .fetch_optional(pool)
    .await
    .with_context(|| format!("fetch security {symbol} failed"))?;

    Ok(row.map(SecurityRecord::from))
}

fn sort_sql(key: SortKey) -> &'static str {
    match key {
        SortKey::DividendYieldDesc => "dividend_yield DESC NULLS LAST",
        SortKey::PeRatioAsc => "pe_ratio ASC NULLS LAST",
        SortKey::ProfitMarginDesc => "profit_margin DESC NULLS LAST",
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SecurityRow {
    symbol: String,
    name: String,
    exchange: Option<String>,
    sector: Option<String>,
    current_price: Option<f64>,
    pe_ratio: Option<f64>,
    beta: Option<f64>,
    dividend_yield: Option<f64>,
    debt_to_equity: Option<f64>,
    profit_margin: Option<f64>,
    risk_bucket: Option<String>,
    change_1d: Option<f64>,
    change_1w: Option<f64>,
    change_1m: Option<f64>,
    momentum: String,
    price_to_book: Option<f64>,
    market_cap: Option<f64>,
    last_updated: DateTime<Utc>,
}

impl From<SecurityRow> for SecurityRecord {
    fn from(row: SecurityRow) -> Self {
        SecurityRecord {
            symbol: row.symbol,
            name: row.name,
            exchange: row.exchange,
            sector: row.sector,
            current_price: row.current_price,
            pe_ratio: row.pe_ratio,
            beta: row.beta,
            dividend_yield: row.dividend_yield,
            debt_to_equity: row.debt_to_equity,
            profit_margin: row.profit_margin,
            // Unknown stored values degrade to absent/neutral rather than
            // erroring; the row stays usable.
            risk_bucket: row.risk_bucket.as_deref().and_then(RiskBucket::parse),
            change_1d: row.change_1d,
            change_1w: row.change_1w,
            change_1m: row.change_1m,
            momentum: MomentumLabel::parse(&row.momentum).unwrap_or(MomentumLabel::Neutral),
            price_to_book: row.price_to_book,
            market_cap: row.market_cap,
            last_updated: row.last_updated,
        }
    }
}
