pub mod yahoo;

use serde::{Deserialize, Serialize};

/// Quote snapshot from the external provider. Every value field is optional;
/// the provider frequently omits fundamentals for thinly covered names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub current_price: Option<f64>,
    pub change_1d: Option<f64>,
    /// 52-week change, used as a rough long-term momentum proxy.
    pub change_52w: Option<f64>,
    pub forward_pe: Option<f64>,
    pub price_to_book: Option<f64>,
    pub market_cap: Option<f64>,
}

/// One daily price candle. Series are chronological, oldest first.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Candle {
    pub close: f64,
}

/// External-fetch failure taxonomy. Per-item and never fatal to a batch:
/// the pipelines log and skip the affected item.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider HTTP {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("malformed provider payload: {0}")]
    Malformed(String),

    #[error("no quote payload for {symbol}")]
    MissingQuote { symbol: String },
}

#[async_trait::async_trait]
pub trait QuoteProvider: Send + Sync {
    /// `canonical_symbol` is the provider-specific, exchange-suffixed form
    /// (e.g. `RELIANCE.NS`).
    async fn fetch_quote(&self, canonical_symbol: &str) -> Result<Quote, ProviderError>;
}

#[async_trait::async_trait]
pub trait HistoryProvider: Send + Sync {
    /// Recent daily candles, oldest first. May return fewer points than the
    /// nominal window.
    async fn fetch_recent_candles(&self, symbol: &str) -> Result<Vec<Candle>, ProviderError>;
}
