use crate::momentum::MomentumLabel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskBucket {
    Low,
    Medium,
    High,
}

impl RiskBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskBucket::Low => "low",
            RiskBucket::Medium => "medium",
            RiskBucket::High => "high",
        }
    }

    /// Permissive parse used when reading back store rows: an unknown or
    /// empty value maps to None rather than erroring.
    pub fn parse(s: &str) -> Option<RiskBucket> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Some(RiskBucket::Low),
            "medium" => Some(RiskBucket::Medium),
            "high" => Some(RiskBucket::High),
            _ => None,
        }
    }
}

/// A persisted security, keyed by unique `symbol` (bare, uppercased).
/// `change_1m` carries a true 1-month change when written by the history
/// refresh and a 52-week proxy when written by the quote reconciliation;
/// see `QuoteSyncUpdate::change_long_term`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityRecord {
    pub symbol: String,
    pub name: String,
    pub exchange: Option<String>,
    pub sector: Option<String>,
    pub current_price: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub beta: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub profit_margin: Option<f64>,
    pub risk_bucket: Option<RiskBucket>,
    #[serde(rename = "change1D")]
    pub change_1d: Option<f64>,
    #[serde(rename = "change1W")]
    pub change_1w: Option<f64>,
    #[serde(rename = "change1M")]
    pub change_1m: Option<f64>,
    pub momentum: MomentumLabel,
    pub price_to_book: Option<f64>,
    pub market_cap: Option<f64>,
    pub last_updated: DateTime<Utc>,
}

/// An AI-suggested ticker reference. Ephemeral input to the reconciliation
/// pipeline; `role` and `rationale` survive only as response annotations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalSuggestion {
    pub symbol: String,
    pub exchange: String,
    pub name: String,
    pub rough_risk_bucket: RiskBucket,
    pub role: Option<String>,
    pub rationale: Option<String>,
}

/// A post-upsert record plus the transient AI annotations. Never written to
/// the store.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedSecurity {
    #[serde(flatten)]
    pub record: SecurityRecord,
    pub ai_role: Option<String>,
    pub ai_rationale: Option<String>,
}
