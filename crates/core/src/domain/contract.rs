use crate::domain::security::{ExternalSuggestion, RiskBucket};
use anyhow::ensure;
use serde::{Deserialize, Serialize};

const MAX_PICKS: usize = 12;

/// Raw stock-pick payload as emitted by the language model. Untrusted until
/// it passes `validate_and_into_picks`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmStockPicks {
    #[serde(default)]
    pub stocks: Vec<LlmStockPick>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub disclaimer: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmStockPick {
    pub symbol: String,
    pub exchange: String,
    pub name: String,
    pub rough_risk_bucket: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub rationale: Option<String>,
}

/// Validated picks ready for reconciliation.
#[derive(Debug, Clone)]
pub struct StockPickSet {
    pub suggestions: Vec<ExternalSuggestion>,
    pub summary: Option<String>,
    pub disclaimer: Option<String>,
}

impl LlmStockPicks {
    pub fn validate_and_into_picks(self) -> anyhow::Result<StockPickSet> {
        ensure!(!self.stocks.is_empty(), "LLM output contains no stocks");
        ensure!(
            self.stocks.len() <= MAX_PICKS,
            "LLM output has too many stocks (got {}, max {MAX_PICKS})",
            self.stocks.len()
        );

        let mut suggestions = Vec::with_capacity(self.stocks.len());
        for stock in self.stocks {
            suggestions.push(stock.validate_and_into_suggestion()?);
        }

        Ok(StockPickSet {
            suggestions,
            summary: non_empty(self.summary),
            disclaimer: non_empty(self.disclaimer),
        })
    }
}

impl LlmStockPick {
    fn validate_and_into_suggestion(self) -> anyhow::Result<ExternalSuggestion> {
        let symbol = self.symbol.trim().to_uppercase();
        ensure!(!symbol.is_empty(), "pick symbol must be non-empty");
        ensure!(
            !symbol.contains('.'),
            "pick symbol must be bare, without exchange suffix (got {symbol})"
        );

        let exchange = self.exchange.trim().to_uppercase();
        ensure!(
            exchange == "NSE" || exchange == "BSE",
            "pick exchange must be NSE or BSE (got {exchange:?})"
        );

        let name = self.name.trim().to_string();
        ensure!(!name.is_empty(), "pick name must be non-empty");

        let rough_risk_bucket = RiskBucket::parse(&self.rough_risk_bucket)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "pick roughRiskBucket must be low/medium/high (got {:?})",
                    self.rough_risk_bucket
                )
            })?;

        Ok(ExternalSuggestion {
            symbol,
            exchange,
            name,
            rough_risk_bucket,
            role: non_empty(self.role),
            rationale: non_empty(self.rationale),
        })
    }
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_pick() -> serde_json::Value {
        json!({
            "symbol": "reliance ",
            "exchange": "nse",
            "name": "Reliance Industries Ltd",
            "roughRiskBucket": "medium",
            "role": "core compounder",
            "rationale": "Large diversified conglomerate"
        })
    }

    #[test]
    fn validates_and_normalizes_case() {
        let parsed: LlmStockPicks = serde_json::from_value(json!({
            "stocks": [valid_pick()],
            "summary": "one idea",
            "disclaimer": "not advice"
        }))
        .unwrap();

        let picks = parsed.validate_and_into_picks().unwrap();
        assert_eq!(picks.suggestions.len(), 1);
        let s = &picks.suggestions[0];
        assert_eq!(s.symbol, "RELIANCE");
        assert_eq!(s.exchange, "NSE");
        assert_eq!(s.rough_risk_bucket, RiskBucket::Medium);
        assert_eq!(s.role.as_deref(), Some("core compounder"));
    }

    #[test]
    fn rejects_empty_stock_list() {
        let parsed: LlmStockPicks =
            serde_json::from_value(json!({"stocks": []})).unwrap();
        assert!(parsed.validate_and_into_picks().is_err());
    }

    #[test]
    fn rejects_unknown_exchange_and_bucket() {
        let mut pick = valid_pick();
        pick["exchange"] = json!("NYSE");
        let parsed: LlmStockPicks =
            serde_json::from_value(json!({"stocks": [pick]})).unwrap();
        assert!(parsed.validate_and_into_picks().is_err());

        let mut pick = valid_pick();
        pick["roughRiskBucket"] = json!("extreme");
        let parsed: LlmStockPicks =
            serde_json::from_value(json!({"stocks": [pick]})).unwrap();
        assert!(parsed.validate_and_into_picks().is_err());
    }

    #[test]
    fn rejects_suffixed_symbol() {
        let mut pick = valid_pick();
        pick["symbol"] = json!("RELIANCE.NS");
        let parsed: LlmStockPicks =
            serde_json::from_value(json!({"stocks": [pick]})).unwrap();
        assert!(parsed.validate_and_into_picks().is_err());
    }

    #[test]
    fn blank_annotations_become_none() {
        let mut pick = valid_pick();
        pick["role"] = json!("   ");
        pick["rationale"] = serde_json::Value::Null;
        let parsed: LlmStockPicks =
            serde_json::from_value(json!({"stocks": [pick]})).unwrap();
        let picks = parsed.validate_and_into_picks().unwrap();
        assert_eq!(picks.suggestions[0].role, None);
        assert_eq!(picks.suggestions[0].rationale, None);
    }
}
