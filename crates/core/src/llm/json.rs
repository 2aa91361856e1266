use crate::domain::contract::{LlmStockPicks, StockPickSet};
use anyhow::Context;

pub fn extract_json(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.starts_with("```") {
        // Remove Markdown fences (```json ... ``` or ``` ... ```).
        let mut inner = trimmed;
        if let Some(after_first) = inner.splitn(2, '\n').nth(1) {
            inner = after_first;
        }
        if let Some(end) = inner.rfind("```") {
            inner = &inner[..end];
        }
        return Some(inner.trim().to_string());
    }

    // Best-effort extraction: first '{' to last '}'.
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(trimmed[start..=end].trim().to_string())
}

pub fn parse_picks(text: &str) -> anyhow::Result<StockPickSet> {
    let json_str = extract_json(text).unwrap_or_else(|| text.trim().to_string());
    let parsed = serde_json::from_str::<LlmStockPicks>(&json_str)
        .with_context(|| format!("LLM output is not valid JSON for picks schema: {json_str}"))?;
    parsed.validate_and_into_picks()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_picks_json() -> String {
        json!({
            "stocks": [
                {
                    "symbol": "RELIANCE",
                    "exchange": "NSE",
                    "name": "Reliance Industries Ltd",
                    "roughRiskBucket": "medium",
                    "role": "core compounder",
                    "rationale": "Diversified earnings base"
                },
                {
                    "symbol": "TCS",
                    "exchange": "NSE",
                    "name": "Tata Consultancy Services Ltd",
                    "roughRiskBucket": "low",
                    "role": "stabiliser",
                    "rationale": "Cash-generative IT services leader"
                }
            ],
            "summary": "Two large-cap ideas",
            "disclaimer": "Not investment advice"
        })
        .to_string()
    }

    #[test]
    fn extract_json_handles_fenced_blocks() {
        let body = "{\"a\":1}";
        let fenced = format!("```json\n{body}\n```\n");
        assert_eq!(extract_json(&fenced), Some(body.to_string()));
    }

    #[test]
    fn extract_json_falls_back_to_braces() {
        let s = "prefix {\"a\":1} suffix";
        assert_eq!(extract_json(s), Some("{\"a\":1}".to_string()));
    }

    #[test]
    fn parse_picks_accepts_valid_json() {
        let picks = parse_picks(&valid_picks_json()).unwrap();
        assert_eq!(picks.suggestions.len(), 2);
        assert_eq!(picks.suggestions[0].symbol, "RELIANCE");
        assert_eq!(picks.summary.as_deref(), Some("Two large-cap ideas"));
    }

    #[test]
    fn parse_picks_accepts_prose_wrapped_json() {
        let wrapped = format!("Here are my picks:\n{}\nHope that helps.", valid_picks_json());
        let picks = parse_picks(&wrapped).unwrap();
        assert_eq!(picks.suggestions.len(), 2);
    }

    #[test]
    fn parse_picks_rejects_empty_stocks() {
        let s = json!({"stocks": [], "summary": "nothing"}).to_string();
        assert!(parse_picks(&s).is_err());
    }

    #[test]
    fn parse_picks_rejects_non_json() {
        assert!(parse_picks("I cannot help with that.").is_err());
    }
}
