use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MomentumLabel {
    Bullish,
    Bearish,
    Neutral,
}

impl MomentumLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            MomentumLabel::Bullish => "bullish",
            MomentumLabel::Bearish => "bearish",
            MomentumLabel::Neutral => "neutral",
        }
    }

    pub fn parse(s: &str) -> Option<MomentumLabel> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bullish" => Some(MomentumLabel::Bullish),
            "bearish" => Some(MomentumLabel::Bearish),
            "neutral" => Some(MomentumLabel::Neutral),
            _ => None,
        }
    }
}

/// Trend label from stored 1-month and 1-week changes. Both inputs must be
/// present and both thresholds must agree (AND); anything else is neutral.
/// Used when serving recommendations from stored history-derived changes.
pub fn from_changes(change_1m: Option<f64>, change_1w: Option<f64>) -> MomentumLabel {
    let (Some(c1m), Some(c1w)) = (change_1m, change_1w) else {
        return MomentumLabel::Neutral;
    };

    if c1m >= 8.0 && c1w >= 0.0 {
        return MomentumLabel::Bullish;
    }
    if c1m <= -8.0 && c1w <= 0.0 {
        return MomentumLabel::Bearish;
    }
    MomentumLabel::Neutral
}

/// Trend label from a live quote: daily move plus a long-term (52-week)
/// change. Either signal alone is enough (OR). Deliberately distinct from
/// `from_changes`; the two heuristics are tuned to their data sources and
/// must not be unified.
pub fn from_daily_and_long_term(
    change_1d: Option<f64>,
    change_long_term: Option<f64>,
) -> MomentumLabel {
    if change_1d.is_none() && change_long_term.is_none() {
        return MomentumLabel::Neutral;
    }

    if matches!(change_1d, Some(d) if d >= 2.0)
        || matches!(change_long_term, Some(lt) if lt >= 15.0)
    {
        return MomentumLabel::Bullish;
    }
    if matches!(change_1d, Some(d) if d <= -2.0)
        || matches!(change_long_term, Some(lt) if lt <= -15.0)
    {
        return MomentumLabel::Bearish;
    }
    MomentumLabel::Neutral
}

/// Price/change snapshot derived from a chronological close series
/// (oldest first). `change_1m` here is a true 1-month change, unlike the
/// 52-week proxy the quote path writes to the same store column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesChanges {
    pub current_price: f64,
    pub change_1d: f64,
    pub change_1w: f64,
    pub change_1m: f64,
}

impl SeriesChanges {
    /// None for fewer than 2 closes; the caller performs no update in that
    /// case. Lookback anchors: previous close for 1D, 5 trading days back
    /// for 1W, 22 back for 1M, clamped to the series start.
    pub fn from_closes(closes: &[f64]) -> Option<SeriesChanges> {
        if closes.len() < 2 {
            return None;
        }

        let n = closes.len();
        let last = closes[n - 1];
        let prev_1d = closes[n - 2];
        let prev_1w = if n >= 6 { closes[n - 6] } else { closes[0] };
        let prev_1m = if n >= 23 { closes[n - 23] } else { closes[0] };

        Some(SeriesChanges {
            current_price: last,
            change_1d: pct(last, prev_1d),
            change_1w: pct(last, prev_1w),
            change_1m: pct(last, prev_1m),
        })
    }
}

fn pct(now: f64, prev: f64) -> f64 {
    if prev != 0.0 {
        ((now - prev) / prev) * 100.0
    } else {
        0.0
    }
}
