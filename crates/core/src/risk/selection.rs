use crate::domain::assessment::RiskProfile;
use crate::domain::security::{RiskBucket, SecurityRecord};
use std::cmp::Ordering;

/// Result-count cap callers apply when querying the store.
pub const DEFAULT_RESULT_LIMIT: i64 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    DividendYieldDesc,
    PeRatioAsc,
    ProfitMarginDesc,
}

/// Declarative filter/sort specification for picking candidate securities.
/// `matches`/`compare` define the semantics; the Postgres store translates
/// the same shape to SQL.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionQuery {
    pub buckets: &'static [RiskBucket],
    /// Records with a present beta above this are excluded; an absent beta
    /// passes.
    pub max_beta: Option<f64>,
    /// Same absent-passes rule as `max_beta`.
    pub max_debt_to_equity: Option<f64>,
    pub sort: &'static [SortKey],
}

pub fn query_for_profile(profile: RiskProfile) -> SelectionQuery {
    match profile {
        RiskProfile::Conservative => SelectionQuery {
            buckets: &[RiskBucket::Low],
            max_beta: Some(1.05),
            max_debt_to_equity: Some(1.0),
            sort: &[SortKey::DividendYieldDesc, SortKey::PeRatioAsc],
        },
        RiskProfile::Aggressive => SelectionQuery {
            buckets: &[RiskBucket::Medium, RiskBucket::High],
            max_beta: None,
            max_debt_to_equity: None,
            sort: &[SortKey::ProfitMarginDesc, SortKey::PeRatioAsc],
        },
        RiskProfile::Moderate => SelectionQuery {
            buckets: &[RiskBucket::Low, RiskBucket::Medium],
            max_beta: None,
            max_debt_to_equity: None,
            sort: &[SortKey::PeRatioAsc],
        },
    }
}

pub fn selection_explanation(profile: RiskProfile) -> &'static str {
    match profile {
        RiskProfile::Conservative => {
            "These ideas are screened from the low-risk bucket, favouring businesses with \
             relatively lower volatility, prudent leverage and a bias towards steady cash \
             flows and dividends. The objective is to complement your capital-preservation \
             oriented asset mix rather than maximise short-term upside."
        }
        RiskProfile::Aggressive => {
            "These ideas are drawn from medium-to-high risk names with above-average \
             profitability and earnings power, accepting higher price volatility in \
             exchange for long-term growth potential. The bias is towards compounders \
             where upside participation matters more than short-term drawdowns."
        }
        RiskProfile::Moderate => {
            "The shortlist combines relatively stable and moderately aggressive names, \
             aiming for a balance between downside protection and upside participation. \
             Screening emphasises reasonable valuation and quality so that the equity \
             sleeve stays aligned with a balanced risk profile."
        }
    }
}

impl SelectionQuery {
    pub fn matches(&self, record: &SecurityRecord) -> bool {
        let Some(bucket) = record.risk_bucket else {
            return false;
        };
        if !self.buckets.contains(&bucket) {
            return false;
        }

        if let (Some(max), Some(beta)) = (self.max_beta, record.beta) {
            if beta > max {
                return false;
            }
        }
        if let (Some(max), Some(dte)) = (self.max_debt_to_equity, record.debt_to_equity) {
            if dte > max {
                return false;
            }
        }
        true
    }

    /// Total order over matching records; records missing a sort field sort
    /// after those that have it, for either direction.
    pub fn compare(&self, a: &SecurityRecord, b: &SecurityRecord) -> Ordering {
        for key in self.sort {
            let ord = match key {
                SortKey::DividendYieldDesc => cmp_desc(a.dividend_yield, b.dividend_yield),
                SortKey::PeRatioAsc => cmp_asc(a.pe_ratio, b.pe_ratio),
                SortKey::ProfitMarginDesc => cmp_desc(a.profit_margin, b.profit_margin),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        a.symbol.cmp(&b.symbol)
    }
}

fn cmp_asc(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn cmp_desc(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::momentum::MomentumLabel;
    use chrono::Utc;

    fn record(symbol: &str, bucket: Option<RiskBucket>) -> SecurityRecord {
        SecurityRecord {
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            exchange: Some("NSE".to_string()),
            sector: None,
            current_price: None,
            pe_ratio: None,
            beta: None,
            dividend_yield: None,
            debt_to_equity: None,
            profit_margin: None,
            risk_bucket: bucket,
            change_1d: None,
            change_1w: None,
            change_1m: None,
            momentum: MomentumLabel::Neutral,
            price_to_book: None,
            market_cap: None,
            last_updated: Utc::now(),
        }
    }

    #[test]
    fn conservative_excludes_high_beta_but_passes_absent() {
        let q = query_for_profile(RiskProfile::Conservative);

        let mut high_beta = record("A", Some(RiskBucket::Low));
        high_beta.beta = Some(1.06);
        assert!(!q.matches(&high_beta));

        let mut ok_beta = record("B", Some(RiskBucket::Low));
        ok_beta.beta = Some(1.05);
        assert!(q.matches(&ok_beta));

        let absent_beta = record("C", Some(RiskBucket::Low));
        assert!(q.matches(&absent_beta));

        let mut leveraged = record("D", Some(RiskBucket::Low));
        leveraged.debt_to_equity = Some(1.5);
        assert!(!q.matches(&leveraged));
    }

    #[test]
    fn bucket_membership_per_profile() {
        let conservative = query_for_profile(RiskProfile::Conservative);
        let moderate = query_for_profile(RiskProfile::Moderate);
        let aggressive = query_for_profile(RiskProfile::Aggressive);

        let low = record("L", Some(RiskBucket::Low));
        let medium = record("M", Some(RiskBucket::Medium));
        let high = record("H", Some(RiskBucket::High));
        let unbucketed = record("U", None);

        assert!(conservative.matches(&low));
        assert!(!conservative.matches(&medium));

        assert!(moderate.matches(&low));
        assert!(moderate.matches(&medium));
        assert!(!moderate.matches(&high));

        assert!(!aggressive.matches(&low));
        assert!(aggressive.matches(&medium));
        assert!(aggressive.matches(&high));

        assert!(!moderate.matches(&unbucketed));
    }

    #[test]
    fn conservative_sort_prefers_yield_then_cheapness() {
        let q = query_for_profile(RiskProfile::Conservative);

        let mut a = record("A", Some(RiskBucket::Low));
        a.dividend_yield = Some(2.0);
        a.pe_ratio = Some(30.0);

        let mut b = record("B", Some(RiskBucket::Low));
        b.dividend_yield = Some(1.0);
        b.pe_ratio = Some(10.0);

        // Higher yield wins regardless of valuation.
        assert_eq!(q.compare(&a, &b), Ordering::Less);

        let mut c = record("C", Some(RiskBucket::Low));
        c.dividend_yield = Some(2.0);
        c.pe_ratio = Some(12.0);
        // Tied yield falls through to cheaper P/E.
        assert_eq!(q.compare(&c, &a), Ordering::Less);
    }

    #[test]
    fn missing_sort_field_sorts_last() {
        let q = query_for_profile(RiskProfile::Moderate);

        let mut priced = record("A", Some(RiskBucket::Low));
        priced.pe_ratio = Some(50.0);
        let unpriced = record("B", Some(RiskBucket::Low));

        assert_eq!(q.compare(&priced, &unpriced), Ordering::Less);
    }
}
