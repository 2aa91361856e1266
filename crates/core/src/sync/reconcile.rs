use crate::domain::security::{EnrichedSecurity, ExternalSuggestion};
use crate::marketdata::QuoteProvider;
use crate::momentum;
use crate::storage::{QuoteSyncUpdate, SecurityStore};

/// Map a suggestion's `{symbol, exchange}` to the quote provider's
/// canonical form: `RELIANCE` + `NSE` -> `RELIANCE.NS`, `TCS` + `BSE` ->
/// `TCS.BO`, any other exchange keeps the bare symbol. A blank symbol or
/// exchange cannot be resolved.
pub fn canonical_symbol(symbol: &str, exchange: &str) -> Option<String> {
    let base = symbol.trim().to_uppercase();
    let exchange = exchange.trim();
    if base.is_empty() || exchange.is_empty() {
        return None;
    }
    match exchange {
        "NSE" => Some(format!("{base}.NS")),
        "BSE" => Some(format!("{base}.BO")),
        _ => Some(base),
    }
}

/// Reconcile AI-suggested tickers against the store and the quote provider.
///
/// Items are processed strictly sequentially: the quote provider is
/// rate-limited and this loop is the only throttle. Every failure
/// (resolution, fetch, upsert) is absorbed per item with a warn log; the
/// batch never aborts. Output preserves input order with failed items
/// absent, so an all-failed batch is an empty vec and the caller decides
/// whether to fall back to the raw suggestions.
pub async fn reconcile(
    store: &dyn SecurityStore,
    quotes: &dyn QuoteProvider,
    suggestions: &[ExternalSuggestion],
) -> Vec<EnrichedSecurity> {
    let mut enriched = Vec::with_capacity(suggestions.len());
    let mut failures: usize = 0;

    for suggestion in suggestions {
        let Some(canonical) = canonical_symbol(&suggestion.symbol, &suggestion.exchange) else {
            failures += 1;
            tracing::warn!(
                symbol = %suggestion.symbol,
                exchange = %suggestion.exchange,
                "cannot resolve suggestion to a canonical symbol; skipping"
            );
            continue;
        };

        let quote = match quotes.fetch_quote(&canonical).await {
            Ok(quote) => quote,
            Err(err) => {
                failures += 1;
                tracing::warn!(
                    symbol = %suggestion.symbol,
                    canonical = %canonical,
                    error = %err,
                    "quote fetch failed; skipping suggestion"
                );
                continue;
            }
        };

        let label = momentum::from_daily_and_long_term(quote.change_1d, quote.change_52w);

        let update = QuoteSyncUpdate {
            symbol: suggestion.symbol.trim().to_uppercase(),
            name: suggestion.name.clone(),
            exchange: suggestion.exchange.clone(),
            risk_bucket: suggestion.rough_risk_bucket,
            current_price: quote.current_price,
            change_1d: quote.change_1d,
            change_long_term: quote.change_52w,
            momentum: label,
            pe_ratio: quote.forward_pe,
            price_to_book: quote.price_to_book,
            market_cap: quote.market_cap,
        };

        let record = match store.upsert_from_quote(&update).await {
            Ok(record) => record,
            Err(err) => {
                failures += 1;
                tracing::warn!(
                    symbol = %update.symbol,
                    error = %err,
                    "security upsert failed; skipping suggestion"
                );
                continue;
            }
        };

        enriched.push(EnrichedSecurity {
            record,
            ai_role: suggestion.role.clone(),
            ai_rationale: suggestion.rationale.clone(),
        });
    }

    tracing::info!(
        suggested = suggestions.len(),
        enriched = enriched.len(),
        failures,
        "reconciled AI stock suggestions"
    );

    enriched
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_symbol_suffixes_by_exchange() {
        assert_eq!(
            canonical_symbol("RELIANCE", "NSE").as_deref(),
            Some("RELIANCE.NS")
        );
        assert_eq!(canonical_symbol("tcs", "BSE").as_deref(), Some("TCS.BO"));
        assert_eq!(canonical_symbol("AAPL", "NASDAQ").as_deref(), Some("AAPL"));
    }

    #[test]
    fn canonical_symbol_requires_both_parts() {
        assert_eq!(canonical_symbol("", "NSE"), None);
        assert_eq!(canonical_symbol("  ", "NSE"), None);
        assert_eq!(canonical_symbol("RELIANCE", ""), None);
        assert_eq!(canonical_symbol("RELIANCE", "  "), None);
    }
}
