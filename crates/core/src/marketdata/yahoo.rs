use crate::config::Settings;
use crate::marketdata::{Candle, HistoryProvider, ProviderError, Quote, QuoteProvider};
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_HOST: &str = "yahoo-finance-real-time1.p.rapidapi.com";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_REGION: &str = "IN";
const HISTORY_RANGE: &str = "1mo";
const HISTORY_INTERVAL: &str = "1d";

/// Yahoo Finance realtime client via RapidAPI. Quote data comes from the
/// options endpoint (its embedded `quote` object is the cheapest source of
/// price + daily move + valuation); history from the chart endpoint.
/// No retries: a failed fetch is terminal for the item that needed it.
#[derive(Debug, Clone)]
pub struct YahooRapidApiClient {
    http: reqwest::Client,
    host: String,
    api_key: String,
    region: String,
}

impl YahooRapidApiClient {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let api_key = settings.require_rapidapi_key()?.to_string();
        let host = settings
            .rapidapi_host
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let timeout_secs = std::env::var("RAPIDAPI_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let region = std::env::var("MARKET_DATA_REGION")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build market data http client")?;

        Ok(Self {
            http,
            host,
            api_key,
            region,
        })
    }

    fn headers(&self) -> Result<HeaderMap, ProviderError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-rapidapi-key",
            HeaderValue::from_str(&self.api_key)
                .map_err(|e| ProviderError::Malformed(format!("invalid api key header: {e}")))?,
        );
        headers.insert(
            "x-rapidapi-host",
            HeaderValue::from_str(&self.host)
                .map_err(|e| ProviderError::Malformed(format!("invalid host header: {e}")))?,
        );
        Ok(headers)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ProviderError> {
        let url = format!("https://{}{path}", self.host);
        let res = self
            .http
            .get(url)
            .headers(self.headers()?)
            .query(query)
            .send()
            .await?;

        let status = res.status();
        let text = res.text().await?;
        if !status.is_success() {
            return Err(ProviderError::Status { status, body: text });
        }

        serde_json::from_str::<T>(&text)
            .map_err(|e| ProviderError::Malformed(format!("{e}: {text}")))
    }
}

#[async_trait::async_trait]
impl QuoteProvider for YahooRapidApiClient {
    async fn fetch_quote(&self, canonical_symbol: &str) -> Result<Quote, ProviderError> {
        let body: GetOptionsResponse = self
            .get_json(
                "/stock/get-options",
                &[
                    ("symbol", canonical_symbol),
                    ("lang", "en-US"),
                    ("region", &self.region),
                ],
            )
            .await?;

        let quote = body
            .option_chain
            .and_then(|c| c.result.into_iter().next())
            .and_then(|r| r.quote)
            .ok_or_else(|| ProviderError::MissingQuote {
                symbol: canonical_symbol.to_string(),
            })?;

        Ok(Quote {
            symbol: quote.symbol.unwrap_or_else(|| canonical_symbol.to_string()),
            current_price: quote.regular_market_price,
            change_1d: quote.regular_market_change_percent,
            change_52w: quote.fifty_two_week_change_percent,
            forward_pe: quote.forward_pe,
            price_to_book: quote.price_to_book,
            market_cap: quote.market_cap,
        })
    }
}

#[async_trait::async_trait]
impl HistoryProvider for YahooRapidApiClient {
    async fn fetch_recent_candles(&self, symbol: &str) -> Result<Vec<Candle>, ProviderError> {
        let body: GetChartResponse = self
            .get_json(
                "/stock/get-chart",
                &[
                    ("symbol", symbol),
                    ("lang", "en-US"),
                    ("region", &self.region),
                    ("range", HISTORY_RANGE),
                    ("interval", HISTORY_INTERVAL),
                ],
            )
            .await?;

        let result = body
            .chart
            .and_then(|c| c.result)
            .and_then(|r| r.into_iter().next())
            .ok_or_else(|| {
                ProviderError::Malformed(format!("no chart result for {symbol}"))
            })?;

        let closes = result
            .indicators
            .quote
            .into_iter()
            .next()
            .map(|q| q.close)
            .unwrap_or_default();

        // The chart payload carries nulls for non-trading slots; drop them
        // so the series stays chronological and dense.
        Ok(closes
            .into_iter()
            .flatten()
            .map(|close| Candle { close })
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct GetOptionsResponse {
    #[serde(rename = "optionChain")]
    option_chain: Option<OptionChain>,
}

#[derive(Debug, Deserialize)]
struct OptionChain {
    #[serde(default)]
    result: Vec<OptionChainResult>,
}

#[derive(Debug, Deserialize)]
struct OptionChainResult {
    quote: Option<RawQuote>,
}

#[derive(Debug, Deserialize)]
struct RawQuote {
    symbol: Option<String>,
    #[serde(rename = "regularMarketPrice")]
    regular_market_price: Option<f64>,
    #[serde(rename = "regularMarketChangePercent")]
    regular_market_change_percent: Option<f64>,
    #[serde(rename = "fiftyTwoWeekChangePercent")]
    fifty_two_week_change_percent: Option<f64>,
    #[serde(rename = "forwardPE")]
    forward_pe: Option<f64>,
    #[serde(rename = "priceToBook")]
    price_to_book: Option<f64>,
    #[serde(rename = "marketCap")]
    market_cap: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct GetChartResponse {
    chart: Option<Chart>,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    indicators: ChartIndicators,
}

#[derive(Debug, Default, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_get_options_quote_shape() {
        let v = json!({
            "optionChain": {
                "result": [
                    {
                        "quote": {
                            "symbol": "RELIANCE.NS",
                            "regularMarketPrice": 2915.5,
                            "regularMarketChangePercent": 0.8,
                            "fiftyTwoWeekChangePercent": 22.4,
                            "forwardPE": 25.3,
                            "priceToBook": 2.1,
                            "marketCap": 1.97e13
                        }
                    }
                ]
            }
        });

        let parsed: GetOptionsResponse = serde_json::from_value(v).unwrap();
        let quote = parsed
            .option_chain
            .unwrap()
            .result
            .into_iter()
            .next()
            .unwrap()
            .quote
            .unwrap();
        assert_eq!(quote.symbol.as_deref(), Some("RELIANCE.NS"));
        assert_eq!(quote.regular_market_price, Some(2915.5));
        assert_eq!(quote.fifty_two_week_change_percent, Some(22.4));
    }

    #[test]
    fn missing_quote_object_parses_to_none() {
        let v = json!({"optionChain": {"result": [{}]}});
        let parsed: GetOptionsResponse = serde_json::from_value(v).unwrap();
        let result = parsed.option_chain.unwrap().result;
        assert!(result[0].quote.is_none());
    }

    #[test]
    fn parses_chart_closes_and_keeps_nulls_distinct() {
        let v = json!({
            "chart": {
                "result": [
                    {
                        "timestamp": [1, 2, 3],
                        "indicators": {
                            "quote": [ {"close": [100.0, null, 102.5]} ]
                        }
                    }
                ]
            }
        });

        let parsed: GetChartResponse = serde_json::from_value(v).unwrap();
        let closes = parsed
            .chart
            .unwrap()
            .result
            .unwrap()
            .into_iter()
            .next()
            .unwrap()
            .indicators
            .quote
            .into_iter()
            .next()
            .unwrap()
            .close;
        assert_eq!(closes, vec![Some(100.0), None, Some(102.5)]);
    }
}
