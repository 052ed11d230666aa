//! Yahoo Finance data provider.
//!
//! History comes from the v8 chart API, metadata from the v10 quoteSummary
//! API. Both go through one request path with retries, exponential backoff and
//! the circuit breaker.
//!
//! Yahoo Finance has no official API and is subject to unannounced format changes.
//! The CSV provider is the fallback when Yahoo is unavailable.

use super::circuit_breaker::CircuitBreaker;
use super::provider::{DataError, Interval, Lookback, MarketDataProvider, Metadata};
use crate::config::ProviderConfig;
use crate::domain::Bar;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

const CHART_URL: &str = "https://query2.finance.yahoo.com/v8/finance/chart";
const SUMMARY_URL: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";
const SUMMARY_MODULES: &str = "price,summaryDetail,defaultKeyStatistics,financialData,assetProfile";

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct YahooError {
    code: String,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    meta: Option<ChartMeta>,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    /// Exchange offset from UTC in seconds; bar dates are exchange-local.
    gmtoffset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

/// Yahoo Finance v10 quoteSummary response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryResponse {
    quote_summary: SummaryResult,
}

#[derive(Debug, Deserialize)]
struct SummaryResult {
    result: Option<Vec<serde_json::Map<String, Value>>>,
    error: Option<YahooError>,
}

/// Yahoo Finance data provider.
pub struct YahooProvider {
    client: reqwest::blocking::Client,
    circuit_breaker: Arc<CircuitBreaker>,
    max_retries: u32,
    base_delay: Duration,
}

impl YahooProvider {
    pub fn new(config: &ProviderConfig, circuit_breaker: Arc<CircuitBreaker>) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout())
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            circuit_breaker,
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(500),
        })
    }

    /// Parse the chart API response into bars.
    fn parse_chart(symbol: &str, resp: ChartResponse) -> Result<Vec<Bar>, DataError> {
        let result = resp.chart.result.ok_or_else(|| yahoo_error(symbol, resp.chart.error))?;

        let Some(data) = result.into_iter().next() else {
            return Ok(Vec::new());
        };
        // A valid symbol with no trades in range has no timestamps at all.
        let Some(timestamps) = data.timestamp else {
            return Ok(Vec::new());
        };
        let quote = data
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("no quote data".into()))?;
        let offset = data.meta.and_then(|m| m.gmtoffset).unwrap_or(0);

        let mut bars = Vec::with_capacity(timestamps.len());
        for (i, &ts) in timestamps.iter().enumerate() {
            let date = chrono::DateTime::from_timestamp(ts + offset, 0)
                .map(|dt| dt.naive_utc().date())
                .ok_or_else(|| DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}")))?;

            let open = quote.open.get(i).copied().flatten();
            let high = quote.high.get(i).copied().flatten();
            let low = quote.low.get(i).copied().flatten();
            let close = quote.close.get(i).copied().flatten();
            let volume = quote.volume.get(i).copied().flatten();

            // Holidays and non-trading days come back with every field null.
            if open.is_none() && high.is_none() && low.is_none() && close.is_none() && volume.is_none() {
                continue;
            }

            bars.push(Bar {
                date,
                open: open.unwrap_or(f64::NAN),
                high: high.unwrap_or(f64::NAN),
                low: low.unwrap_or(f64::NAN),
                close: close.unwrap_or(f64::NAN),
                volume: volume.unwrap_or(0),
            });
        }

        Ok(bars)
    }

    /// Flatten quoteSummary modules into one map, preferring `raw` values.
    fn parse_summary(symbol: &str, resp: SummaryResponse) -> Result<Metadata, DataError> {
        let result = resp
            .quote_summary
            .result
            .ok_or_else(|| yahoo_error(symbol, resp.quote_summary.error))?;

        let mut meta = Metadata::new();
        for modules in result {
            for (_, module) in modules {
                let Value::Object(fields) = module else {
                    continue;
                };
                for (key, value) in fields {
                    let value = match value {
                        Value::Object(mut obj) => match obj.remove("raw") {
                            Some(raw) => raw,
                            None if obj.is_empty() => continue,
                            None => Value::Object(obj),
                        },
                        Value::Null => continue,
                        other => other,
                    };
                    meta.entry(key).or_insert(value);
                }
            }
        }
        Ok(meta)
    }

    /// GET a JSON document with retry and circuit breaker logic.
    fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
        symbol: &str,
    ) -> Result<T, DataError> {
        if !self.circuit_breaker.is_allowed() {
            return Err(DataError::CircuitBreakerTripped);
        }

        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.base_delay * 2u32.pow(attempt - 1);
                tracing::debug!(symbol, attempt, ?delay, "retrying Yahoo request");
                std::thread::sleep(delay);
            }

            if !self.circuit_breaker.is_allowed() {
                return Err(DataError::CircuitBreakerTripped);
            }

            match self.client.get(url).query(query).send() {
                Ok(resp) => {
                    let status = resp.status();

                    if status == reqwest::StatusCode::FORBIDDEN {
                        self.circuit_breaker.trip();
                        return Err(DataError::CircuitBreakerTripped);
                    }

                    if status == reqwest::StatusCode::NOT_FOUND {
                        return Err(DataError::SymbolNotFound {
                            symbol: symbol.to_string(),
                        });
                    }

                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        self.circuit_breaker.record_failure();
                        let retry_after = resp
                            .headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|v| v.parse::<u64>().ok())
                            .unwrap_or(60);
                        last_error = Some(DataError::RateLimited {
                            retry_after_secs: retry_after,
                        });
                        continue;
                    }

                    if status == reqwest::StatusCode::UNAUTHORIZED {
                        return Err(DataError::AuthenticationRequired(
                            "Yahoo Finance requires authentication".into(),
                        ));
                    }

                    if !status.is_success() {
                        self.circuit_breaker.record_failure();
                        last_error = Some(DataError::Other(format!("HTTP {status} for {symbol}")));
                        continue;
                    }

                    let parsed = resp.json::<T>().map_err(|e| {
                        DataError::ResponseFormatChanged(format!(
                            "failed to parse response for {symbol}: {e}"
                        ))
                    })?;
                    self.circuit_breaker.record_success();
                    return Ok(parsed);
                }
                Err(e) => {
                    if e.is_connect() || e.is_timeout() {
                        self.circuit_breaker.record_failure();
                        last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                        continue;
                    }
                    return Err(DataError::NetworkUnreachable(e.to_string()));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| DataError::Other("max retries exceeded".into())))
    }
}

fn yahoo_error(symbol: &str, error: Option<YahooError>) -> DataError {
    match error {
        Some(err) if err.code == "Not Found" => DataError::SymbolNotFound {
            symbol: symbol.to_string(),
        },
        Some(err) => DataError::ResponseFormatChanged(format!(
            "{}: {}",
            err.code,
            err.description.unwrap_or_default()
        )),
        None => DataError::ResponseFormatChanged("empty result with no error".into()),
    }
}

impl MarketDataProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch_history(
        &self,
        symbol: &str,
        lookback: Lookback,
        interval: Interval,
    ) -> Result<Vec<Bar>, DataError> {
        tracing::debug!(symbol, %lookback, interval = interval.param(), "fetching chart");
        let url = format!("{CHART_URL}/{symbol}");
        let range = lookback.range_param();
        let query = [
            ("range", range.as_str()),
            ("interval", interval.param()),
            ("includeAdjustedClose", "true"),
        ];
        match self.get_json::<ChartResponse>(&url, &query, symbol) {
            Ok(chart) => match Self::parse_chart(symbol, chart) {
                Err(DataError::SymbolNotFound { .. }) => Ok(Vec::new()),
                other => other,
            },
            Err(DataError::SymbolNotFound { .. }) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    fn fetch_metadata(&self, symbol: &str) -> Result<Metadata, DataError> {
        tracing::debug!(symbol, "fetching quote summary");
        let url = format!("{SUMMARY_URL}/{symbol}");
        let query = [("modules", SUMMARY_MODULES)];
        match self.get_json::<SummaryResponse>(&url, &query, symbol) {
            Ok(summary) => Self::parse_summary(symbol, summary),
            Err(DataError::SymbolNotFound { .. }) => Ok(Metadata::new()),
            Err(e) => Err(e),
        }
    }

    fn is_available(&self) -> bool {
        self.circuit_breaker.is_allowed()
    }
}
