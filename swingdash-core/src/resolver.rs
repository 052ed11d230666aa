//! Ticker resolution with exchange-suffix fallback.
//!
//! A bare code like `RELIANCE` is tried as given, then with each fallback
//! suffix (`.NS`, `.BO`). The first attempt with any history wins.

use crate::config::ResolverConfig;
use crate::data::{Interval, Lookback, MarketDataProvider};
use crate::domain::Bar;
use thiserror::Error;
use tracing::{debug, info};

/// Trim, uppercase and keep only `[A-Z0-9.-]`.
pub fn sanitize(raw: &str) -> String {
    raw.trim()
        .to_ascii_uppercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '.' || *c == '-')
        .collect()
}

fn known_suffix<'a>(symbol: &str, config: &'a ResolverConfig) -> Option<&'a str> {
    config
        .known_suffixes
        .iter()
        .map(String::as_str)
        .find(|suffix| symbol.len() > suffix.len() && symbol.ends_with(suffix))
}

/// Symbols to try, in order, for an already-sanitized input.
pub fn candidates(sanitized: &str, config: &ResolverConfig) -> Vec<String> {
    if sanitized.is_empty() {
        return Vec::new();
    }
    if known_suffix(sanitized, config).is_some() {
        return vec![sanitized.to_string()];
    }
    let mut out = vec![sanitized.to_string()];
    out.extend(
        config
            .fallback_suffixes
            .iter()
            .map(|suffix| format!("{sanitized}{suffix}")),
    );
    out
}

/// Exchange code with any known suffix removed: `TCS.NS` -> `TCS`.
pub fn bare_code(symbol: &str, config: &ResolverConfig) -> String {
    match known_suffix(symbol, config) {
        Some(suffix) => symbol[..symbol.len() - suffix.len()].to_string(),
        None => symbol.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub symbol: String,
    pub bars: Vec<Bar>,
    pub attempts: Vec<String>,
}

/// No candidate produced any history. This is an expected outcome, not a fault.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no data for '{input}' (tried: {})", attempts.join(", "))]
pub struct ResolutionFailure {
    pub input: String,
    pub attempts: Vec<String>,
}

pub struct SymbolResolver<'a, P: ?Sized> {
    provider: &'a P,
    config: &'a ResolverConfig,
}

impl<'a, P: MarketDataProvider + ?Sized> SymbolResolver<'a, P> {
    pub fn new(provider: &'a P, config: &'a ResolverConfig) -> Self {
        Self { provider, config }
    }

    pub fn resolve(
        &self,
        raw: &str,
        lookback: Lookback,
        interval: Interval,
    ) -> Result<Resolved, ResolutionFailure> {
        let sanitized = sanitize(raw);
        let mut attempts = Vec::new();

        for candidate in candidates(&sanitized, self.config) {
            attempts.push(candidate.clone());
            let bars = match self.provider.fetch_history(&candidate, lookback, interval) {
                Ok(bars) => bars,
                Err(e) => {
                    debug!(symbol = %candidate, provider = self.provider.name(), error = %e, "attempt failed");
                    continue;
                }
            };
            debug!(symbol = %candidate, bars = bars.len(), "attempt");
            if !bars.is_empty() {
                info!(input = raw, symbol = %candidate, "resolved");
                return Ok(Resolved {
                    symbol: candidate,
                    bars,
                    attempts,
                });
            }
        }

        Err(ResolutionFailure {
            input: raw.to_string(),
            attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DataError, Metadata};
    use crate::indicators::make_bars;
    use std::collections::HashSet;
    use std::sync::Mutex;

    struct Listed {
        listed: HashSet<&'static str>,
        broken: HashSet<&'static str>,
        calls: Mutex<Vec<String>>,
    }

    impl Listed {
        fn new(listed: &[&'static str], broken: &[&'static str]) -> Self {
            Self {
                listed: listed.iter().copied().collect(),
                broken: broken.iter().copied().collect(),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl MarketDataProvider for Listed {
        fn name(&self) -> &str {
            "listed"
        }

        fn fetch_history(&self, symbol: &str, _: Lookback, _: Interval) -> Result<Vec<Bar>, DataError> {
            self.calls.lock().unwrap().push(symbol.to_string());
            if self.broken.contains(symbol) {
                return Err(DataError::NetworkUnreachable("boom".into()));
            }
            if self.listed.contains(symbol) {
                Ok(make_bars(&[1.0, 2.0, 3.0]))
            } else {
                Ok(Vec::new())
            }
        }

        fn fetch_metadata(&self, _: &str) -> Result<Metadata, DataError> {
            Ok(Metadata::new())
        }

        fn is_available(&self) -> bool {
            true
        }
    }

    fn resolve(provider: &Listed, raw: &str) -> Result<Resolved, ResolutionFailure> {
        let config = ResolverConfig::default();
        SymbolResolver::new(provider, &config).resolve(raw, Lookback::Months(6), Interval::Daily)
    }

    #[test]
    fn sanitize_strips_and_uppercases() {
        assert_eq!(sanitize("  reliance.ns "), "RELIANCE.NS");
        assert_eq!(sanitize("m&m"), "MM");
        assert_eq!(sanitize("bajaj-auto"), "BAJAJ-AUTO");
        assert_eq!(sanitize("$%^"), "");
    }

    #[test]
    fn bare_input_falls_back_through_suffixes() {
        let config = ResolverConfig::default();
        assert_eq!(
            candidates("RELIANCE", &config),
            vec!["RELIANCE", "RELIANCE.NS", "RELIANCE.BO"]
        );
    }

    #[test]
    fn suffixed_input_is_tried_as_given() {
        let config = ResolverConfig::default();
        assert_eq!(candidates("TCS.BO", &config), vec!["TCS.BO"]);
        assert_eq!(candidates("TCS.NSE", &config), vec!["TCS.NSE"]);
    }

    #[test]
    fn stops_at_first_non_empty() {
        let provider = Listed::new(&["RELIANCE.NS", "RELIANCE.BO"], &[]);
        let resolved = resolve(&provider, "reliance").unwrap();
        assert_eq!(resolved.symbol, "RELIANCE.NS");
        assert_eq!(resolved.attempts, vec!["RELIANCE", "RELIANCE.NS"]);
        assert_eq!(provider.calls.lock().unwrap().len(), 2);
    }

    #[test]
    fn provider_errors_count_as_empty() {
        let provider = Listed::new(&["INFY.BO"], &["INFY", "INFY.NS"]);
        let resolved = resolve(&provider, "INFY").unwrap();
        assert_eq!(resolved.symbol, "INFY.BO");
        assert_eq!(resolved.attempts.len(), 3);
    }

    #[test]
    fn failure_lists_every_attempt() {
        let provider = Listed::new(&[], &[]);
        let failure = resolve(&provider, "NOPE").unwrap_err();
        assert_eq!(failure.attempts, vec!["NOPE", "NOPE.NS", "NOPE.BO"]);
        assert!(failure.to_string().contains("NOPE.BO"));
    }

    #[test]
    fn empty_input_makes_no_attempts() {
        let provider = Listed::new(&[], &[]);
        let failure = resolve(&provider, "  @@ ").unwrap_err();
        assert!(failure.attempts.is_empty());
        assert!(provider.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn bare_code_strips_known_suffix() {
        let config = ResolverConfig::default();
        assert_eq!(bare_code("TCS.NS", &config), "TCS");
        assert_eq!(bare_code("TCS.BSE", &config), "TCS");
        assert_eq!(bare_code("AAPL", &config), "AAPL");
    }
}
