//! Dashboard configuration.
//!
//! Every section and field has a default, so an empty TOML document (or no
//! file at all) yields the stock dashboard. Partial files override only the
//! keys they name.

use crate::data::universe::{Universe, UniverseEntry};
use crate::format::DomesticUnit;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub history: HistoryConfig,
    pub indicators: IndicatorConfig,
    pub levels: LevelsConfig,
    pub resolver: ResolverConfig,
    pub display: DisplayConfig,
    pub cache: CacheConfig,
    pub provider: ProviderConfig,
    pub ranking: RankingConfig,
}

/// Price history window for single-symbol analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub lookback_months: u32,
    /// Cleaned bars required before any indicator is computed.
    pub min_bars: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            lookback_months: 6,
            min_bars: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    pub ema_fast: usize,
    pub ema_slow: usize,
    pub rsi: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub atr: usize,
    pub adx: usize,
    pub bollinger_period: usize,
    pub bollinger_std: f64,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            ema_fast: 10,
            ema_slow: 20,
            rsi: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            atr: 14,
            adx: 14,
            bollinger_period: 20,
            bollinger_std: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelsConfig {
    /// Stop distance from the close, in ATRs.
    pub stop_atr_multiple: f64,
    /// Trailing bars used for the swing high/low.
    pub swing_window: usize,
    pub fib_ratios: Vec<f64>,
}

impl Default for LevelsConfig {
    fn default() -> Self {
        Self {
            stop_atr_multiple: 1.5,
            swing_window: 5,
            fib_ratios: vec![0.618, 1.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Suffixes tried in order after the bare symbol.
    pub fallback_suffixes: Vec<String>,
    /// Suffixes that mark a symbol as already exchange-qualified.
    pub known_suffixes: Vec<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            fallback_suffixes: vec![".NS".into(), ".BO".into()],
            known_suffixes: vec![".NS".into(), ".BO".into(), ".NSE".into(), ".BSE".into()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Currency rendered with Indian grouping instead of K/M/B/T.
    pub domestic_currency: String,
    pub unit: DomesticUnit,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            domestic_currency: "INR".into(),
            unit: DomesticUnit::Crore,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub analysis_ttl_secs: u64,
    pub snapshot_ttl_secs: u64,
    pub movers_ttl_secs: u64,
    pub history_ttl_secs: u64,
}

impl CacheConfig {
    pub fn analysis_ttl(&self) -> Duration {
        Duration::from_secs(self.analysis_ttl_secs)
    }

    pub fn snapshot_ttl(&self) -> Duration {
        Duration::from_secs(self.snapshot_ttl_secs)
    }

    pub fn movers_ttl(&self) -> Duration {
        Duration::from_secs(self.movers_ttl_secs)
    }

    pub fn history_ttl(&self) -> Duration {
        Duration::from_secs(self.history_ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            analysis_ttl_secs: 15 * 60,
            snapshot_ttl_secs: 60 * 60,
            movers_ttl_secs: 5 * 60,
            history_ttl_secs: 15 * 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            max_retries: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    pub top_n: usize,
    /// Calendar days of history fetched per symbol; enough to span a weekend.
    pub lookback_days: u32,
    pub universe: Vec<UniverseEntry>,
}

impl RankingConfig {
    pub fn universe(&self) -> Universe {
        Universe {
            members: self.universe.clone(),
        }
    }
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            top_n: 10,
            lookback_days: 5,
            universe: Universe::nifty_large_caps().members,
        }
    }
}

impl DashboardConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ind = &self.indicators;
        let periods = [
            ("ema_fast", ind.ema_fast),
            ("ema_slow", ind.ema_slow),
            ("rsi", ind.rsi),
            ("macd_fast", ind.macd_fast),
            ("macd_signal", ind.macd_signal),
            ("atr", ind.atr),
            ("adx", ind.adx),
            ("bollinger_period", ind.bollinger_period),
        ];
        if let Some((name, _)) = periods.iter().find(|(_, p)| *p == 0) {
            return Err(ConfigError::Invalid(format!("indicators.{name} must be >= 1")));
        }
        if ind.macd_fast >= ind.macd_slow {
            return Err(ConfigError::Invalid(
                "indicators.macd_fast must be shorter than macd_slow".into(),
            ));
        }
        if self.history.min_bars < 2 {
            return Err(ConfigError::Invalid("history.min_bars must be >= 2".into()));
        }
        if self.levels.swing_window == 0 {
            return Err(ConfigError::Invalid("levels.swing_window must be >= 1".into()));
        }
        if !self.levels.stop_atr_multiple.is_finite() || self.levels.stop_atr_multiple < 0.0 {
            return Err(ConfigError::Invalid(
                "levels.stop_atr_multiple must be a non-negative number".into(),
            ));
        }
        if self.ranking.top_n == 0 {
            return Err(ConfigError::Invalid("ranking.top_n must be >= 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_default() {
        let config = DashboardConfig::from_toml("").unwrap();
        assert_eq!(config, DashboardConfig::default());
        assert_eq!(config.history.min_bars, 30);
        assert_eq!(config.levels.fib_ratios, vec![0.618, 1.0]);
        assert_eq!(config.cache.analysis_ttl(), Duration::from_secs(900));
        assert_eq!(config.provider.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config = DashboardConfig::from_toml(
            r#"
            [levels]
            stop_atr_multiple = 2.0

            [display]
            unit = "lakh"
            "#,
        )
        .unwrap();
        assert_eq!(config.levels.stop_atr_multiple, 2.0);
        assert_eq!(config.levels.swing_window, 5);
        assert_eq!(config.display.unit, DomesticUnit::Lakh);
        assert_eq!(config.display.domestic_currency, "INR");
    }

    #[test]
    fn toml_roundtrip() {
        let config = DashboardConfig::default();
        let parsed = DashboardConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn custom_universe() {
        let config = DashboardConfig::from_toml(
            r#"
            [ranking]
            top_n = 3

            [[ranking.universe]]
            symbol = "AAPL"
            name = "Apple"
            "#,
        )
        .unwrap();
        assert_eq!(config.ranking.top_n, 3);
        assert_eq!(config.ranking.universe().symbols(), vec!["AAPL"]);
    }

    #[test]
    fn rejects_inverted_macd() {
        let err = DashboardConfig::from_toml("[indicators]\nmacd_fast = 30\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_zero_period() {
        let err = DashboardConfig::from_toml("[indicators]\nrsi = 0\n").unwrap_err();
        assert!(err.to_string().contains("indicators.rsi"));
    }

    #[test]
    fn rejects_unknown_unit() {
        let err = DashboardConfig::from_toml("[display]\nunit = \"million\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = DashboardConfig::from_file(Path::new("/nonexistent/swingdash.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
