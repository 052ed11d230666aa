//! SwingDash core: swing-trading analytics for a single ticker.
//!
//! - Symbol resolution with exchange-suffix fallback
//! - Indicator frame (EMA, RSI, MACD, ATR, ADX, Bollinger) over cleaned daily bars
//! - Candle pattern and four-check majority vote
//! - Pivot, ATR stop and Fibonacci extension levels
//! - Six-point fundamentals score
//! - Daily gainers/losers over a fixed universe, multi-ticker comparison
//!
//! Providers sit behind [`data::MarketDataProvider`] and
//! [`data::SnapshotProvider`]; everything between them and the output is pure.

pub mod analysis;
pub mod cache;
pub mod compare;
pub mod config;
pub mod data;
pub mod domain;
pub mod format;
pub mod fundamentals;
pub mod indicators;
pub mod levels;
pub mod ranking;
pub mod resolver;
pub mod signal;

pub use analysis::{analyze_series, AnalysisError, AnalysisReport, Dashboard, TechnicalAnalysis};
pub use config::DashboardConfig;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: shared types stay Send + Sync so a dashboard can
    /// sit behind an `Arc` in a worker thread.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::Bar>();
        require_sync::<domain::Bar>();
        require_send::<domain::PriceSeries>();
        require_sync::<domain::PriceSeries>();
        require_send::<indicators::IndicatorFrame>();
        require_sync::<indicators::IndicatorFrame>();
        require_send::<signal::Signal>();
        require_sync::<signal::Signal>();
        require_send::<levels::LevelSet>();
        require_sync::<levels::LevelSet>();
        require_send::<fundamentals::FundamentalsSnapshot>();
        require_sync::<fundamentals::FundamentalsSnapshot>();
        require_send::<ranking::MoverBoard>();
        require_sync::<ranking::MoverBoard>();
        require_send::<AnalysisReport>();
        require_sync::<AnalysisReport>();

        require_send::<data::YahooProvider>();
        require_sync::<data::YahooProvider>();
        require_send::<data::ScreenerProvider>();
        require_sync::<data::ScreenerProvider>();
        require_send::<data::CachedProvider<data::SyntheticProvider>>();
        require_sync::<data::CachedProvider<data::SyntheticProvider>>();
        require_send::<Dashboard<data::CsvProvider, data::NullSnapshotProvider>>();
        require_sync::<Dashboard<data::CsvProvider, data::NullSnapshotProvider>>();
    }
}
