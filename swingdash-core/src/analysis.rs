//! End-to-end ticker analysis and the memoizing dashboard facade.

use crate::cache::{Clock, TtlCache};
use crate::compare::{compare_with, Comparison, CompareError};
use crate::config::DashboardConfig;
use crate::data::{Interval, Lookback, MarketDataProvider, Snapshot, SnapshotProvider};
use crate::domain::PriceSeries;
use crate::fundamentals::{FundamentalsRecord, FundamentalsSnapshot};
use crate::indicators::{IndicatorFrame, InsufficientHistory};
use crate::levels::LevelSet;
use crate::ranking::{MoverBoard, RankingEngine, ScanProgress};
use crate::resolver::{bare_code, sanitize, ResolutionFailure, SymbolResolver};
use crate::signal::{classify_tail, CandlePattern, Signal};
use chrono::Utc;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Resolution(#[from] ResolutionFailure),

    #[error(transparent)]
    InsufficientHistory(#[from] InsufficientHistory),
}

/// Indicators, pattern, vote and levels for one cleaned series.
#[derive(Debug, Clone)]
pub struct TechnicalAnalysis {
    pub frame: IndicatorFrame,
    pub pattern: CandlePattern,
    pub signal: Signal,
    pub levels: Option<LevelSet>,
}

/// The pure pipeline: frame -> pattern -> signal -> levels.
pub fn analyze_series(
    series: PriceSeries,
    config: &DashboardConfig,
) -> Result<TechnicalAnalysis, InsufficientHistory> {
    let frame = IndicatorFrame::compute(series, &config.indicators, config.history.min_bars)?;
    let bars = frame.series().bars();
    let pattern = classify_tail(bars);

    // compute() guarantees at least two rows
    let Some(latest) = frame.latest() else {
        return Err(InsufficientHistory {
            symbol: frame.symbol().to_string(),
            bars: 0,
            required: config.history.min_bars.max(2),
        });
    };
    let signal = Signal::from_row(&latest);
    let levels = LevelSet::compute(bars, signal.action, latest.atr, &config.levels);

    Ok(TechnicalAnalysis {
        frame,
        pattern,
        signal,
        levels,
    })
}

#[derive(Debug, Clone)]
pub struct AnalysisReport {
    /// What the user typed.
    pub input: String,
    pub resolved: String,
    pub attempts: Vec<String>,
    pub frame: IndicatorFrame,
    pub pattern: CandlePattern,
    pub signal: Signal,
    pub levels: Option<LevelSet>,
    /// `None` when metadata was unavailable.
    pub fundamentals: Option<FundamentalsSnapshot>,
    /// `None` when nothing could be scraped.
    pub screener: Option<Snapshot>,
}

impl AnalysisReport {
    pub fn close(&self) -> Option<f64> {
        self.frame.series().latest().map(|b| b.close)
    }

    /// Percent change of the last close over the one before it.
    pub fn change_pct(&self) -> Option<f64> {
        let series = self.frame.series();
        let (prev, last) = (series.previous()?, series.latest()?);
        (prev.close != 0.0).then(|| (last.close - prev.close) / prev.close * 100.0)
    }
}

/// Analyzer with injected providers and TTL-memoized results.
pub struct Dashboard<P, S> {
    provider: P,
    snapshots: S,
    config: DashboardConfig,
    reports: TtlCache<String, Arc<AnalysisReport>>,
    movers: TtlCache<(), Arc<MoverBoard>>,
}

impl<P: MarketDataProvider, S: SnapshotProvider> Dashboard<P, S> {
    pub fn new(provider: P, snapshots: S, config: DashboardConfig, clock: Arc<dyn Clock>) -> Self {
        let reports = TtlCache::new(config.cache.analysis_ttl(), clock.clone());
        let movers = TtlCache::new(config.cache.movers_ttl(), clock);
        Self {
            provider,
            snapshots,
            config,
            reports,
            movers,
        }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Analyze one ticker. Results are memoized per sanitized input.
    pub fn analyze(&self, input: &str) -> Result<Arc<AnalysisReport>, AnalysisError> {
        let key = sanitize(input);
        self.reports
            .try_get_or_insert_with(key, || self.analyze_uncached(input).map(Arc::new))
    }

    fn analyze_uncached(&self, input: &str) -> Result<AnalysisReport, AnalysisError> {
        let lookback = Lookback::Months(self.config.history.lookback_months);
        let resolved = SymbolResolver::new(&self.provider, &self.config.resolver)
            .resolve(input, lookback, Interval::Daily)?;

        let series = PriceSeries::from_raw(resolved.symbol.clone(), resolved.bars);
        debug!(symbol = %resolved.symbol, bars = series.len(), "cleaned series");
        let technical = analyze_series(series, &self.config)?;

        let fundamentals = self.fundamentals(&resolved.symbol);
        let screener = self.screener(&resolved.symbol);

        info!(
            symbol = %resolved.symbol,
            action = %technical.signal.action,
            strength = %technical.signal.strength,
            pattern = %technical.pattern,
            "analysis complete"
        );

        Ok(AnalysisReport {
            input: input.to_string(),
            resolved: resolved.symbol,
            attempts: resolved.attempts,
            frame: technical.frame,
            pattern: technical.pattern,
            signal: technical.signal,
            levels: technical.levels,
            fundamentals,
            screener,
        })
    }

    fn fundamentals(&self, symbol: &str) -> Option<FundamentalsSnapshot> {
        match self.provider.fetch_metadata(symbol) {
            Ok(meta) => {
                let record = FundamentalsRecord::from_metadata(&meta);
                if record.is_empty() {
                    debug!(symbol, "no fundamentals in metadata");
                    return None;
                }
                Some(FundamentalsSnapshot::build(record, &self.config.display, Utc::now()))
            }
            Err(e) => {
                warn!(symbol, error = %e, "fundamentals unavailable");
                None
            }
        }
    }

    /// Scraped snapshot for exchange-listed symbols only.
    fn screener(&self, symbol: &str) -> Option<Snapshot> {
        let code = bare_code(symbol, &self.config.resolver);
        if code == symbol {
            return None;
        }
        let snapshot = self.snapshots.fetch_snapshot(&code);
        if snapshot.is_empty() {
            debug!(code = %code, provider = self.snapshots.name(), "no scraped fundamentals");
            None
        } else {
            Some(snapshot)
        }
    }

    /// Rank the configured universe. Complete scans are memoized; cancelled
    /// ones are returned but not cached.
    pub fn movers(&self, progress: Option<&dyn ScanProgress>, cancel: Option<&AtomicBool>) -> Arc<MoverBoard> {
        if let Some(board) = self.movers.get(&()) {
            return board;
        }
        let board = Arc::new(
            RankingEngine::new(&self.provider, self.config.ranking.lookback_days).scan(
                &self.config.ranking.universe(),
                self.config.ranking.top_n,
                progress,
                cancel,
            ),
        );
        if !board.was_cancelled() {
            self.movers.insert((), board.clone());
        }
        board
    }

    pub fn compare<T: AsRef<str>>(&self, inputs: &[T]) -> Result<Comparison, CompareError> {
        compare_with(inputs, |ticker| self.analyze(ticker))
    }

    /// Drop every memoized result.
    pub fn clear_cache(&self) {
        self.reports.clear();
        self.movers.clear();
    }
}
