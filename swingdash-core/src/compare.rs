//! Side-by-side comparison of 2-10 tickers.

use crate::analysis::{AnalysisError, AnalysisReport};
use crate::fundamentals::Rating;
use crate::resolver::sanitize;
use crate::signal::{Action, CandlePattern, Strength};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

pub const MIN_TICKERS: usize = 2;
pub const MAX_TICKERS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompareError {
    #[error("compare needs {MIN_TICKERS} to {MAX_TICKERS} distinct tickers, got {count}")]
    InvalidCount { count: usize },
}

/// Latest-bar figures for one successfully analyzed ticker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonMetrics {
    pub resolved: String,
    pub close: Option<f64>,
    pub change_pct: Option<f64>,
    pub rsi: Option<f64>,
    pub adx: Option<f64>,
    pub action: Action,
    pub strength: Strength,
    pub pattern: CandlePattern,
    pub pe: Option<f64>,
    pub score: Option<u8>,
    pub rating: Option<Rating>,
}

impl ComparisonMetrics {
    pub fn from_report(report: &AnalysisReport) -> Self {
        let latest = report.frame.latest();
        let fundamentals = report.fundamentals.as_ref();
        Self {
            resolved: report.resolved.clone(),
            close: report.close(),
            change_pct: report.change_pct(),
            rsi: latest.and_then(|r| r.rsi),
            adx: latest.and_then(|r| r.adx),
            action: report.signal.action,
            strength: report.signal.strength,
            pattern: report.pattern,
            pe: fundamentals.and_then(|f| f.record.trailing_pe),
            score: fundamentals.map(|f| f.score.score),
            rating: fundamentals.map(|f| f.score.rating),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub input: String,
    /// Metrics, or the reason the ticker is unavailable.
    pub outcome: Result<ComparisonMetrics, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Comparison {
    pub rows: Vec<ComparisonRow>,
}

impl Comparison {
    pub fn available(&self) -> impl Iterator<Item = &ComparisonMetrics> {
        self.rows.iter().filter_map(|r| r.outcome.as_ref().ok())
    }

    pub fn unavailable_count(&self) -> usize {
        self.rows.iter().filter(|r| r.outcome.is_err()).count()
    }
}

/// Sanitize, drop empties and de-duplicate, keeping first-seen order.
pub fn normalize_tickers<T: AsRef<str>>(inputs: &[T]) -> Result<Vec<String>, CompareError> {
    let mut tickers: Vec<String> = Vec::new();
    for raw in inputs {
        let ticker = sanitize(raw.as_ref());
        if !ticker.is_empty() && !tickers.contains(&ticker) {
            tickers.push(ticker);
        }
    }
    if !(MIN_TICKERS..=MAX_TICKERS).contains(&tickers.len()) {
        return Err(CompareError::InvalidCount {
            count: tickers.len(),
        });
    }
    Ok(tickers)
}

/// Run `analyze` for each ticker independently; one failure never aborts the rest.
pub fn compare_with<T, F>(inputs: &[T], mut analyze: F) -> Result<Comparison, CompareError>
where
    T: AsRef<str>,
    F: FnMut(&str) -> Result<Arc<AnalysisReport>, AnalysisError>,
{
    let rows = normalize_tickers(inputs)?
        .into_iter()
        .map(|ticker| {
            let outcome = analyze(&ticker)
                .map(|report| ComparisonMetrics::from_report(&report))
                .map_err(|e| e.to_string());
            ComparisonRow {
                input: ticker,
                outcome,
            }
        })
        .collect();
    Ok(Comparison { rows })
}
