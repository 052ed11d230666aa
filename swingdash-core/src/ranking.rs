//! Daily gainers/losers over a fixed universe.

use crate::data::{Interval, Lookback, MarketDataProvider, Universe};
use crate::domain::{Bar, PriceSeries};
use serde::Serialize;
use std::cmp::Ordering as CmpOrdering;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoverRecord {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub change: f64,
    pub change_pct: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MoverBoard {
    /// Every successful symbol, best to worst.
    pub ranked: Vec<MoverRecord>,
    pub gainers: Vec<MoverRecord>,
    /// Worst first.
    pub losers: Vec<MoverRecord>,
    pub failures: Vec<(String, String)>,
    /// Symbols not visited because the scan was cancelled.
    pub skipped: Vec<String>,
    pub total: usize,
}

impl MoverBoard {
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    pub fn was_cancelled(&self) -> bool {
        !self.skipped.is_empty()
    }
}

/// Last-session move from the final two cleaned bars.
pub fn mover_from_bars(symbol: &str, name: &str, bars: Vec<Bar>) -> Result<MoverRecord, String> {
    let series = PriceSeries::from_raw(symbol, bars);
    let (Some(prev), Some(last)) = (series.previous(), series.latest()) else {
        return Err(format!("need 2 bars, got {}", series.len()));
    };
    if prev.close == 0.0 {
        return Err("previous close is zero".to_string());
    }
    let change = last.close - prev.close;
    Ok(MoverRecord {
        symbol: symbol.to_string(),
        name: name.to_string(),
        price: last.close,
        change,
        change_pct: change / prev.close * 100.0,
    })
}

fn by_pct_desc(a: &MoverRecord, b: &MoverRecord) -> CmpOrdering {
    b.change_pct
        .partial_cmp(&a.change_pct)
        .unwrap_or(CmpOrdering::Equal)
        .then_with(|| a.symbol.cmp(&b.symbol))
}

fn by_pct_asc(a: &MoverRecord, b: &MoverRecord) -> CmpOrdering {
    a.change_pct
        .partial_cmp(&b.change_pct)
        .unwrap_or(CmpOrdering::Equal)
        .then_with(|| a.symbol.cmp(&b.symbol))
}

/// Sort descending by percent change (ties by symbol) and split off the
/// top and bottom `top_n`.
pub fn rank_movers(mut records: Vec<MoverRecord>, top_n: usize) -> (Vec<MoverRecord>, Vec<MoverRecord>, Vec<MoverRecord>) {
    records.sort_by(by_pct_desc);
    let gainers: Vec<MoverRecord> = records.iter().take(top_n).cloned().collect();
    let mut losers: Vec<MoverRecord> = records
        .iter()
        .skip(records.len().saturating_sub(top_n))
        .cloned()
        .collect();
    losers.sort_by(by_pct_asc);
    (records, gainers, losers)
}

/// Progress callbacks for a universe scan.
pub trait ScanProgress: Send {
    fn on_start(&self, symbol: &str, index: usize, total: usize);

    fn on_complete(&self, symbol: &str, index: usize, total: usize, result: &Result<(), String>);

    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize);
}

/// Reports scan progress through `tracing`.
pub struct LogProgress;

impl ScanProgress for LogProgress {
    fn on_start(&self, symbol: &str, index: usize, total: usize) {
        debug!("[{}/{}] fetching {symbol}", index + 1, total);
    }

    fn on_complete(&self, symbol: &str, _index: usize, _total: usize, result: &Result<(), String>) {
        if let Err(reason) = result {
            warn!(symbol, reason = %reason, "mover skipped");
        }
    }

    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize) {
        info!("movers scan complete: {succeeded}/{total} succeeded, {failed} failed");
    }
}

pub struct RankingEngine<'a, P: ?Sized> {
    provider: &'a P,
    lookback: Lookback,
}

impl<'a, P: MarketDataProvider + ?Sized> RankingEngine<'a, P> {
    pub fn new(provider: &'a P, lookback_days: u32) -> Self {
        Self {
            provider,
            lookback: Lookback::Days(lookback_days),
        }
    }

    /// Fetch every universe member and rank the ones that have two sessions.
    ///
    /// Setting `cancel` stops the scan before the next symbol; whatever was
    /// collected so far is still ranked.
    pub fn scan(
        &self,
        universe: &Universe,
        top_n: usize,
        progress: Option<&dyn ScanProgress>,
        cancel: Option<&AtomicBool>,
    ) -> MoverBoard {
        let total = universe.len();
        let mut records = Vec::new();
        let mut failures = Vec::new();
        let mut skipped = Vec::new();

        for (index, entry) in universe.members.iter().enumerate() {
            if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                skipped.extend(universe.members[index..].iter().map(|e| e.symbol.clone()));
                break;
            }
            if let Some(p) = progress {
                p.on_start(&entry.symbol, index, total);
            }

            let outcome = self
                .provider
                .fetch_history(&entry.symbol, self.lookback, Interval::Daily)
                .map_err(|e| e.to_string())
                .and_then(|bars| mover_from_bars(&entry.symbol, &entry.name, bars));

            let status = match outcome {
                Ok(record) => {
                    records.push(record);
                    Ok(())
                }
                Err(reason) => {
                    failures.push((entry.symbol.clone(), reason.clone()));
                    Err(reason)
                }
            };
            if let Some(p) = progress {
                p.on_complete(&entry.symbol, index, total, &status);
            }
        }

        if let Some(p) = progress {
            p.on_batch_complete(records.len(), failures.len(), total);
        }
        info!(
            ranked = records.len(),
            failed = failures.len(),
            skipped = skipped.len(),
            "movers ranked"
        );

        let (ranked, gainers, losers) = rank_movers(records, top_n);
        MoverBoard {
            ranked,
            gainers,
            losers,
            failures,
            skipped,
            total,
        }
    }
}
