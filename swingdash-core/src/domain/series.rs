//! PriceSeries: cleaned, chronological bars for one resolved symbol.

use super::Bar;
use serde::{Deserialize, Serialize};

/// Minimum number of cleaned bars the signal pipeline needs.
pub const MIN_BARS: usize = 30;

/// Ordered bar sequence with strictly increasing dates and no void bars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    symbol: String,
    bars: Vec<Bar>,
}

impl PriceSeries {
    /// Clean raw provider bars into a series.
    ///
    /// Void bars are dropped, the rest sorted by date. When two bars share a
    /// date the later one in provider order wins.
    pub fn from_raw(symbol: impl Into<String>, mut bars: Vec<Bar>) -> Self {
        bars.retain(|b| !b.is_void());
        bars.sort_by_key(|b| b.date);

        let mut cleaned: Vec<Bar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match cleaned.last_mut() {
                Some(last) if last.date == bar.date => *last = bar,
                _ => cleaned.push(bar),
            }
        }

        Self {
            symbol: symbol.into(),
            bars: cleaned,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Most recent bar.
    pub fn latest(&self) -> Option<&Bar> {
        self.bars.last()
    }

    /// Bar before the most recent one.
    pub fn previous(&self) -> Option<&Bar> {
        self.bars.len().checked_sub(2).map(|i| &self.bars[i])
    }

    /// The trailing `n` bars (all of them if the series is shorter).
    pub fn tail(&self, n: usize) -> &[Bar] {
        let start = self.bars.len().saturating_sub(n);
        &self.bars[start..]
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }
}
