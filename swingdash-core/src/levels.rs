//! Price levels: floor-trader pivots, ATR stop, Fibonacci extension targets.
//!
//! # Formulas
//! ```text
//! P  = (H + L + C) / 3
//! R1 = 2P - L          S1 = 2P - H
//! R2 = P + (H - L)     S2 = P - (H - L)
//! R3 = H + 2(P - L)    S3 = L - 2(H - P)
//!
//! stop (Buy)  = C - m * ATR
//! stop (Sell) = C + m * ATR
//!
//! target (Buy)  = swing_high + r * (swing_high - swing_low)
//! target (Sell) = swing_low  - r * (swing_high - swing_low)
//! ```
//!
//! Stops and targets exist only for a directional signal. Hold yields no stop
//! and an empty target list.

use crate::config::LevelsConfig;
use crate::domain::Bar;
use crate::signal::Action;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PivotLevels {
    pub pivot: f64,
    pub r1: f64,
    pub r2: f64,
    pub r3: f64,
    pub s1: f64,
    pub s2: f64,
    pub s3: f64,
}

impl PivotLevels {
    pub fn from_bar(bar: &Bar) -> Self {
        let (h, l, c) = (bar.high, bar.low, bar.close);
        let p = (h + l + c) / 3.0;
        Self {
            pivot: p,
            r1: 2.0 * p - l,
            s1: 2.0 * p - h,
            r2: p + (h - l),
            s2: p - (h - l),
            r3: h + 2.0 * (p - l),
            s3: l - 2.0 * (h - p),
        }
    }

    /// Labelled levels from highest resistance to lowest support.
    pub fn rows(&self) -> [(&'static str, f64); 7] {
        [
            ("R3", self.r3),
            ("R2", self.r2),
            ("R1", self.r1),
            ("Pivot", self.pivot),
            ("S1", self.s1),
            ("S2", self.s2),
            ("S3", self.s3),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FibTarget {
    pub label: String,
    pub ratio: f64,
    pub price: f64,
}

/// Highest high and lowest low over the trailing `window` bars.
pub fn swing_range(bars: &[Bar], window: usize) -> Option<(f64, f64)> {
    let start = bars.len().saturating_sub(window);
    let tail = &bars[start..];
    if tail.is_empty() {
        return None;
    }
    let high = tail.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
    let low = tail.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
    Some((high, low))
}

/// ATR stop for a directional action; `None` for Hold or an undefined ATR.
pub fn stop_loss(action: Action, close: f64, atr: Option<f64>, multiple: f64) -> Option<f64> {
    let atr = atr.filter(|a| a.is_finite())?;
    match action {
        Action::Buy => Some(close - multiple * atr),
        Action::Sell => Some(close + multiple * atr),
        Action::Hold => None,
    }
}

/// Extension targets beyond the recent swing, one per ratio, in ratio order.
pub fn fibonacci_targets(action: Action, bars: &[Bar], window: usize, ratios: &[f64]) -> Vec<FibTarget> {
    if !action.is_directional() {
        return Vec::new();
    }
    let Some((high, low)) = swing_range(bars, window) else {
        return Vec::new();
    };
    let diff = high - low;

    ratios
        .iter()
        .enumerate()
        .map(|(i, &ratio)| {
            let price = match action {
                Action::Sell => low - ratio * diff,
                _ => high + ratio * diff,
            };
            FibTarget {
                label: format!("Target{} ({ratio:?})", i + 1),
                ratio,
                price,
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelSet {
    pub pivots: PivotLevels,
    pub stop_loss: Option<f64>,
    pub targets: Vec<FibTarget>,
}

impl LevelSet {
    /// Levels for the last bar of `bars`; `None` when there are no bars.
    pub fn compute(bars: &[Bar], action: Action, atr: Option<f64>, config: &LevelsConfig) -> Option<Self> {
        let latest = bars.last()?;
        Some(Self {
            pivots: PivotLevels::from_bar(latest),
            stop_loss: stop_loss(action, latest.close, atr, config.stop_atr_multiple),
            targets: fibonacci_targets(action, bars, config.swing_window, &config.fib_ratios),
        })
    }
}
