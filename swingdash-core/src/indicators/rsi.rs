//! Relative Strength Index (RSI).
//!
//! Up and down moves (both zero on the first bar) are each smoothed with the
//! recursive EMA at Wilder's alpha = 1 / period, seeded with the first move.
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss), and 100 whenever
//! avg_loss == 0 (a flat series included). Lookback: period - 1.

use super::ema::recursive_ewm;
use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: format!("rsi_{period}"),
        }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        rsi_of_series(&closes, self.period)
    }
}

/// RSI of an arbitrary price series. A NaN price taints every later value.
pub fn rsi_of_series(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 {
        return vec![f64::NAN; values.len()];
    }

    let moves = values
        .iter()
        .enumerate()
        .map(|(i, &v)| if i == 0 { 0.0 } else { v - values[i - 1] });
    let (gains, losses): (Vec<f64>, Vec<f64>) = moves
        .map(|ch| {
            if ch.is_nan() {
                (f64::NAN, f64::NAN)
            } else {
                (ch.max(0.0), (-ch).max(0.0))
            }
        })
        .unzip();

    let alpha = 1.0 / period as f64;
    let avg_gain = recursive_ewm(&gains, alpha, period);
    let avg_loss = recursive_ewm(&losses, alpha, period);

    avg_gain
        .iter()
        .zip(&avg_loss)
        .map(|(&g, &l)| strength_index(g, l))
        .collect()
}

fn strength_index(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_gain.is_nan() || avg_loss.is_nan() {
        f64::NAN
    } else if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}
