//! Average True Range (ATR).
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|); the first
//! bar has no previous close and uses high-low.
//! ATR: Wilder smoothing, seeded with the mean of the first `period` true ranges.
//! Lookback: period - 1.

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    name: String,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ATR period must be >= 1");
        Self {
            period,
            name: format!("atr_{period}"),
        }
    }
}

/// True Range series.
pub fn true_range(bars: &[Bar]) -> Vec<f64> {
    let mut prev_close: Option<f64> = None;
    bars.iter()
        .map(|bar| {
            let hl = bar.high - bar.low;
            let tr = match prev_close {
                Some(pc) => hl.max((bar.high - pc).abs()).max((bar.low - pc).abs()),
                None => hl,
            };
            prev_close = Some(bar.close);
            tr
        })
        .collect()
}

/// Wilder smoothing: `s[t] = (s[t-1] * (period - 1) + x[t]) / period`.
///
/// The seed is the mean of the first run of `period` consecutive non-NaN values
/// and lands on the last index of that run. NaN after the seed taints the rest.
pub fn wilder_smooth(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 || n < period {
        return result;
    }

    let mut run = 0;
    let mut seed_end = None;
    for (i, v) in values.iter().enumerate() {
        run = if v.is_nan() { 0 } else { run + 1 };
        if run == period {
            seed_end = Some(i + 1);
            break;
        }
    }
    let Some(seed_end) = seed_end else {
        return result;
    };

    let p = period as f64;
    let seed = values[seed_end - period..seed_end].iter().sum::<f64>() / p;
    result[seed_end - 1] = seed;

    let mut prev = seed;
    for i in seed_end..n {
        if values[i].is_nan() {
            return result;
        }
        let smoothed = (prev * (p - 1.0) + values[i]) / p;
        result[i] = smoothed;
        prev = smoothed;
    }

    result
}

impl Indicator for Atr {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        wilder_smooth(&true_range(bars), self.period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_ohlc_bars, DEFAULT_EPSILON};

    #[test]
    fn true_range_basic() {
        let bars = make_ohlc_bars(&[
            (100.0, 105.0, 95.0, 102.0),  // TR = 105-95 = 10
            (102.0, 108.0, 100.0, 106.0), // TR = max(8, |108-102|, |100-102|) = 8
            (106.0, 107.0, 98.0, 99.0),   // TR = max(9, |107-106|, |98-106|) = 9
        ]);
        let tr = true_range(&bars);
        assert_approx(tr[0], 10.0, DEFAULT_EPSILON);
        assert_approx(tr[1], 8.0, DEFAULT_EPSILON);
        assert_approx(tr[2], 9.0, DEFAULT_EPSILON);
    }

    #[test]
    fn true_range_gap_up() {
        let bars = make_ohlc_bars(&[
            (98.0, 102.0, 97.0, 100.0),
            (110.0, 115.0, 108.0, 112.0), // TR = max(7, 15, 8) = 15
        ]);
        assert_approx(true_range(&bars)[1], 15.0, DEFAULT_EPSILON);
    }

    #[test]
    fn atr_period_3() {
        let bars = make_ohlc_bars(&[
            (100.0, 105.0, 95.0, 102.0),  // TR = 10
            (102.0, 108.0, 100.0, 106.0), // TR = 8
            (106.0, 107.0, 98.0, 99.0),   // TR = 9
            (99.0, 103.0, 97.0, 101.0),   // TR = 6
            (101.0, 106.0, 100.0, 105.0), // TR = 6
        ]);
        let result = Atr::new(3).compute(&bars);
        assert!(result[0].is_nan());
        assert!(result[1].is_nan());
        // Seed: mean(10, 8, 9) = 9
        // ATR[3] = (9*2 + 6)/3 = 8; ATR[4] = (8*2 + 6)/3 = 22/3
        assert_approx(result[2], 9.0, DEFAULT_EPSILON);
        assert_approx(result[3], 8.0, DEFAULT_EPSILON);
        assert_approx(result[4], 22.0 / 3.0, DEFAULT_EPSILON);
    }

    #[test]
    fn wilder_seed_skips_leading_nan() {
        let result = wilder_smooth(&[f64::NAN, 2.0, 4.0, 6.0], 2);
        assert!(result[0].is_nan());
        assert!(result[1].is_nan());
        assert_approx(result[2], 3.0, DEFAULT_EPSILON);
        assert_approx(result[3], 4.5, DEFAULT_EPSILON);
    }

    #[test]
    fn atr_non_negative() {
        let bars = make_ohlc_bars(&[
            (10.0, 11.0, 9.0, 10.5),
            (10.5, 10.5, 10.5, 10.5),
            (10.5, 12.0, 10.0, 11.0),
        ]);
        for v in Atr::new(2).compute(&bars).into_iter().filter(|v| !v.is_nan()) {
            assert!(v >= 0.0);
        }
    }

    #[test]
    fn atr_lookback() {
        assert_eq!(Atr::new(14).lookback(), 13);
    }
}
