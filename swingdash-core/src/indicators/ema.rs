//! Exponential Moving Average (EMA).
//!
//! Two flavours, both with alpha = 2 / (period + 1):
//! - Recursive: EMA[0] = x[0], then EMA[t] = alpha * x[t] + (1 - alpha) * EMA[t-1],
//!   reported once `period` observations have been folded in. Lookback: period - 1.
//!   Used as the building block of MACD; RSI runs the same recursion with
//!   Wilder's alpha = 1 / period.
//! - Adjusted: weighted mean of every observation since the series start with
//!   weights (1 - alpha)^age, normalised by the sum of weights. Defined from the
//!   first bar, no padding before the series start. Lookback: 0.
//!   Used for the fast/slow trend averages.

use super::Indicator;
use crate::domain::Bar;

/// How the average is started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmaMode {
    Recursive,
    Adjusted,
}

#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    mode: EmaMode,
    name: String,
}

impl Ema {
    /// Recursive EMA seeded with the first close.
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "EMA period must be >= 1");
        Self {
            period,
            mode: EmaMode::Recursive,
            name: format!("ema_{period}"),
        }
    }

    /// Adjusted (bias-corrected) EMA over a span.
    pub fn adjusted(span: usize) -> Self {
        assert!(span >= 1, "EMA span must be >= 1");
        Self {
            period: span,
            mode: EmaMode::Adjusted,
            name: format!("ewm_{span}"),
        }
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        match self.mode {
            EmaMode::Recursive => self.period.saturating_sub(1),
            EmaMode::Adjusted => 0,
        }
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        match self.mode {
            EmaMode::Recursive => ema_of_series(&closes, self.period),
            EmaMode::Adjusted => adjusted_ema_of_series(&closes, self.period),
        }
    }
}

/// Recursive EMA of an arbitrary series with alpha = 2 / (period + 1).
pub fn ema_of_series(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 {
        return vec![f64::NAN; values.len()];
    }
    recursive_ewm(values, 2.0 / (period as f64 + 1.0), period)
}

/// `y[t] = alpha * x[t] + (1 - alpha) * y[t-1]`, seeded with the first defined
/// value and reported once `min_periods` observations have been seen.
///
/// Leading NaN values are skipped, so the EMA of a series that itself has a
/// warm-up (e.g. the MACD line) starts at its first defined value. NaN after
/// the start taints the rest.
pub fn recursive_ewm(values: &[f64], alpha: f64, min_periods: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    let Some(start) = values.iter().position(|v| !v.is_nan()) else {
        return result;
    };

    let mut prev = values[start];
    for (seen, i) in (start..n).enumerate() {
        let x = values[i];
        if x.is_nan() {
            return result;
        }
        if i > start {
            prev = alpha * x + (1.0 - alpha) * prev;
        }
        if seen + 1 >= min_periods {
            result[i] = prev;
        }
    }

    result
}

/// Adjusted EMA: `sum(w_i * x_i) / sum(w_i)` with `w_i = (1 - alpha)^age`.
///
/// A NaN observation contributes nothing but still ages the earlier weights;
/// its output slot repeats the running mean (NaN before any observation).
pub fn adjusted_ema_of_series(values: &[f64], span: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if span == 0 {
        return result;
    }

    let alpha = 2.0 / (span as f64 + 1.0);
    let decay = 1.0 - alpha;
    let mut numerator = 0.0;
    let mut denominator = 0.0;

    for (i, &v) in values.iter().enumerate() {
        numerator *= decay;
        denominator *= decay;
        if !v.is_nan() {
            numerator += v;
            denominator += 1.0;
        }
        if denominator > 0.0 {
            result[i] = numerator / denominator;
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn ema_period_1_equals_close() {
        let bars = make_bars(&[100.0, 200.0, 300.0]);
        let result = Ema::new(1).compute(&bars);
        assert_approx(result[0], 100.0, DEFAULT_EPSILON);
        assert_approx(result[1], 200.0, DEFAULT_EPSILON);
        assert_approx(result[2], 300.0, DEFAULT_EPSILON);
    }

    #[test]
    fn ema_3_known_values() {
        // alpha = 0.5, seeded with the first close:
        // 10 → 10.5 → 11.25 (first reported) → 12.125 → 13.0625
        let bars = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0]);
        let result = Ema::new(3).compute(&bars);

        assert!(result[0].is_nan());
        assert!(result[1].is_nan());
        assert_approx(result[2], 11.25, DEFAULT_EPSILON);
        assert_approx(result[3], 12.125, DEFAULT_EPSILON);
        assert_approx(result[4], 13.0625, DEFAULT_EPSILON);
    }

    #[test]
    fn ema_nan_in_warmup_produces_all_nan() {
        let mut bars = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0]);
        bars[1].close = f64::NAN;
        let result = Ema::new(3).compute(&bars);
        assert!(result.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn ema_nan_after_warmup_propagates() {
        let mut bars = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0]);
        bars[3].close = f64::NAN;
        let result = Ema::new(3).compute(&bars);
        assert_approx(result[2], 11.25, DEFAULT_EPSILON);
        assert!(result[3].is_nan());
        assert!(result[4].is_nan());
    }

    #[test]
    fn ema_of_series_skips_leading_warmup() {
        let values = [f64::NAN, f64::NAN, 10.0, 11.0, 12.0, 13.0];
        let result = ema_of_series(&values, 3);
        assert!(result[..4].iter().all(|v| v.is_nan()));
        assert_approx(result[4], 11.25, DEFAULT_EPSILON);
        assert_approx(result[5], 12.125, DEFAULT_EPSILON);
    }

    #[test]
    fn recursive_ewm_min_periods_one_reports_seed() {
        let result = recursive_ewm(&[4.0, 8.0], 0.25, 1);
        assert_approx(result[0], 4.0, DEFAULT_EPSILON);
        assert_approx(result[1], 5.0, DEFAULT_EPSILON);
    }

    #[test]
    fn ema_lookback() {
        assert_eq!(Ema::new(20).lookback(), 19);
        assert_eq!(Ema::new(1).lookback(), 0);
        assert_eq!(Ema::adjusted(20).lookback(), 0);
    }

    #[test]
    fn adjusted_ema_defined_from_first_bar() {
        // span 3 → alpha 0.5, decay 0.5
        // [0] = 10
        // [1] = (20 + 0.5*10) / (1 + 0.5) = 16.666..
        // [2] = (30 + 0.5*20 + 0.25*10) / (1 + 0.5 + 0.25) = 42.5 / 1.75
        let bars = make_bars(&[10.0, 20.0, 30.0]);
        let result = Ema::adjusted(3).compute(&bars);
        assert_approx(result[0], 10.0, DEFAULT_EPSILON);
        assert_approx(result[1], 25.0 / 1.5, DEFAULT_EPSILON);
        assert_approx(result[2], 42.5 / 1.75, DEFAULT_EPSILON);
    }

    #[test]
    fn adjusted_ema_of_constant_is_constant() {
        let result = adjusted_ema_of_series(&[5.0; 40], 10);
        for v in result {
            assert_approx(v, 5.0, DEFAULT_EPSILON);
        }
    }

    #[test]
    fn adjusted_ema_nan_repeats_running_mean() {
        let result = adjusted_ema_of_series(&[f64::NAN, 4.0, f64::NAN, 4.0], 3);
        assert!(result[0].is_nan());
        assert_approx(result[1], 4.0, DEFAULT_EPSILON);
        assert_approx(result[2], 4.0, DEFAULT_EPSILON);
        assert_approx(result[3], 4.0, DEFAULT_EPSILON);
    }
}
