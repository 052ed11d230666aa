//! MACD: EMA(fast) - EMA(slow) and its EMA(signal) smoothing.
//!
//! Both lines use the recursive EMA seeded with the first value and reported
//! after `period` observations. The signal line starts at the first defined
//! MACD value, so its lookback is `slow + signal - 2`.

use super::ema::ema_of_series;
use super::Indicator;
use crate::domain::Bar;

/// Which of the two MACD lines an instance produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacdLine {
    Macd,
    Signal,
}

#[derive(Debug, Clone)]
pub struct Macd {
    fast: usize,
    slow: usize,
    signal: usize,
    line: MacdLine,
    name: String,
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize, line: MacdLine) -> Self {
        assert!(fast >= 1 && signal >= 1, "MACD periods must be >= 1");
        assert!(fast < slow, "MACD fast period must be shorter than slow");
        let name = match line {
            MacdLine::Macd => format!("macd_{fast}_{slow}"),
            MacdLine::Signal => format!("macd_signal_{fast}_{slow}_{signal}"),
        };
        Self {
            fast,
            slow,
            signal,
            line,
            name,
        }
    }

    pub fn line(fast: usize, slow: usize, signal: usize) -> Self {
        Self::new(fast, slow, signal, MacdLine::Macd)
    }

    pub fn signal_line(fast: usize, slow: usize, signal: usize) -> Self {
        Self::new(fast, slow, signal, MacdLine::Signal)
    }
}

/// `(macd, signal)` over an arbitrary close series.
pub fn macd_of_series(closes: &[f64], fast: usize, slow: usize, signal: usize) -> (Vec<f64>, Vec<f64>) {
    let fast_ema = ema_of_series(closes, fast);
    let slow_ema = ema_of_series(closes, slow);
    let macd: Vec<f64> = fast_ema
        .iter()
        .zip(&slow_ema)
        .map(|(f, s)| f - s)
        .collect();
    let signal_line = ema_of_series(&macd, signal);
    (macd, signal_line)
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        match self.line {
            MacdLine::Macd => self.slow - 1,
            MacdLine::Signal => self.slow + self.signal - 2,
        }
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let (macd, signal) = macd_of_series(&closes, self.fast, self.slow, self.signal);
        match self.line {
            MacdLine::Macd => macd,
            MacdLine::Signal => signal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    fn ramp(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + i as f64).collect()
    }

    #[test]
    fn first_values_at_lookback() {
        let bars = make_bars(&ramp(40));
        let macd = Macd::line(12, 26, 9);
        let signal = Macd::signal_line(12, 26, 9);
        let m = macd.compute(&bars);
        let s = signal.compute(&bars);

        assert_eq!(macd.lookback(), 25);
        assert_eq!(signal.lookback(), 33);
        assert!(m[24].is_nan());
        assert!(!m[25].is_nan());
        assert!(s[32].is_nan());
        assert!(!s[33].is_nan());
    }

    #[test]
    fn linear_ramp_spread_converges() {
        // On x[t] = 100 + t a first-value-seeded EMA lags by
        // (p - 1) / 2 * (1 - ((p - 1) / (p + 1))^t).
        let bars = make_bars(&ramp(400));
        let m = Macd::line(12, 26, 9).compute(&bars);
        let lag = |p: f64, t: i32| (p - 1.0) / 2.0 * (1.0 - ((p - 1.0) / (p + 1.0)).powi(t));
        for t in [25, 30, 39] {
            assert_approx(m[t as usize], lag(26.0, t) - lag(12.0, t), 1e-9);
        }
        assert_approx(m[399], 7.0, 1e-6);
        let s = Macd::signal_line(12, 26, 9).compute(&bars);
        assert_approx(s[399], 7.0, 1e-6);
    }

    #[test]
    fn reference_values_on_short_series() {
        // 36 bars; reference from ewm(span, min_periods=span, adjust=False).
        let closes: Vec<f64> = (0..36)
            .map(|i| 100.0 + 3.0 * (0.5 * i as f64).sin() + 0.2 * i as f64)
            .collect();
        let (m, s) = macd_of_series(&closes, 12, 26, 9);
        assert!(m[24].is_nan());
        assert_approx(m[25], 0.594636521476, 1e-9);
        assert_approx(m[35], 0.795787631232, 1e-9);
        assert!(s[32].is_nan());
        assert_approx(s[33], 1.249533600529, 1e-9);
        assert_approx(s[35], 1.115142284237, 1e-9);
    }

    #[test]
    fn constant_price_is_zero() {
        let bars = make_bars(&[50.0; 40]);
        let (m, s) = macd_of_series(&bars.iter().map(|b| b.close).collect::<Vec<_>>(), 12, 26, 9);
        assert_approx(m[39], 0.0, DEFAULT_EPSILON);
        assert_approx(s[39], 0.0, DEFAULT_EPSILON);
    }

    #[test]
    fn short_series_has_no_signal() {
        let bars = make_bars(&ramp(30));
        let s = Macd::signal_line(12, 26, 9).compute(&bars);
        assert!(s.iter().all(|v| v.is_nan()));
    }
}
