//! Bollinger Bands: SMA(close, period) +/- multiplier * stddev(close, period).
//!
//! Population stddev (divide by N). Lookback: period - 1.

use super::Indicator;
use crate::domain::Bar;

/// Which band of the envelope an instance produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BollingerBand {
    Upper,
    Middle,
    Lower,
}

impl BollingerBand {
    fn label(self) -> &'static str {
        match self {
            BollingerBand::Upper => "upper",
            BollingerBand::Middle => "middle",
            BollingerBand::Lower => "lower",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Bollinger {
    period: usize,
    multiplier: f64,
    band: BollingerBand,
    name: String,
}

impl Bollinger {
    pub fn new(period: usize, multiplier: f64, band: BollingerBand) -> Self {
        assert!(period >= 1, "Bollinger period must be >= 1");
        Self {
            period,
            multiplier,
            band,
            name: format!("bb_{}_{period}", band.label()),
        }
    }

    pub fn upper(period: usize, multiplier: f64) -> Self {
        Self::new(period, multiplier, BollingerBand::Upper)
    }

    pub fn middle(period: usize, multiplier: f64) -> Self {
        Self::new(period, multiplier, BollingerBand::Middle)
    }

    pub fn lower(period: usize, multiplier: f64) -> Self {
        Self::new(period, multiplier, BollingerBand::Lower)
    }
}

/// Mean and population stddev of each trailing window; NaN in a window yields NaN.
fn window_stats(closes: &[f64], period: usize) -> Vec<Option<(f64, f64)>> {
    let n = closes.len();
    let mut stats = vec![None; n];
    if period == 0 || n < period {
        return stats;
    }

    let p = period as f64;
    for i in (period - 1)..n {
        let window = &closes[i + 1 - period..=i];
        if window.iter().any(|c| c.is_nan()) {
            continue;
        }
        let mean = window.iter().sum::<f64>() / p;
        let variance = window.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / p;
        stats[i] = Some((mean, variance.sqrt()));
    }
    stats
}

/// All three bands at once as `(upper, middle, lower)`.
pub fn bands_of_series(closes: &[f64], period: usize, multiplier: f64) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let stats = window_stats(closes, period);
    let pick = |f: &dyn Fn(f64, f64) -> f64| -> Vec<f64> {
        stats
            .iter()
            .map(|s| s.map_or(f64::NAN, |(mean, sd)| f(mean, sd)))
            .collect()
    };
    (
        pick(&|mean, sd| mean + multiplier * sd),
        pick(&|mean, _| mean),
        pick(&|mean, sd| mean - multiplier * sd),
    )
}

impl Indicator for Bollinger {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let (upper, middle, lower) = bands_of_series(&closes, self.period, self.multiplier);
        match self.band {
            BollingerBand::Upper => upper,
            BollingerBand::Middle => middle,
            BollingerBand::Lower => lower,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn middle_band_is_sma() {
        let bars = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0]);
        let result = Bollinger::middle(3, 2.0).compute(&bars);
        assert!(result[0].is_nan());
        assert!(result[1].is_nan());
        assert_approx(result[2], 11.0, DEFAULT_EPSILON);
        assert_approx(result[3], 12.0, DEFAULT_EPSILON);
    }

    #[test]
    fn population_stddev() {
        // window [10, 11, 12]: variance = 2/3
        let bars = make_bars(&[10.0, 11.0, 12.0]);
        let upper = Bollinger::upper(3, 2.0).compute(&bars);
        assert_approx(upper[2], 11.0 + 2.0 * (2.0_f64 / 3.0).sqrt(), DEFAULT_EPSILON);
    }

    #[test]
    fn bands_symmetric_and_ordered() {
        let closes = [10.0, 11.5, 12.0, 11.0, 14.0, 13.0];
        let (upper, middle, lower) = bands_of_series(&closes, 3, 2.0);
        for i in 2..closes.len() {
            assert_approx(upper[i] - middle[i], middle[i] - lower[i], DEFAULT_EPSILON);
            assert!(lower[i] <= middle[i] && middle[i] <= upper[i]);
        }
    }

    #[test]
    fn constant_price_zero_width() {
        let bars = make_bars(&[100.0, 100.0, 100.0, 100.0]);
        assert_approx(Bollinger::upper(3, 2.0).compute(&bars)[2], 100.0, DEFAULT_EPSILON);
        assert_approx(Bollinger::lower(3, 2.0).compute(&bars)[2], 100.0, DEFAULT_EPSILON);
    }

    #[test]
    fn nan_in_window_propagates() {
        let mut bars = make_bars(&[10.0, 11.0, 12.0, 13.0]);
        bars[2].close = f64::NAN;
        let result = Bollinger::upper(3, 2.0).compute(&bars);
        assert!(result[2].is_nan());
        assert!(result[3].is_nan());
    }

    #[test]
    fn lookback_and_name() {
        let bb = Bollinger::upper(20, 2.0);
        assert_eq!(bb.lookback(), 19);
        assert_eq!(bb.name(), "bb_upper_20");
    }
}
