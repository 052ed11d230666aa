//! IndicatorFrame: a cleaned series plus one column per configured indicator.
//!
//! All columns are computed once, up front, with the same bar slice. Row
//! accessors turn warm-up NaN into `None`.

use super::macd::macd_of_series;
use super::{defined, Adx, Atr, Bollinger, Ema, Indicator, Rsi};
use crate::config::IndicatorConfig;
use crate::domain::{Bar, PriceSeries};
use serde::Serialize;

/// Too few cleaned bars to run the indicator engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("insufficient history for {symbol}: {bars} bars, need {required}")]
pub struct InsufficientHistory {
    pub symbol: String,
    pub bars: usize,
    pub required: usize,
}

/// Derived per-bar columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    EmaFast,
    EmaSlow,
    Rsi,
    Macd,
    MacdSignal,
    Atr,
    Adx,
    BbUpper,
    BbMiddle,
    BbLower,
}

impl Column {
    pub const ALL: [Column; 10] = [
        Column::EmaFast,
        Column::EmaSlow,
        Column::Rsi,
        Column::Macd,
        Column::MacdSignal,
        Column::Atr,
        Column::Adx,
        Column::BbUpper,
        Column::BbMiddle,
        Column::BbLower,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Column::EmaFast => "ema_fast",
            Column::EmaSlow => "ema_slow",
            Column::Rsi => "rsi",
            Column::Macd => "macd",
            Column::MacdSignal => "macd_signal",
            Column::Atr => "atr",
            Column::Adx => "adx",
            Column::BbUpper => "bb_upper",
            Column::BbMiddle => "bb_middle",
            Column::BbLower => "bb_lower",
        }
    }

    fn index(self) -> usize {
        self as usize
    }

    /// Single-line indicator behind the column. The two MACD lines come from
    /// one shared pass instead.
    fn indicator(self, config: &IndicatorConfig) -> Option<Box<dyn Indicator>> {
        let c = config;
        let indicator: Box<dyn Indicator> = match self {
            Column::EmaFast => Box::new(Ema::adjusted(c.ema_fast)),
            Column::EmaSlow => Box::new(Ema::adjusted(c.ema_slow)),
            Column::Rsi => Box::new(Rsi::new(c.rsi)),
            Column::Macd | Column::MacdSignal => return None,
            Column::Atr => Box::new(Atr::new(c.atr)),
            Column::Adx => Box::new(Adx::new(c.adx)),
            Column::BbUpper => Box::new(Bollinger::upper(c.bollinger_period, c.bollinger_std)),
            Column::BbMiddle => Box::new(Bollinger::middle(c.bollinger_period, c.bollinger_std)),
            Column::BbLower => Box::new(Bollinger::lower(c.bollinger_period, c.bollinger_std)),
        };
        Some(indicator)
    }
}

/// One bar with its indicator values; `None` means not yet defined.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IndicatorRow {
    pub bar: Bar,
    pub ema_fast: Option<f64>,
    pub ema_slow: Option<f64>,
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub atr: Option<f64>,
    pub adx: Option<f64>,
    pub bb_upper: Option<f64>,
    pub bb_middle: Option<f64>,
    pub bb_lower: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct IndicatorFrame {
    series: PriceSeries,
    columns: Vec<Vec<f64>>,
}

impl IndicatorFrame {
    /// Compute every column over `series`.
    ///
    /// Fails when the series has fewer than `min_bars` bars (never fewer than 2,
    /// since pattern and signal logic read the last two rows).
    pub fn compute(
        series: PriceSeries,
        config: &IndicatorConfig,
        min_bars: usize,
    ) -> Result<Self, InsufficientHistory> {
        let required = min_bars.max(2);
        if series.len() < required {
            return Err(InsufficientHistory {
                symbol: series.symbol().to_string(),
                bars: series.len(),
                required,
            });
        }

        let bars = series.bars();
        let (mut macd, mut macd_signal) = macd_of_series(
            &series.closes(),
            config.macd_fast,
            config.macd_slow,
            config.macd_signal,
        );
        let columns = Column::ALL
            .iter()
            .map(|&column| {
                let values = match column {
                    Column::Macd => std::mem::take(&mut macd),
                    Column::MacdSignal => std::mem::take(&mut macd_signal),
                    other => other
                        .indicator(config)
                        .map_or_else(|| vec![f64::NAN; bars.len()], |ind| ind.compute(bars)),
                };
                debug_assert_eq!(
                    values.len(),
                    bars.len(),
                    "column '{}' produced {} values for {} bars",
                    column.label(),
                    values.len(),
                    bars.len()
                );
                values
            })
            .collect();

        Ok(Self { series, columns })
    }

    pub fn series(&self) -> &PriceSeries {
        &self.series
    }

    pub fn symbol(&self) -> &str {
        self.series.symbol()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Raw column values, NaN during warm-up.
    pub fn column(&self, column: Column) -> &[f64] {
        &self.columns[column.index()]
    }

    pub fn value(&self, column: Column, i: usize) -> Option<f64> {
        self.columns[column.index()].get(i).copied().and_then(defined)
    }

    pub fn row(&self, i: usize) -> Option<IndicatorRow> {
        let bar = *self.series.bars().get(i)?;
        let v = |c: Column| self.value(c, i);
        Some(IndicatorRow {
            bar,
            ema_fast: v(Column::EmaFast),
            ema_slow: v(Column::EmaSlow),
            rsi: v(Column::Rsi),
            macd: v(Column::Macd),
            macd_signal: v(Column::MacdSignal),
            atr: v(Column::Atr),
            adx: v(Column::Adx),
            bb_upper: v(Column::BbUpper),
            bb_middle: v(Column::BbMiddle),
            bb_lower: v(Column::BbLower),
        })
    }

    pub fn latest(&self) -> Option<IndicatorRow> {
        self.len().checked_sub(1).and_then(|i| self.row(i))
    }

    pub fn previous(&self) -> Option<IndicatorRow> {
        self.len().checked_sub(2).and_then(|i| self.row(i))
    }

    /// The trailing `n` rows, oldest first.
    pub fn tail_rows(&self, n: usize) -> Vec<IndicatorRow> {
        let start = self.len().saturating_sub(n);
        (start..self.len()).filter_map(|i| self.row(i)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;

    fn series(n: usize) -> PriceSeries {
        let closes: Vec<f64> = (0..n)
            .map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0 + i as f64 * 0.3)
            .collect();
        PriceSeries::from_raw("TEST", make_bars(&closes))
    }

    #[test]
    fn rejects_short_series() {
        let err = IndicatorFrame::compute(series(29), &IndicatorConfig::default(), 30).unwrap_err();
        assert_eq!(
            err,
            InsufficientHistory {
                symbol: "TEST".into(),
                bars: 29,
                required: 30
            }
        );
    }

    #[test]
    fn min_bars_never_below_two() {
        let err = IndicatorFrame::compute(series(1), &IndicatorConfig::default(), 0).unwrap_err();
        assert_eq!(err.required, 2);
    }

    #[test]
    fn columns_match_series_length() {
        let frame = IndicatorFrame::compute(series(60), &IndicatorConfig::default(), 30).unwrap();
        for column in Column::ALL {
            assert_eq!(frame.column(column).len(), 60, "{}", column.label());
        }
    }

    #[test]
    fn latest_row_fully_defined_after_warmup() {
        let frame = IndicatorFrame::compute(series(60), &IndicatorConfig::default(), 30).unwrap();
        let row = frame.latest().unwrap();
        assert!(row.ema_fast.is_some());
        assert!(row.ema_slow.is_some());
        assert!(row.rsi.is_some());
        assert!(row.macd.is_some());
        assert!(row.macd_signal.is_some());
        assert!(row.atr.is_some());
        assert!(row.adx.is_some());
        assert!(row.bb_upper.is_some() && row.bb_lower.is_some());
        assert_eq!(row.bar, *frame.series().latest().unwrap());
    }

    #[test]
    fn warmup_rows_are_none() {
        let frame = IndicatorFrame::compute(series(30), &IndicatorConfig::default(), 30).unwrap();
        let first = frame.row(0).unwrap();
        // Adjusted EMAs are defined from the first bar.
        assert!(first.ema_fast.is_some());
        assert!(first.rsi.is_none());
        assert!(first.atr.is_none());
        // 30 bars is not enough for the 9-period signal of a 26-period MACD.
        assert!(frame.latest().unwrap().macd_signal.is_none());
        assert!(frame.latest().unwrap().macd.is_some());
    }

    #[test]
    fn macd_columns_come_from_one_pass() {
        let frame = IndicatorFrame::compute(series(60), &IndicatorConfig::default(), 30).unwrap();
        let c = IndicatorConfig::default();
        let (macd, signal) =
            macd_of_series(&frame.series().closes(), c.macd_fast, c.macd_slow, c.macd_signal);
        for i in 0..60 {
            assert_eq!(frame.value(Column::Macd, i), defined(macd[i]));
            assert_eq!(frame.value(Column::MacdSignal, i), defined(signal[i]));
        }
        assert!(Column::Macd.indicator(&c).is_none());
        assert!(Column::Rsi.indicator(&c).is_some());
    }

    #[test]
    fn previous_and_out_of_range() {
        let frame = IndicatorFrame::compute(series(40), &IndicatorConfig::default(), 30).unwrap();
        assert_eq!(frame.previous().unwrap().bar, frame.row(38).unwrap().bar);
        assert!(frame.row(40).is_none());
        assert_eq!(frame.tail_rows(5).len(), 5);
    }
}
