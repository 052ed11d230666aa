//! Two-candle pattern classification on the latest bar.
//!
//! First match wins, in this order: bullish engulfing, bearish engulfing,
//! hammer, shooting star.

use crate::domain::Bar;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Added to the high-low range so a zero-range bar never divides by zero.
pub const RANGE_EPSILON: f64 = 1e-9;

/// Range must exceed this many bodies for a hammer or shooting star.
const WICK_BODY_RATIO: f64 = 3.0;

/// Share of the range the close must sit away from the opposite extreme.
const WICK_SHARE: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CandlePattern {
    BullishEngulfing,
    BearishEngulfing,
    Hammer,
    ShootingStar,
    None,
}

impl CandlePattern {
    pub fn is_none(self) -> bool {
        self == CandlePattern::None
    }
}

impl fmt::Display for CandlePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CandlePattern::BullishEngulfing => "Bullish Engulfing",
            CandlePattern::BearishEngulfing => "Bearish Engulfing",
            CandlePattern::Hammer => "Hammer",
            CandlePattern::ShootingStar => "Shooting Star",
            CandlePattern::None => "None",
        };
        f.write_str(label)
    }
}

fn bullish_engulfing(previous: &Bar, latest: &Bar) -> bool {
    latest.is_gain()
        && previous.is_loss()
        && latest.close > previous.open
        && latest.open < previous.close
}

fn bearish_engulfing(previous: &Bar, latest: &Bar) -> bool {
    latest.is_loss()
        && previous.is_gain()
        && latest.open > previous.close
        && latest.close < previous.open
}

fn long_wicked(bar: &Bar) -> bool {
    bar.range() > WICK_BODY_RATIO * bar.body()
}

fn hammer(bar: &Bar) -> bool {
    long_wicked(bar) && (bar.close - bar.low) / (bar.range() + RANGE_EPSILON) > WICK_SHARE
}

fn shooting_star(bar: &Bar) -> bool {
    long_wicked(bar) && (bar.high - bar.close) / (bar.range() + RANGE_EPSILON) > WICK_SHARE
}

/// Classify the latest bar given the one before it.
pub fn classify(previous: &Bar, latest: &Bar) -> CandlePattern {
    if bullish_engulfing(previous, latest) {
        CandlePattern::BullishEngulfing
    } else if bearish_engulfing(previous, latest) {
        CandlePattern::BearishEngulfing
    } else if hammer(latest) {
        CandlePattern::Hammer
    } else if shooting_star(latest) {
        CandlePattern::ShootingStar
    } else {
        CandlePattern::None
    }
}

/// Classify the last two bars of a slice; fewer than two bars is `None`.
pub fn classify_tail(bars: &[Bar]) -> CandlePattern {
    match bars {
        [.., previous, latest] => classify(previous, latest),
        _ => CandlePattern::None,
    }
}
