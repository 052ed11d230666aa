//! Four-check majority vote on the latest indicator row.
//!
//! Each check casts at most one vote. A check whose inputs are undefined
//! abstains. Buy wins on more buy votes, Sell on more sell votes, anything
//! else (ties, no votes) is Hold.

use crate::indicators::IndicatorRow;
use serde::{Deserialize, Serialize};
use std::fmt;

/// RSI above this votes Buy.
pub const RSI_BUY_ABOVE: f64 = 60.0;
/// RSI below this votes Sell.
pub const RSI_SELL_BELOW: f64 = 40.0;
/// ADX above this confirms the moving-average direction.
pub const ADX_TREND_ABOVE: f64 = 25.0;

/// Final direction of the vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Buy,
    Sell,
    Hold,
}

impl Action {
    pub fn is_directional(self) -> bool {
        matches!(self, Action::Buy | Action::Sell)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Buy => f.write_str("Buy"),
            Action::Sell => f.write_str("Sell"),
            Action::Hold => f.write_str("Hold"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Vote {
    Buy,
    Sell,
}

/// The four independent checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Check {
    /// Fast EMA against slow EMA.
    MaCross,
    Rsi,
    /// MACD line against its signal line.
    Macd,
    /// ADX trend strength confirming the EMA direction.
    AdxTrend,
}

impl Check {
    pub const ALL: [Check; 4] = [Check::MaCross, Check::Rsi, Check::Macd, Check::AdxTrend];

    pub fn label(self) -> &'static str {
        match self {
            Check::MaCross => "EMA cross",
            Check::Rsi => "RSI",
            Check::Macd => "MACD",
            Check::AdxTrend => "ADX trend",
        }
    }

    /// The vote this check casts for `row`, if any.
    pub fn cast(self, row: &IndicatorRow) -> Option<Vote> {
        match self {
            Check::MaCross => compare(row.ema_fast?, row.ema_slow?),
            Check::Rsi => {
                let rsi = row.rsi?;
                if rsi > RSI_BUY_ABOVE {
                    Some(Vote::Buy)
                } else if rsi < RSI_SELL_BELOW {
                    Some(Vote::Sell)
                } else {
                    None
                }
            }
            Check::Macd => compare(row.macd?, row.macd_signal?),
            Check::AdxTrend => {
                if row.adx? > ADX_TREND_ABOVE {
                    compare(row.ema_fast?, row.ema_slow?)
                } else {
                    None
                }
            }
        }
    }
}

fn compare(line: f64, reference: f64) -> Option<Vote> {
    if line > reference {
        Some(Vote::Buy)
    } else if line < reference {
        Some(Vote::Sell)
    } else {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ballot {
    pub check: Check,
    pub vote: Option<Vote>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTally {
    pub buy: u32,
    pub sell: u32,
}

impl VoteTally {
    pub fn from_ballots(ballots: &[Ballot]) -> Self {
        ballots.iter().fold(Self::default(), |mut tally, b| {
            match b.vote {
                Some(Vote::Buy) => tally.buy += 1,
                Some(Vote::Sell) => tally.sell += 1,
                None => {}
            }
            tally
        })
    }

    pub fn total(&self) -> u32 {
        self.buy + self.sell
    }

    pub fn action(&self) -> Action {
        use std::cmp::Ordering;
        match self.buy.cmp(&self.sell) {
            Ordering::Greater => Action::Buy,
            Ordering::Less => Action::Sell,
            Ordering::Equal => Action::Hold,
        }
    }
}

/// Confidence label. Directional variants carry the winning votes out of all cast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strength {
    StrongBuy { votes: u32, total: u32 },
    WeakBuy { votes: u32, total: u32 },
    StrongSell { votes: u32, total: u32 },
    WeakSell { votes: u32, total: u32 },
    Neutral,
}

impl Strength {
    pub fn from_tally(tally: &VoteTally) -> Self {
        let total = tally.total();
        if total == 0 {
            return Strength::Neutral;
        }
        // winning share >= 0.75, in integers
        let strong = |votes: u32| 4 * votes >= 3 * total;
        match tally.action() {
            Action::Buy if strong(tally.buy) => Strength::StrongBuy {
                votes: tally.buy,
                total,
            },
            Action::Buy => Strength::WeakBuy {
                votes: tally.buy,
                total,
            },
            Action::Sell if strong(tally.sell) => Strength::StrongSell {
                votes: tally.sell,
                total,
            },
            Action::Sell => Strength::WeakSell {
                votes: tally.sell,
                total,
            },
            Action::Hold => Strength::Neutral,
        }
    }

    pub fn is_strong(&self) -> bool {
        matches!(self, Strength::StrongBuy { .. } | Strength::StrongSell { .. })
    }
}

impl fmt::Display for Strength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strength::StrongBuy { votes, total } => write!(f, "Strong Buy ({votes}/{total})"),
            Strength::WeakBuy { votes, total } => write!(f, "Weak Buy ({votes}/{total})"),
            Strength::StrongSell { votes, total } => write!(f, "Strong Sell ({votes}/{total})"),
            Strength::WeakSell { votes, total } => write!(f, "Weak Sell ({votes}/{total})"),
            Strength::Neutral => f.write_str("Neutral"),
        }
    }
}

/// Outcome of the vote on one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signal {
    pub action: Action,
    pub strength: Strength,
    pub tally: VoteTally,
    pub ballots: Vec<Ballot>,
}

impl Signal {
    pub fn from_row(row: &IndicatorRow) -> Self {
        let ballots: Vec<Ballot> = Check::ALL
            .iter()
            .map(|&check| Ballot {
                check,
                vote: check.cast(row),
            })
            .collect();
        let tally = VoteTally::from_ballots(&ballots);
        Self {
            action: tally.action(),
            strength: Strength::from_tally(&tally),
            tally,
            ballots,
        }
    }
}
