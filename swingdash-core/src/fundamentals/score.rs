//! Six-point fundamentals score.
//!
//! | Criterion           | Passes when                    |
//! |---------------------|--------------------------------|
//! | Reasonable P/E      | 0 < trailing P/E <= 20         |
//! | High ROE            | ROE >= 0.15                    |
//! | Moderate leverage   | debt/equity <= 150             |
//! | Healthy margin      | profit margin >= 0.10          |
//! | Revenue growth      | revenue growth >= 0.10         |
//! | FCF yield           | FCF / market cap >= 0.04       |
//!
//! A missing input scores nothing and raises no flag.

use super::record::FundamentalsRecord;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const MAX_SCORE: u8 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rating {
    Weak,
    Moderate,
    Strong,
}

impl Rating {
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=1 => Rating::Weak,
            2..=3 => Rating::Moderate,
            _ => Rating::Strong,
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rating::Weak => f.write_str("Weak"),
            Rating::Moderate => f.write_str("Moderate"),
            Rating::Strong => f.write_str("Strong"),
        }
    }
}

type Criterion = (&'static str, fn(&FundamentalsRecord) -> Option<bool>);

const CRITERIA: [Criterion; 6] = [
    ("Reasonable P/E", |r| r.trailing_pe.map(|pe| pe > 0.0 && pe <= 20.0)),
    ("High ROE (>=15%)", |r| r.roe.map(|roe| roe >= 0.15)),
    ("Moderate Leverage", |r| r.debt_to_equity.map(|de| de <= 150.0)),
    ("Healthy Profit Margin", |r| r.profit_margin.map(|m| m >= 0.10)),
    ("Strong Revenue Growth", |r| r.revenue_growth.map(|g| g >= 0.10)),
    ("Attractive FCF Yield", |r| r.fcf_yield().map(|y| y >= 0.04)),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundamentalScore {
    pub score: u8,
    pub rating: Rating,
    /// One entry per passed criterion, in criterion order.
    pub flags: Vec<String>,
}

impl FundamentalScore {
    pub fn evaluate(record: &FundamentalsRecord) -> Self {
        let flags: Vec<String> = CRITERIA
            .iter()
            .filter(|(_, test)| test(record) == Some(true))
            .map(|(flag, _)| flag.to_string())
            .collect();
        let score = flags.len() as u8;
        Self {
            score,
            rating: Rating::from_score(score),
            flags,
        }
    }
}

impl fmt::Display for FundamentalScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{MAX_SCORE} ({})", self.score, self.rating)
    }
}
