//! Fundamentals: typed record, six-point score, display rows.

pub mod record;
pub mod score;

pub use record::FundamentalsRecord;
pub use score::{FundamentalScore, Rating, MAX_SCORE};

use crate::config::DisplayConfig;
use crate::format::{display_or_na, format_big_value, format_pct, ratio_to_pct};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Scored fundamentals plus the rows shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FundamentalsSnapshot {
    pub record: FundamentalsRecord,
    pub score: FundamentalScore,
    /// `(label, rendered value)`; absent values render as `"NA"`.
    pub rows: Vec<(String, String)>,
    pub as_of: DateTime<Utc>,
}

impl FundamentalsSnapshot {
    pub fn build(record: FundamentalsRecord, display: &DisplayConfig, as_of: DateTime<Utc>) -> Self {
        let score = FundamentalScore::evaluate(&record);
        let rows = display_rows(&record, &score, display);
        Self {
            record,
            score,
            rows,
            as_of,
        }
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.rows
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| v.as_str())
    }
}

fn display_rows(
    r: &FundamentalsRecord,
    score: &FundamentalScore,
    display: &DisplayConfig,
) -> Vec<(String, String)> {
    let text = |v: &Option<String>| v.clone().unwrap_or_else(|| "NA".into());
    let money = |v: Option<f64>| {
        format_big_value(v, r.currency.as_deref(), display.unit, &display.domestic_currency)
            .unwrap_or_else(|| "NA".into())
    };
    let pct = |v: Option<f64>| {
        v.and_then(ratio_to_pct)
            .map(format_pct)
            .unwrap_or_else(|| "NA".into())
    };
    let num = display_or_na;

    let rows = [
        ("Company", text(&r.company)),
        ("Sector", text(&r.sector)),
        ("Industry", text(&r.industry)),
        ("Country", text(&r.country)),
        ("Currency", text(&r.currency)),
        ("Market Cap", money(r.market_cap)),
        ("Enterprise Value", money(r.enterprise_value)),
        ("P/E (TTM)", num(r.trailing_pe)),
        ("Forward P/E", num(r.forward_pe)),
        ("PEG", num(r.peg)),
        ("Price/Book", num(r.price_to_book)),
        ("EV/EBITDA", num(r.ev_to_ebitda)),
        ("Dividend Yield", pct(r.dividend_yield)),
        ("Payout Ratio", pct(r.payout_ratio)),
        ("Revenue Growth", pct(r.revenue_growth)),
        ("Earnings Growth", pct(r.earnings_growth)),
        ("Profit Margin", pct(r.profit_margin)),
        ("Operating Margin", pct(r.operating_margin)),
        ("Gross Margin", pct(r.gross_margin)),
        ("ROE", pct(r.roe)),
        ("ROA", pct(r.roa)),
        ("Debt/Equity", num(r.debt_to_equity)),
        ("Current Ratio", num(r.current_ratio)),
        ("Quick Ratio", num(r.quick_ratio)),
        ("Total Debt", money(r.total_debt)),
        ("Total Cash", money(r.total_cash)),
        ("Free Cash Flow", money(r.free_cash_flow)),
        ("FCF Yield", pct(r.fcf_yield())),
        ("Beta", num(r.beta)),
        ("Score", score.to_string()),
    ];
    rows.into_iter().map(|(l, v)| (l.to_string(), v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::DomesticUnit;
    use chrono::TimeZone;

    fn as_of() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 3, 10, 30, 0).unwrap()
    }

    fn inr_record() -> FundamentalsRecord {
        FundamentalsRecord {
            company: Some("Infosys Limited".into()),
            currency: Some("INR".into()),
            market_cap: Some(6.5e12),
            trailing_pe: Some(24.5),
            roe: Some(0.31),
            free_cash_flow: Some(2.3e11),
            ..Default::default()
        }
    }

    #[test]
    fn domestic_values_use_indian_grouping() {
        let snap = FundamentalsSnapshot::build(inr_record(), &DisplayConfig::default(), as_of());
        assert_eq!(snap.get("Market Cap"), Some("6,50,000.00 Cr"));
        assert_eq!(snap.get("ROE"), Some("31.00%"));
        assert_eq!(snap.get("P/E (TTM)"), Some("24.50"));
        assert_eq!(snap.get("Beta"), Some("NA"));
    }

    #[test]
    fn lakh_unit() {
        let display = DisplayConfig {
            unit: DomesticUnit::Lakh,
            ..Default::default()
        };
        let snap = FundamentalsSnapshot::build(inr_record(), &display, as_of());
        assert_eq!(snap.get("Market Cap"), Some("6,50,00,000.00 L"));
    }

    #[test]
    fn foreign_values_use_magnitude_suffix() {
        let record = FundamentalsRecord {
            currency: Some("USD".into()),
            market_cap: Some(2.95e12),
            total_cash: Some(1_500_000.0),
            ..Default::default()
        };
        let snap = FundamentalsSnapshot::build(record, &DisplayConfig::default(), as_of());
        assert_eq!(snap.get("Market Cap"), Some("2.95T"));
        assert_eq!(snap.get("Total Cash"), Some("1.50M"));
        assert_eq!(snap.get("Total Debt"), Some("NA"));
    }

    #[test]
    fn score_row_and_fcf_yield() {
        let snap = FundamentalsSnapshot::build(inr_record(), &DisplayConfig::default(), as_of());
        // ROE passes, FCF yield 2.3e11 / 6.5e12 = 3.54% fails, P/E fails
        assert_eq!(snap.score.score, 1);
        assert_eq!(snap.get("Score"), Some("1/6 (Weak)"));
        assert_eq!(snap.get("FCF Yield"), Some("3.54%"));
        assert_eq!(snap.as_of, as_of());
    }
}
