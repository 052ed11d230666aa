//! Typed view of provider metadata.
//!
//! Every field is independently optional. Numeric fields go through
//! [`coerce_f64`], so a provider that sends `"12.5%"`, `{"raw": 0.125}` or a
//! plain number all land in the same place and anything unreadable is `None`.

use crate::data::Metadata;
use crate::format::{coerce_f64, coerce_string};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FundamentalsRecord {
    pub company: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub country: Option<String>,
    pub currency: Option<String>,
    pub market_cap: Option<f64>,
    pub enterprise_value: Option<f64>,
    pub trailing_pe: Option<f64>,
    pub forward_pe: Option<f64>,
    pub peg: Option<f64>,
    pub price_to_book: Option<f64>,
    pub ev_to_ebitda: Option<f64>,
    /// Fractions, e.g. 0.012 for 1.2%.
    pub dividend_yield: Option<f64>,
    pub payout_ratio: Option<f64>,
    pub revenue_growth: Option<f64>,
    pub earnings_growth: Option<f64>,
    pub profit_margin: Option<f64>,
    pub operating_margin: Option<f64>,
    pub gross_margin: Option<f64>,
    pub roe: Option<f64>,
    pub roa: Option<f64>,
    /// In the provider's own units (Yahoo reports percent, e.g. 45.2).
    pub debt_to_equity: Option<f64>,
    pub current_ratio: Option<f64>,
    pub quick_ratio: Option<f64>,
    pub total_debt: Option<f64>,
    pub total_cash: Option<f64>,
    pub free_cash_flow: Option<f64>,
    pub beta: Option<f64>,
}

impl FundamentalsRecord {
    pub fn from_metadata(meta: &Metadata) -> Self {
        let num = |key: &str| meta.get(key).and_then(coerce_f64);
        let text = |key: &str| meta.get(key).and_then(coerce_string);

        Self {
            company: text("longName").or_else(|| text("shortName")),
            sector: text("sector"),
            industry: text("industry"),
            country: text("country"),
            currency: text("currency").or_else(|| text("financialCurrency")),
            market_cap: num("marketCap"),
            enterprise_value: num("enterpriseValue"),
            trailing_pe: num("trailingPE"),
            forward_pe: num("forwardPE"),
            peg: num("pegRatio").or_else(|| num("trailingPegRatio")),
            price_to_book: num("priceToBook"),
            ev_to_ebitda: num("enterpriseToEbitda"),
            dividend_yield: num("dividendYield"),
            payout_ratio: num("payoutRatio"),
            revenue_growth: num("revenueGrowth"),
            earnings_growth: num("earningsGrowth"),
            profit_margin: num("profitMargins"),
            operating_margin: num("operatingMargins"),
            gross_margin: num("grossMargins"),
            roe: num("returnOnEquity"),
            roa: num("returnOnAssets"),
            debt_to_equity: num("debtToEquity"),
            current_ratio: num("currentRatio"),
            quick_ratio: num("quickRatio"),
            total_debt: num("totalDebt"),
            total_cash: num("totalCash"),
            free_cash_flow: num("freeCashflow"),
            beta: num("beta"),
        }
    }

    /// Free cash flow over market cap; `None` when either is missing or the cap is zero.
    pub fn fcf_yield(&self) -> Option<f64> {
        let cap = self.market_cap.filter(|c| *c != 0.0)?;
        Some(self.free_cash_flow? / cap)
    }

    /// True when the provider sent nothing usable.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
