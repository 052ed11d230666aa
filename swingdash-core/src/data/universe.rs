//! Ranking universe: the fixed list of large-cap symbols scanned for movers.
//!
//! Stored as TOML (`[[members]]` tables with `symbol` and `name`) so the list
//! can be swapped without a rebuild. Symbols are exchange-qualified.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// One scanned instrument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniverseEntry {
    pub symbol: String,
    pub name: String,
}

impl UniverseEntry {
    pub fn new(symbol: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            name: name.into(),
        }
    }
}

/// The complete scan universe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Universe {
    pub members: Vec<UniverseEntry>,
}

const NIFTY_LARGE_CAPS: &[(&str, &str)] = &[
    ("RELIANCE.NS", "Reliance Industries"),
    ("TCS.NS", "Tata Consultancy Services"),
    ("HDFCBANK.NS", "HDFC Bank"),
    ("ICICIBANK.NS", "ICICI Bank"),
    ("INFY.NS", "Infosys"),
    ("BHARTIARTL.NS", "Bharti Airtel"),
    ("HINDUNILVR.NS", "Hindustan Unilever"),
    ("ITC.NS", "ITC"),
    ("SBIN.NS", "State Bank of India"),
    ("LT.NS", "Larsen & Toubro"),
    ("KOTAKBANK.NS", "Kotak Mahindra Bank"),
    ("AXISBANK.NS", "Axis Bank"),
    ("BAJFINANCE.NS", "Bajaj Finance"),
    ("ASIANPAINT.NS", "Asian Paints"),
    ("MARUTI.NS", "Maruti Suzuki"),
    ("SUNPHARMA.NS", "Sun Pharmaceutical"),
    ("TITAN.NS", "Titan Company"),
    ("ULTRACEMCO.NS", "UltraTech Cement"),
    ("NESTLEIND.NS", "Nestle India"),
    ("HCLTECH.NS", "HCL Technologies"),
    ("WIPRO.NS", "Wipro"),
    ("TECHM.NS", "Tech Mahindra"),
    ("POWERGRID.NS", "Power Grid Corporation"),
    ("NTPC.NS", "NTPC"),
    ("ONGC.NS", "Oil and Natural Gas Corporation"),
    ("TATAMOTORS.NS", "Tata Motors"),
    ("TATASTEEL.NS", "Tata Steel"),
    ("JSWSTEEL.NS", "JSW Steel"),
    ("ADANIENT.NS", "Adani Enterprises"),
    ("ADANIPORTS.NS", "Adani Ports and SEZ"),
    ("BAJAJFINSV.NS", "Bajaj Finserv"),
    ("BAJAJ-AUTO.NS", "Bajaj Auto"),
    ("BRITANNIA.NS", "Britannia Industries"),
    ("CIPLA.NS", "Cipla"),
    ("COALINDIA.NS", "Coal India"),
    ("DRREDDY.NS", "Dr. Reddy's Laboratories"),
    ("EICHERMOT.NS", "Eicher Motors"),
    ("GRASIM.NS", "Grasim Industries"),
    ("HDFCLIFE.NS", "HDFC Life Insurance"),
    ("HEROMOTOCO.NS", "Hero MotoCorp"),
    ("HINDALCO.NS", "Hindalco Industries"),
    ("INDUSINDBK.NS", "IndusInd Bank"),
    ("SBILIFE.NS", "SBI Life Insurance"),
    ("APOLLOHOSP.NS", "Apollo Hospitals"),
    ("TATACONSUM.NS", "Tata Consumer Products"),
    ("SHRIRAMFIN.NS", "Shriram Finance"),
    ("BEL.NS", "Bharat Electronics"),
    ("TRENT.NS", "Trent"),
];

impl Universe {
    /// Load a universe from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content =
            std::fs::read_to_string(path).map_err(|e| format!("read universe file: {e}"))?;
        Self::from_toml(&content)
    }

    /// Parse a universe from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| format!("parse universe TOML: {e}"))
    }

    /// Serialize the universe to TOML.
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("serialize universe: {e}"))
    }

    /// NIFTY 50 large caps on the NSE.
    pub fn nifty_large_caps() -> Self {
        Self {
            members: NIFTY_LARGE_CAPS
                .iter()
                .map(|&(symbol, name)| UniverseEntry::new(symbol, name))
                .collect(),
        }
    }

    pub fn symbols(&self) -> Vec<&str> {
        self.members.iter().map(|m| m.symbol.as_str()).collect()
    }

    /// Display name for a symbol, if it is a member.
    pub fn name_of(&self, symbol: &str) -> Option<&str> {
        self.members
            .iter()
            .find(|m| m.symbol == symbol)
            .map(|m| m.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl Default for Universe {
    fn default() -> Self {
        Self::nifty_large_caps()
    }
}
