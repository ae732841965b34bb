//! Core domain types for option sides, chain records, trades and signals.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SelectError;

/// Call-like (`CE`) or put-like (`PE`) option. Deserializes from any case of
/// `CE`/`CALL` or `PE`/`PUT`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String")]
pub enum OptionSide {
    #[serde(rename = "CE")]
    Call,
    #[serde(rename = "PE")]
    Put,
}

impl OptionSide {
    pub fn label(self) -> &'static str {
        match self {
            OptionSide::Call => "CE",
            OptionSide::Put => "PE",
        }
    }

    /// In-the-money test: calls below spot, puts above spot.
    pub fn is_itm(self, strike: f64, spot: f64) -> bool {
        match self {
            OptionSide::Call => strike < spot,
            OptionSide::Put => strike > spot,
        }
    }
}

impl FromStr for OptionSide {
    type Err = SelectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CE" | "CALL" => Ok(OptionSide::Call),
            "PE" | "PUT" => Ok(OptionSide::Put),
            _ => Err(SelectError::InvalidSide(s.to_string())),
        }
    }
}

impl TryFrom<String> for OptionSide {
    type Error = SelectError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl fmt::Display for OptionSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One strike snapshot from an option chain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OptionRecord {
    pub strike: f64,
    #[serde(rename = "option_type")]
    pub side: OptionSide,
    #[serde(default)]
    pub delta: f64,
    #[serde(default)]
    pub open_interest: u64,
    #[serde(default)]
    pub volume: u64,
    #[serde(default)]
    pub premium: f64,
}

/// Spot plus the strikes quoted around it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainSnapshot {
    pub spot: f64,
    pub strikes: Vec<OptionRecord>,
}

/// Directional view that drives the entry side.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Bullish,
    Bearish,
}

impl Signal {
    pub fn side(self) -> OptionSide {
        match self {
            Signal::Bullish => OptionSide::Call,
            Signal::Bearish => OptionSide::Put,
        }
    }
}

pub type Metadata = BTreeMap<String, serde_json::Value>;

/// A single option position. PnL fields are owned by the normalizer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Trade {
    pub id: String,
    pub symbol: String,
    pub strike: f64,
    #[serde(rename = "option_type")]
    pub side: OptionSide,
    /// Positive = long.
    pub quantity: f64,
    pub entry_price: f64,
    pub exit_price: Option<f64>,
    pub mark_price: f64,
    pub fees: f64,
    pub realized_pnl: f64,
    pub unrealized_pnl: f64,
    pub net_pnl: f64,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(default, rename = "meta")]
    pub metadata: Metadata,
}

impl Trade {
    pub fn is_open(&self) -> bool {
        self.exit_price.is_none()
    }

    pub fn is_closed(&self) -> bool {
        self.exit_price.is_some()
    }

    /// e.g. "NIFTY 15000CE"
    pub fn describe(&self) -> String {
        format!("{} {}{}", self.symbol, self.strike, self.side)
    }
}

/// Request to open a trade; the ledger assigns id, timestamps and PnL.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenTrade {
    pub symbol: String,
    pub strike: f64,
    pub side: OptionSide,
    pub quantity: f64,
    pub entry_price: f64,
    pub fees: f64,
    pub metadata: Metadata,
}

impl OpenTrade {
    pub fn new(
        symbol: impl Into<String>,
        strike: f64,
        side: OptionSide,
        quantity: f64,
        entry_price: f64,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            strike,
            side,
            quantity,
            entry_price,
            fees: 0.0,
            metadata: Metadata::new(),
        }
    }

    pub fn with_fees(mut self, fees: f64) -> Self {
        self.fees = fees;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_labels_parse_case_insensitively() {
        assert_eq!("ce".parse::<OptionSide>().unwrap(), OptionSide::Call);
        assert_eq!("Call".parse::<OptionSide>().unwrap(), OptionSide::Call);
        assert_eq!(" PE ".parse::<OptionSide>().unwrap(), OptionSide::Put);
        assert_eq!("put".parse::<OptionSide>().unwrap(), OptionSide::Put);
        assert!(matches!(
            "straddle".parse::<OptionSide>(),
            Err(SelectError::InvalidSide(s)) if s == "straddle"
        ));
    }

    #[test]
    fn itm_is_strict_on_both_sides() {
        assert!(OptionSide::Call.is_itm(14950.0, 15000.0));
        assert!(!OptionSide::Call.is_itm(15000.0, 15000.0));
        assert!(OptionSide::Put.is_itm(15050.0, 15000.0));
        assert!(!OptionSide::Put.is_itm(15000.0, 15000.0));
    }

    #[test]
    fn chain_record_reads_feed_json() {
        let rec: OptionRecord = serde_json::from_str(
            r#"{"strike": 15000.0, "option_type": "PUT", "delta": -0.4, "open_interest": 12}"#,
        )
        .unwrap();
        assert_eq!(rec.side, OptionSide::Put);
        assert_eq!(rec.volume, 0);
        assert_eq!(serde_json::to_value(rec.side).unwrap(), "PE");
    }

    #[test]
    fn side_deserializes_in_any_case() {
        for (raw, want) in [("Call", OptionSide::Call), ("cE", OptionSide::Call), ("Put", OptionSide::Put)] {
            let side: OptionSide = serde_json::from_value(serde_json::json!(raw)).unwrap();
            assert_eq!(side, want);
        }
        assert!(serde_json::from_value::<OptionSide>(serde_json::json!("straddle")).is_err());
    }

    #[test]
    fn signal_picks_side() {
        assert_eq!(Signal::Bullish.side(), OptionSide::Call);
        assert_eq!(Signal::Bearish.side(), OptionSide::Put);
    }
}
