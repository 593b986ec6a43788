use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::constants::{BASE_CURRENCY, FOREIGN_CURRENCY};

lazy_static! {
    // Bare Taiwanese security codes: "2330", "00878", "2330A"
    static ref TW_NUMERIC_CODE: Regex = Regex::new(r"^\d{4,6}[A-Z]?$").unwrap();
}

/// Market classification of an instrument, inferred from its symbol format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Market {
    Domestic,
    Foreign,
}

impl Market {
    /// Currency quotes for this market are denominated in.
    pub fn currency(&self) -> &'static str {
        match self {
            Market::Domestic => BASE_CURRENCY,
            Market::Foreign => FOREIGN_CURRENCY,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Market::Domestic => "DOMESTIC",
            Market::Foreign => "FOREIGN",
        }
    }
}

/// Canonical symbol form used as the position key: trimmed and uppercased.
pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

/// Classifies a symbol as Domestic (TWSE/TPEx listed, quoted in TWD)
/// or Foreign (quoted in USD).
///
/// A symbol is Domestic when it carries a `.TW`/`.TWO` exchange suffix
/// or is a bare numeric Taiwanese security code.
pub fn classify(symbol: &str) -> Market {
    let symbol = normalize_symbol(symbol);
    if symbol.ends_with(".TW") || symbol.ends_with(".TWO") {
        return Market::Domestic;
    }
    if TW_NUMERIC_CODE.is_match(&symbol) {
        return Market::Domestic;
    }
    Market::Foreign
}
