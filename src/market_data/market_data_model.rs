use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::utils::decimal_serde::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    Twse,
    Yahoo,
    Manual,
}

impl DataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSource::Twse => "TWSE",
            DataSource::Yahoo => "YAHOO",
            DataSource::Manual => "MANUAL",
        }
    }
}

/// Domain model representing a market quote: the latest traded price, the
/// prior session's close and, when the source supplies one, a display name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub symbol: String,
    #[serde(with = "decimal_serde")]
    pub price: Decimal,
    #[serde(with = "decimal_serde")]
    pub prev_close: Decimal,
    pub display_name: Option<String>,
    pub currency: String,
    pub timestamp: DateTime<Utc>,
    pub data_source: DataSource,
}

impl Quote {
    /// Day change of this quote in quote currency, per share.
    pub fn day_change(&self) -> Decimal {
        self.price - self.prev_close
    }

    /// Day change as a percentage of the prior close (0 when unknown).
    pub fn day_change_pct(&self) -> Decimal {
        if self.prev_close.is_zero() {
            Decimal::ZERO
        } else {
            (self.day_change() / self.prev_close) * Decimal::ONE_HUNDRED
        }
    }
}
