use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::instruments::Market;
use crate::utils::decimal_serde::*;

/// Valuation of a single position in base currency. When the quote fetch
/// failed or produced a degenerate price, `is_stale` is set and `price`
/// holds the fallback (last known price, else weighted average cost).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionValuation {
    pub symbol: String,
    pub display_name: String,
    pub market: Market,
    #[serde(with = "decimal_serde")]
    pub quantity: Decimal,
    #[serde(with = "decimal_serde")]
    pub average_cost: Decimal,
    #[serde(with = "decimal_serde")]
    pub price: Decimal,
    #[serde(with = "decimal_serde")]
    pub prev_close: Decimal,
    #[serde(with = "decimal_serde")]
    pub fx_rate: Decimal,
    #[serde(with = "decimal_serde")]
    pub market_value: Decimal,
    #[serde(with = "decimal_serde")]
    pub cost_value: Decimal,
    #[serde(with = "decimal_serde")]
    pub debt: Decimal,
    #[serde(with = "decimal_serde")]
    pub unrealized_pnl: Decimal,
    #[serde(with = "decimal_serde")]
    pub unrealized_roi_pct: Decimal,
    #[serde(with = "decimal_serde")]
    pub day_pnl: Decimal,
    #[serde(with = "decimal_serde")]
    pub weight_pct: Decimal,
    pub is_stale: bool,
}

/// The aggregate portfolio report, everything in base currency.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioReport {
    pub calculated_at: DateTime<Utc>,
    pub base_currency: String,
    #[serde(with = "decimal_serde")]
    pub cash_balance: Decimal,
    #[serde(with = "decimal_serde")]
    pub principal: Decimal,
    #[serde(with = "decimal_serde")]
    pub total_market_value: Decimal,
    #[serde(with = "decimal_serde")]
    pub total_cost_value: Decimal,
    #[serde(with = "decimal_serde")]
    pub total_debt: Decimal,
    #[serde(with = "decimal_serde")]
    pub total_day_pnl: Decimal,
    #[serde(with = "decimal_serde")]
    pub net_asset_value: Decimal,
    #[serde(with = "decimal_serde")]
    pub total_realized_pnl: Decimal,
    #[serde(with = "decimal_serde")]
    pub total_pnl: Decimal,
    #[serde(with = "decimal_serde")]
    pub roi_pct: Decimal,
    pub positions: Vec<PositionValuation>,
}
