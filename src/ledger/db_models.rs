use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use log::warn;
use rust_decimal::Decimal;
use std::str::FromStr;

use super::ledger_model::{Lot, Position, RealizedTrade};
use crate::constants::DECIMAL_PRECISION;

pub(crate) fn decimal_from_db(raw: &str) -> Decimal {
    Decimal::from_str(raw).unwrap_or_default()
}

pub(crate) fn decimal_to_db(value: Decimal) -> String {
    value.round_dp(DECIMAL_PRECISION).to_string()
}

#[derive(Queryable, Identifiable, Insertable, AsChangeset, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::accounts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AccountDB {
    pub id: String,
    pub base_currency: String,
    pub cash_balance: String,
    pub principal: String,
    pub updated_at: String,
}

impl AccountDB {
    pub fn parse_updated_at(&self) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(&self.updated_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|e| {
                warn!("Failed to parse account updated_at '{}': {}", self.updated_at, e);
                Utc::now()
            })
    }
}

#[derive(Queryable, Identifiable, Insertable, AsChangeset, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::positions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PositionDB {
    pub id: String,
    pub account_id: String,
    pub symbol: String,
    pub display_name: String,
    pub last_price: String,
    pub last_change: String,
    pub last_change_pct: String,
    pub lots: String,
}

impl PositionDB {
    pub fn from_domain(account_id: &str, position: &Position) -> Self {
        PositionDB {
            id: format!("{}:{}", account_id, position.symbol),
            account_id: account_id.to_string(),
            symbol: position.symbol.clone(),
            display_name: position.display_name.clone(),
            last_price: decimal_to_db(position.last_price),
            last_change: decimal_to_db(position.last_change),
            last_change_pct: decimal_to_db(position.last_change_pct),
            lots: serde_json::to_string(&position.lots).unwrap_or_else(|_| "[]".to_string()),
        }
    }

    /// Rebuilds the domain position. Malformed lot JSON degrades to an empty
    /// lot collection; the position itself survives with its name and last
    /// quote intact, only the historical lot detail is lost.
    pub fn into_domain(self) -> Position {
        let lots: Vec<Lot> = serde_json::from_str(&self.lots).unwrap_or_else(|e| {
            warn!(
                "Corrupt lot record for position {}: {}. Lot detail dropped.",
                self.symbol, e
            );
            Vec::new()
        });

        let mut position = Position::new(self.symbol);
        position.display_name = self.display_name;
        position.last_price = decimal_from_db(&self.last_price);
        position.last_change = decimal_from_db(&self.last_change);
        position.last_change_pct = decimal_from_db(&self.last_change_pct);
        position.lots = lots;
        position.recalculate_aggregates();
        position
    }
}

#[derive(Queryable, Identifiable, Insertable, AsChangeset, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::realized_trades)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct RealizedTradeDB {
    pub id: String,
    pub account_id: String,
    pub trade_date: String,
    pub symbol: String,
    pub display_name: String,
    pub quantity: String,
    pub cost_basis: String,
    pub proceeds: String,
    pub profit: String,
    pub roi_pct: String,
}

impl RealizedTradeDB {
    pub fn from_domain(account_id: &str, trade: &RealizedTrade) -> Self {
        RealizedTradeDB {
            id: trade.id.clone(),
            account_id: account_id.to_string(),
            trade_date: trade.trade_date.format("%Y-%m-%d").to_string(),
            symbol: trade.symbol.clone(),
            display_name: trade.display_name.clone(),
            quantity: decimal_to_db(trade.quantity),
            cost_basis: decimal_to_db(trade.cost_basis),
            proceeds: decimal_to_db(trade.proceeds),
            profit: decimal_to_db(trade.profit),
            roi_pct: decimal_to_db(trade.roi_pct),
        }
    }
}

impl From<RealizedTradeDB> for RealizedTrade {
    fn from(db: RealizedTradeDB) -> Self {
        RealizedTrade {
            id: db.id,
            trade_date: NaiveDate::parse_from_str(&db.trade_date, "%Y-%m-%d").unwrap_or_default(),
            symbol: db.symbol,
            display_name: db.display_name,
            quantity: decimal_from_db(&db.quantity),
            cost_basis: decimal_from_db(&db.cost_basis),
            proceeds: decimal_from_db(&db.proceeds),
            profit: decimal_from_db(&db.profit),
            roi_pct: decimal_from_db(&db.roi_pct),
        }
    }
}
