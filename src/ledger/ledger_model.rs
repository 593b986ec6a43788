use chrono::{DateTime, NaiveDate, Utc};
use log::warn;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::constants::{BASE_CURRENCY, DECIMAL_PRECISION, QUANTITY_THRESHOLD};
use crate::portfolio::snapshot::AssetSnapshot;
use crate::utils::decimal_serde::*;

pub fn is_quantity_significant(quantity: &Decimal) -> bool {
    let threshold =
        Decimal::from_str_radix(QUANTITY_THRESHOLD, 10).unwrap_or_else(|_| Decimal::new(1, 8));
    quantity.abs() >= threshold
}

/// How a lot was financed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeKind {
    Cash,
    Margin,
}

/// One purchase batch of a single symbol.
///
/// `unit_price` is in the instrument's native currency; `debt_amount` is the
/// outstanding margin loan attributable to this lot in the ledger's base
/// currency, and shrinks proportionally as shares are sold off.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lot {
    pub id: String,
    pub purchase_date: NaiveDate,
    #[serde(with = "decimal_serde")]
    pub unit_price: Decimal,
    #[serde(with = "decimal_serde")]
    pub share_count: Decimal,
    pub trade_kind: TradeKind,
    #[serde(with = "decimal_serde")]
    pub debt_amount: Decimal,
}

/// Aggregate holding of one symbol. `total_shares` and `weighted_avg_cost`
/// are always recomputed from the lots, never trusted as stored state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub symbol: String,
    pub display_name: String,
    #[serde(with = "decimal_serde")]
    pub total_shares: Decimal,
    #[serde(with = "decimal_serde")]
    pub weighted_avg_cost: Decimal,
    #[serde(with = "decimal_serde")]
    pub last_price: Decimal,
    #[serde(with = "decimal_serde")]
    pub last_change: Decimal,
    #[serde(with = "decimal_serde")]
    pub last_change_pct: Decimal,
    pub lots: Vec<Lot>,
}

impl Position {
    pub fn new(symbol: String) -> Self {
        Position {
            display_name: symbol.clone(),
            symbol,
            total_shares: Decimal::ZERO,
            weighted_avg_cost: Decimal::ZERO,
            last_price: Decimal::ZERO,
            last_change: Decimal::ZERO,
            last_change_pct: Decimal::ZERO,
            lots: Vec::new(),
        }
    }

    /// Recalculates aggregates based on current lots. Essential internal
    /// function, called after every mutation.
    pub fn recalculate_aggregates(&mut self) {
        let total_shares: Decimal = self.lots.iter().map(|lot| lot.share_count).sum();
        let total_cost: Decimal = self
            .lots
            .iter()
            .map(|lot| lot.share_count * lot.unit_price)
            .sum();

        self.total_shares = total_shares;

        if self.total_shares.is_sign_positive() && is_quantity_significant(&self.total_shares) {
            self.weighted_avg_cost = (total_cost / self.total_shares).round_dp(DECIMAL_PRECISION);
        } else {
            if !self.lots.is_empty() {
                warn!(
                    "Position {} share count became zero or insignificant ({}). Aggregates zeroed.",
                    self.symbol, self.total_shares
                );
            }
            self.total_shares = Decimal::ZERO;
            self.weighted_avg_cost = Decimal::ZERO;
        }
    }

    /// Appends a purchase lot, keeping the collection ordered oldest-first
    /// for FIFO consumption.
    pub fn add_lot(&mut self, lot: Lot) {
        self.lots.push(lot);
        self.lots.sort_by_key(|lot| lot.purchase_date);
        self.recalculate_aggregates();
    }

    /// Reduces the position by `quantity` using FIFO lot relief.
    ///
    /// Returns `(quantity_taken, cost_basis_native, debt_repaid)`:
    /// the cost basis of the consumed shares in the instrument's native
    /// currency, and the proportional margin debt relieved in base currency.
    pub fn reduce_lots_fifo(&mut self, quantity: Decimal) -> (Decimal, Decimal, Decimal) {
        let mut remaining = quantity;
        let mut quantity_taken = Decimal::ZERO;
        let mut cost_basis_native = Decimal::ZERO;
        let mut debt_repaid = Decimal::ZERO;

        for lot in self.lots.iter_mut() {
            if remaining <= Decimal::ZERO {
                break;
            }
            if lot.share_count <= Decimal::ZERO {
                continue;
            }

            let taken = std::cmp::min(lot.share_count, remaining);
            let lot_debt_repaid = if lot.share_count.is_zero() {
                Decimal::ZERO
            } else {
                (lot.debt_amount * taken / lot.share_count).round_dp(DECIMAL_PRECISION)
            };

            quantity_taken += taken;
            cost_basis_native += taken * lot.unit_price;
            debt_repaid += lot_debt_repaid;

            lot.share_count -= taken;
            lot.debt_amount -= lot_debt_repaid;
            remaining -= taken;
        }

        // Drop fully consumed lots
        self.lots
            .retain(|lot| lot.share_count > Decimal::ZERO && is_quantity_significant(&lot.share_count));

        self.recalculate_aggregates();

        (quantity_taken, cost_basis_native, debt_repaid)
    }

    /// Outstanding margin debt over all lots, base currency.
    pub fn total_debt(&self) -> Decimal {
        self.lots.iter().map(|lot| lot.debt_amount).sum()
    }

    /// Adopts a freshly fetched display name unless a real one is already in
    /// place. A confirmed name is only ever replaced when the current value
    /// is empty or still the raw symbol placeholder.
    pub fn accept_display_name(&mut self, name: &str) {
        let name = name.trim();
        if name.is_empty() || name == self.display_name {
            return;
        }
        if self.display_name.is_empty() || self.display_name == self.symbol {
            self.display_name = name.to_string();
        }
    }

    /// Persists the most recent successfully fetched quote so valuation can
    /// proceed offline.
    pub fn update_last_quote(&mut self, price: Decimal, change: Decimal, change_pct: Decimal) {
        self.last_price = price;
        self.last_change = change;
        self.last_change_pct = change_pct;
    }
}

/// Immutable record of a closed trade, in base currency.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealizedTrade {
    pub id: String,
    pub trade_date: NaiveDate,
    pub symbol: String,
    pub display_name: String,
    #[serde(with = "decimal_serde")]
    pub quantity: Decimal,
    #[serde(with = "decimal_serde")]
    pub cost_basis: Decimal,
    #[serde(with = "decimal_serde")]
    pub proceeds: Decimal,
    #[serde(with = "decimal_serde")]
    pub profit: Decimal,
    #[serde(with = "decimal_serde")]
    pub roi_pct: Decimal,
}

/// The owning aggregate: one user's cash, positions, closed trades and
/// net-asset-value history. Passed explicitly into every operation; there is
/// no process-wide session state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ledger {
    pub account_id: String,
    pub base_currency: String,
    #[serde(with = "decimal_serde")]
    pub cash_balance: Decimal,
    #[serde(with = "decimal_serde")]
    pub principal: Decimal,
    #[serde(default)]
    pub positions: HashMap<String, Position>,
    #[serde(default)]
    pub realized_trades: Vec<RealizedTrade>,
    #[serde(default)]
    pub snapshots: Vec<AssetSnapshot>,
    pub updated_at: DateTime<Utc>,
}

impl Ledger {
    pub fn new(account_id: String) -> Self {
        Ledger {
            account_id,
            base_currency: BASE_CURRENCY.to_string(),
            cash_balance: Decimal::ZERO,
            principal: Decimal::ZERO,
            positions: HashMap::new(),
            realized_trades: Vec::new(),
            snapshots: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    /// Outstanding margin debt across all positions, base currency.
    pub fn total_debt(&self) -> Decimal {
        self.positions.values().map(Position::total_debt).sum()
    }

    /// Sum of realized profit over the full trade history, base currency.
    pub fn total_realized_pnl(&self) -> Decimal {
        self.realized_trades.iter().map(|t| t.profit).sum()
    }

    /// Upserts the net-asset-value data point for its calendar date: an
    /// existing entry is overwritten in place, so repeated valuation runs on
    /// the same day converge to a single point.
    pub fn record_snapshot(&mut self, snapshot: AssetSnapshot) {
        match self
            .snapshots
            .iter_mut()
            .find(|s| s.snapshot_date == snapshot.snapshot_date)
        {
            Some(existing) => *existing = snapshot,
            None => {
                self.snapshots.push(snapshot);
                self.snapshots.sort_by_key(|s| s.snapshot_date);
            }
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
