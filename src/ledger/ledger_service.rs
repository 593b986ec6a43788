use std::sync::Arc;

use chrono::NaiveDate;
use log::{debug, info};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::ledger_errors::LedgerError;
use super::ledger_model::{Ledger, Lot, Position, RealizedTrade, TradeKind};
use crate::constants::DECIMAL_PRECISION;
use crate::errors::Result;
use crate::fx::FxServiceTrait;
use crate::instruments::{classify, normalize_symbol};

/// A purchase request. `margin_ratio` is the self-funded fraction of the
/// total cost (1.0 for cash trades); the remainder becomes margin debt.
#[derive(Debug, Clone)]
pub struct BuyOrder {
    pub symbol: String,
    pub share_count: Decimal,
    pub unit_price: Decimal,
    pub trade_kind: TradeKind,
    pub margin_ratio: Decimal,
    pub trade_date: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct SellOrder {
    pub symbol: String,
    pub share_count: Decimal,
    pub unit_price: Decimal,
    pub trade_date: NaiveDate,
}

/// What happens to cash when a position is force-removed on the correction
/// path. Both variants are explicit and auditable; nothing is implicit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalPolicy {
    /// Drop the position, cash untouched.
    Discard,
    /// Return cost basis net of outstanding debt to cash.
    RefundNetCost,
}

/// The position accounting engine: buy/sell/cost-basis/margin math over an
/// explicitly passed [`Ledger`]. All operations are all-or-nothing at
/// single-position granularity; validation happens before any mutation.
#[derive(Clone)]
pub struct LedgerService {
    fx_service: Arc<dyn FxServiceTrait>,
}

impl LedgerService {
    pub fn new(fx_service: Arc<dyn FxServiceTrait>) -> Self {
        Self { fx_service }
    }

    fn fx_rate_for(&self, symbol: &str, base_currency: &str) -> Decimal {
        let market = classify(symbol);
        self.fx_service.rate_or_default(market.currency(), base_currency)
    }

    /// Executes a purchase: debits cash by the self-funded part of the cost
    /// and books the rest as margin debt on a new lot. Never touches
    /// `principal` — buying is a pure cash-to-equity conversion.
    pub fn buy(&self, ledger: &mut Ledger, order: BuyOrder) -> Result<()> {
        let symbol = normalize_symbol(&order.symbol);

        if order.share_count <= Decimal::ZERO {
            return Err(LedgerError::InvalidQuantity(format!(
                "Buy quantity must be positive, got {}",
                order.share_count
            ))
            .into());
        }
        if order.unit_price <= Decimal::ZERO {
            return Err(LedgerError::InvalidPrice(format!(
                "Buy price must be positive, got {}",
                order.unit_price
            ))
            .into());
        }
        let margin_ratio = match order.trade_kind {
            TradeKind::Cash => Decimal::ONE,
            TradeKind::Margin => {
                if order.margin_ratio <= Decimal::ZERO || order.margin_ratio > Decimal::ONE {
                    return Err(LedgerError::InvalidMarginRatio(order.margin_ratio).into());
                }
                order.margin_ratio
            }
        };

        let fx_rate = self.fx_rate_for(&symbol, &ledger.base_currency);
        let total_cost_base = order.unit_price * order.share_count * fx_rate;
        let cash_required = (total_cost_base * margin_ratio).round_dp(DECIMAL_PRECISION);
        let debt_created = total_cost_base - cash_required;

        if cash_required > ledger.cash_balance {
            return Err(LedgerError::InsufficientFunds {
                required: cash_required,
                available: ledger.cash_balance,
            }
            .into());
        }

        ledger.cash_balance -= cash_required;
        let position = ledger
            .positions
            .entry(symbol.clone())
            .or_insert_with(|| Position::new(symbol.clone()));
        position.add_lot(Lot {
            id: Uuid::new_v4().to_string(),
            purchase_date: order.trade_date,
            unit_price: order.unit_price,
            share_count: order.share_count,
            trade_kind: order.trade_kind,
            debt_amount: debt_created,
        });
        ledger.touch();

        debug!(
            "Bought {} x {} @ {} (fx {}, cash out {}, debt {})",
            order.share_count, symbol, order.unit_price, fx_rate, cash_required, debt_created
        );
        Ok(())
    }

    /// Executes a sale: consumes lots FIFO, repays the proportional margin
    /// debt out of the proceeds before crediting cash, and appends an
    /// immutable realized-trade record. Never touches `principal`.
    pub fn sell(&self, ledger: &mut Ledger, order: SellOrder) -> Result<RealizedTrade> {
        let symbol = normalize_symbol(&order.symbol);

        if order.share_count <= Decimal::ZERO {
            return Err(LedgerError::InvalidQuantity(format!(
                "Sell quantity must be positive, got {}",
                order.share_count
            ))
            .into());
        }
        if order.unit_price <= Decimal::ZERO {
            return Err(LedgerError::InvalidPrice(format!(
                "Sell price must be positive, got {}",
                order.unit_price
            ))
            .into());
        }

        let held = ledger
            .positions
            .get(&symbol)
            .map(|p| p.total_shares)
            .ok_or_else(|| LedgerError::PositionNotFound(symbol.clone()))?;
        if order.share_count > held {
            return Err(LedgerError::InvalidQuantity(format!(
                "Sell quantity {} exceeds held {} for {}",
                order.share_count, held, symbol
            ))
            .into());
        }

        let fx_rate = self.fx_rate_for(&symbol, &ledger.base_currency);
        let proceeds = (order.unit_price * order.share_count * fx_rate).round_dp(DECIMAL_PRECISION);

        let position = ledger
            .positions
            .get_mut(&symbol)
            .expect("position checked above");
        let display_name = position.display_name.clone();
        let (_, cost_basis_native, debt_repaid) = position.reduce_lots_fifo(order.share_count);
        let cost_basis = (cost_basis_native * fx_rate).round_dp(DECIMAL_PRECISION);

        let profit = proceeds - cost_basis;
        let roi_pct = if cost_basis.is_zero() {
            Decimal::ZERO
        } else {
            ((profit / cost_basis) * Decimal::ONE_HUNDRED).round_dp(DECIMAL_PRECISION)
        };

        // Margin loan is repaid out of the proceeds before cash is credited
        ledger.cash_balance += proceeds - debt_repaid;

        if position.lots.is_empty() {
            ledger.positions.remove(&symbol);
        }

        let trade = RealizedTrade {
            id: Uuid::new_v4().to_string(),
            trade_date: order.trade_date,
            symbol: symbol.clone(),
            display_name,
            quantity: order.share_count,
            cost_basis,
            proceeds,
            profit,
            roi_pct,
        };
        ledger.realized_trades.push(trade.clone());
        ledger.touch();

        debug!(
            "Sold {} x {} @ {} (proceeds {}, cost {}, debt repaid {}, profit {})",
            order.share_count, symbol, order.unit_price, proceeds, cost_basis, debt_repaid, profit
        );
        Ok(trade)
    }

    /// Force-removes a position on the correction path, applying the given
    /// cash policy. No realized trade is recorded.
    pub fn remove_position(
        &self,
        ledger: &mut Ledger,
        symbol: &str,
        policy: RemovalPolicy,
    ) -> Result<()> {
        let symbol = normalize_symbol(symbol);
        let position = ledger
            .positions
            .remove(&symbol)
            .ok_or_else(|| LedgerError::PositionNotFound(symbol.clone()))?;

        if policy == RemovalPolicy::RefundNetCost {
            let fx_rate = self.fx_rate_for(&symbol, &ledger.base_currency);
            let refund = (position.total_shares * position.weighted_avg_cost * fx_rate
                - position.total_debt())
            .round_dp(DECIMAL_PRECISION);
            ledger.cash_balance += refund;
            info!("Removed position {} with net-cost refund {}", symbol, refund);
        } else {
            info!("Removed position {} without cash adjustment", symbol);
        }

        ledger.touch();
        Ok(())
    }

    /// Maintenance repair for principal drift: fixes `principal` to the given
    /// value and recomputes cash as principal minus the equity currently
    /// tied up in positions (cost basis net of margin debt).
    pub fn correct_principal(&self, ledger: &mut Ledger, new_principal: Decimal) -> Result<()> {
        let invested: Decimal = ledger
            .positions
            .values()
            .map(|position| {
                let fx_rate = self.fx_rate_for(&position.symbol, &ledger.base_currency);
                position.total_shares * position.weighted_avg_cost * fx_rate
                    - position.total_debt()
            })
            .sum();

        ledger.cash_balance = (new_principal - invested).round_dp(DECIMAL_PRECISION);
        ledger.principal = new_principal;
        ledger.touch();

        info!(
            "Corrected principal to {} (invested equity {}, cash now {})",
            new_principal, invested, ledger.cash_balance
        );
        Ok(())
    }

    /// Deposit (positive) or withdrawal (negative): the only operation that
    /// moves `principal`, always in lockstep with cash.
    pub fn transfer_cash(&self, ledger: &mut Ledger, amount: Decimal) -> Result<()> {
        if amount.is_zero() {
            return Err(
                LedgerError::InvalidQuantity("Transfer amount must be non-zero".to_string()).into(),
            );
        }
        if amount < Decimal::ZERO && ledger.cash_balance + amount < Decimal::ZERO {
            return Err(LedgerError::InsufficientFunds {
                required: -amount,
                available: ledger.cash_balance,
            }
            .into());
        }

        ledger.cash_balance += amount;
        ledger.principal += amount;
        ledger.touch();
        Ok(())
    }
}
