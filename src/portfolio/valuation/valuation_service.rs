use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use futures::future::join_all;
use log::{debug, warn};
use rust_decimal::Decimal;

use super::valuation_model::{PortfolioReport, PositionValuation};
use crate::constants::DECIMAL_PRECISION;
use crate::errors::Result;
use crate::fx::FxServiceTrait;
use crate::instruments::classify;
use crate::ledger::Ledger;
use crate::market_data::{MarketDataServiceTrait, Quote};

#[async_trait]
pub trait ValuationServiceTrait: Send + Sync {
    /// Values every position against live quotes and aggregates the
    /// portfolio. Fresh quotes are written back onto the positions
    /// (last-known price, display name) so the ledger can be valued offline
    /// next time.
    async fn calculate(&self, ledger: &mut Ledger) -> Result<PortfolioReport>;
}

#[derive(Clone)]
pub struct ValuationService {
    market_data_service: Arc<dyn MarketDataServiceTrait>,
    fx_service: Arc<dyn FxServiceTrait>,
}

impl ValuationService {
    pub fn new(
        market_data_service: Arc<dyn MarketDataServiceTrait>,
        fx_service: Arc<dyn FxServiceTrait>,
    ) -> Self {
        Self {
            market_data_service,
            fx_service,
        }
    }

    /// One price lookup per symbol. A failed fetch surfaces as an Err entry
    /// for that symbol only and never aborts the batch.
    async fn fetch_quotes(&self, symbols: &[String]) -> HashMap<String, Result<Quote>> {
        let fetches = symbols.iter().map(|symbol| {
            let service = self.market_data_service.clone();
            let symbol = symbol.clone();
            async move {
                let result = service.get_latest_quote(&symbol).await;
                (symbol, result)
            }
        });

        join_all(fetches).await.into_iter().collect()
    }
}

#[async_trait]
impl ValuationServiceTrait for ValuationService {
    async fn calculate(&self, ledger: &mut Ledger) -> Result<PortfolioReport> {
        let mut symbols: Vec<String> = ledger.positions.keys().cloned().collect();
        symbols.sort();

        debug!("Valuing {} positions", symbols.len());
        let mut quotes = self.fetch_quotes(&symbols).await;

        let mut rows: Vec<PositionValuation> = Vec::with_capacity(symbols.len());
        let mut total_market_value = Decimal::ZERO;
        let mut total_cost_value = Decimal::ZERO;
        let mut total_debt = Decimal::ZERO;
        let mut total_day_pnl = Decimal::ZERO;

        for symbol in &symbols {
            let position = match ledger.positions.get_mut(symbol) {
                Some(position) => position,
                None => continue,
            };
            let market = classify(symbol);
            let fx_rate = self
                .fx_service
                .rate_or_default(market.currency(), &ledger.base_currency);

            let (price, prev_close, is_stale) = match quotes.remove(symbol) {
                Some(Ok(quote)) if quote.price > Decimal::ZERO => {
                    if let Some(name) = &quote.display_name {
                        position.accept_display_name(name);
                    }
                    position.update_last_quote(
                        quote.price,
                        quote.day_change(),
                        quote.day_change_pct(),
                    );
                    let prev_close = if quote.prev_close > Decimal::ZERO {
                        quote.prev_close
                    } else {
                        quote.price
                    };
                    (quote.price, prev_close, false)
                }
                other => {
                    if let Some(Err(e)) = other {
                        warn!("Quote unavailable for {}: {}. Using fallback price.", symbol, e);
                    }
                    // Last successfully fetched price, else cost
                    let fallback = if position.last_price > Decimal::ZERO {
                        position.last_price
                    } else {
                        position.weighted_avg_cost
                    };
                    (fallback, fallback, true)
                }
            };

            let quantity = position.total_shares;
            let market_value = (price * quantity * fx_rate).round_dp(DECIMAL_PRECISION);
            let cost_value =
                (position.weighted_avg_cost * quantity * fx_rate).round_dp(DECIMAL_PRECISION);
            let debt = position.total_debt();
            let unrealized_pnl = market_value - cost_value;
            let equity_at_cost = cost_value - debt;
            let unrealized_roi_pct = if equity_at_cost > Decimal::ZERO {
                ((unrealized_pnl / equity_at_cost) * Decimal::ONE_HUNDRED)
                    .round_dp(DECIMAL_PRECISION)
            } else {
                Decimal::ZERO
            };
            let day_pnl = ((price - prev_close) * quantity * fx_rate).round_dp(DECIMAL_PRECISION);

            total_market_value += market_value;
            total_cost_value += cost_value;
            total_debt += debt;
            total_day_pnl += day_pnl;

            rows.push(PositionValuation {
                symbol: symbol.clone(),
                display_name: position.display_name.clone(),
                market,
                quantity,
                average_cost: position.weighted_avg_cost,
                price,
                prev_close,
                fx_rate,
                market_value,
                cost_value,
                debt,
                unrealized_pnl,
                unrealized_roi_pct,
                day_pnl,
                weight_pct: Decimal::ZERO,
                is_stale,
            });
        }

        for row in rows.iter_mut() {
            row.weight_pct = if total_market_value.is_zero() {
                Decimal::ZERO
            } else {
                ((row.market_value / total_market_value) * Decimal::ONE_HUNDRED)
                    .round_dp(DECIMAL_PRECISION)
            };
        }

        let total_realized_pnl = ledger.total_realized_pnl();
        let total_pnl = (total_market_value - total_cost_value) + total_realized_pnl;
        let roi_pct = if ledger.principal > Decimal::ZERO {
            ((total_pnl / ledger.principal) * Decimal::ONE_HUNDRED).round_dp(DECIMAL_PRECISION)
        } else {
            Decimal::ZERO
        };
        let net_asset_value = ledger.cash_balance + total_market_value - total_debt;

        Ok(PortfolioReport {
            calculated_at: Utc::now(),
            base_currency: ledger.base_currency.clone(),
            cash_balance: ledger.cash_balance,
            principal: ledger.principal,
            total_market_value,
            total_cost_value,
            total_debt,
            total_day_pnl,
            net_asset_value,
            total_realized_pnl,
            total_pnl,
            roi_pct,
            positions: rows,
        })
    }
}
