use async_trait::async_trait;

use super::market_data_errors::MarketDataError;
use super::market_data_model::Quote;
use crate::errors;
use crate::instruments::Market;

/// Trait implemented by concrete quote sources (TWSE, Yahoo, ...).
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Lower value wins when several providers support the same market.
    fn priority(&self) -> u8;

    fn supports(&self, market: Market) -> bool;

    async fn get_latest_quote(&self, symbol: &str) -> Result<Quote, MarketDataError>;
}

/// Trait consumed by the valuation engine: one price lookup per symbol,
/// failures degrade at the call site.
#[async_trait]
pub trait MarketDataServiceTrait: Send + Sync {
    async fn get_latest_quote(&self, symbol: &str) -> errors::Result<Quote>;
}
