use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, warn};
use rust_decimal::Decimal;

use super::market_data_errors::MarketDataError;
use super::market_data_model::Quote;
use super::market_data_traits::{MarketDataServiceTrait, QuoteProvider};
use crate::errors;
use crate::instruments::{classify, normalize_symbol};

/// Routes quote lookups to the registered providers by market
/// classification and priority. A provider returning a non-positive price is
/// treated the same as a failed provider, so degenerate quotes never reach
/// the valuation math.
pub struct MarketDataService {
    providers: Vec<Arc<dyn QuoteProvider>>,
}

impl MarketDataService {
    pub fn new(mut providers: Vec<Arc<dyn QuoteProvider>>) -> Self {
        providers.sort_by_key(|p| p.priority());
        Self { providers }
    }
}

#[async_trait]
impl MarketDataServiceTrait for MarketDataService {
    async fn get_latest_quote(&self, symbol: &str) -> errors::Result<Quote> {
        let symbol = normalize_symbol(symbol);
        let market = classify(&symbol);

        let mut last_error: Option<MarketDataError> = None;
        for provider in self.providers.iter().filter(|p| p.supports(market)) {
            match provider.get_latest_quote(&symbol).await {
                Ok(quote) if quote.price > Decimal::ZERO => {
                    debug!(
                        "Quote for {} served by {} at {}",
                        symbol,
                        provider.name(),
                        quote.price
                    );
                    return Ok(quote);
                }
                Ok(quote) => {
                    warn!(
                        "Provider {} returned non-positive price {} for {}. Trying next provider.",
                        provider.name(),
                        quote.price,
                        symbol
                    );
                    last_error = Some(MarketDataError::InvalidData(format!(
                        "Non-positive price for {}",
                        symbol
                    )));
                }
                Err(e) => {
                    warn!(
                        "Provider {} failed for {}: {}. Trying next provider.",
                        provider.name(),
                        symbol,
                        e
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| {
                MarketDataError::NotFound(format!("No provider supports {}", symbol))
            })
            .into())
    }
}
