use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use yahoo_finance_api as yahoo;

use crate::instruments::Market;
use crate::market_data::market_data_errors::MarketDataError;
use crate::market_data::market_data_model::{DataSource, Quote};
use crate::market_data::market_data_traits::QuoteProvider;

/// Quotes for foreign-listed symbols via Yahoo Finance.
pub struct YahooQuoteProvider {
    provider: yahoo::YahooConnector,
}

impl YahooQuoteProvider {
    pub fn new() -> Result<Self, MarketDataError> {
        let provider = yahoo::YahooConnector::new()?;
        Ok(YahooQuoteProvider { provider })
    }

    fn to_decimal(value: f64) -> Decimal {
        Decimal::from_f64_retain(value).unwrap_or_default()
    }
}

#[async_trait]
impl QuoteProvider for YahooQuoteProvider {
    fn name(&self) -> &'static str {
        "YAHOO"
    }

    fn priority(&self) -> u8 {
        2
    }

    fn supports(&self, market: Market) -> bool {
        market == Market::Foreign
    }

    async fn get_latest_quote(&self, symbol: &str) -> Result<Quote, MarketDataError> {
        // A few sessions of dailies so the prior close is available even
        // around weekends and holidays.
        let response = self.provider.get_quote_range(symbol, "1d", "5d").await?;
        let quotes = response.quotes()?;

        let latest = quotes
            .last()
            .ok_or_else(|| MarketDataError::NotFound(format!("No quotes for {}", symbol)))?;

        let prev_close = if quotes.len() >= 2 {
            Self::to_decimal(quotes[quotes.len() - 2].close)
        } else {
            Self::to_decimal(latest.close)
        };

        let timestamp = Utc
            .timestamp_opt(latest.timestamp as i64, 0)
            .single()
            .unwrap_or_else(Utc::now);

        Ok(Quote {
            symbol: symbol.to_string(),
            price: Self::to_decimal(latest.close),
            prev_close,
            display_name: None,
            currency: Market::Foreign.currency().to_string(),
            timestamp,
            data_source: DataSource::Yahoo,
        })
    }
}
