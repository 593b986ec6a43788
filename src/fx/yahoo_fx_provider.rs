use async_trait::async_trait;
use log::debug;
use rust_decimal::Decimal;
use yahoo_finance_api as yahoo;

use super::fx_errors::FxError;
use super::fx_traits::FxProviderTrait;

/// Exchange-rate source backed by Yahoo Finance FX symbols ("USDTWD=X").
pub struct YahooFxProvider {
    provider: yahoo::YahooConnector,
}

impl YahooFxProvider {
    pub fn new() -> Result<Self, FxError> {
        let provider =
            yahoo::YahooConnector::new().map_err(|e| FxError::ProviderError(e.to_string()))?;
        Ok(YahooFxProvider { provider })
    }
}

#[async_trait]
impl FxProviderTrait for YahooFxProvider {
    async fn fetch_rate(
        &self,
        from_currency: &str,
        to_currency: &str,
    ) -> Result<Decimal, FxError> {
        let symbol = format!("{}{}=X", from_currency, to_currency);
        let response = self
            .provider
            .get_latest_quotes(&symbol, "1d")
            .await
            .map_err(|e| FxError::ProviderError(e.to_string()))?;

        let quote = response
            .last_quote()
            .map_err(|e| FxError::ProviderError(e.to_string()))?;

        let rate = Decimal::from_f64_retain(quote.close)
            .ok_or_else(|| FxError::InvalidRate(format!("{}: {}", symbol, quote.close)))?;

        if rate <= Decimal::ZERO {
            return Err(FxError::InvalidRate(format!("{}: {}", symbol, rate)));
        }

        debug!("Fetched FX rate {} = {}", symbol, rate);
        Ok(rate)
    }
}
