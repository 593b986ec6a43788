use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use log::warn;
use rust_decimal::Decimal;

use super::fx_errors::FxError;
use super::fx_traits::{FxProviderTrait, FxServiceTrait};
use crate::constants::{BASE_CURRENCY, DEFAULT_USD_TWD_RATE, FOREIGN_CURRENCY};
use crate::errors::Result;

/// Builds the cache key for a currency pair, e.g. "USDTWD".
pub fn make_fx_symbol(from_currency: &str, to_currency: &str) -> String {
    format!("{}{}", from_currency, to_currency)
}

/// Serves conversion rates out of an in-memory cache filled by an external
/// provider. Lookups are synchronous; only `refresh_rates` goes to the wire.
#[derive(Clone)]
pub struct FxService {
    provider: Option<Arc<dyn FxProviderTrait>>,
    rates: Arc<RwLock<HashMap<String, Decimal>>>,
}

impl FxService {
    pub fn new(provider: Arc<dyn FxProviderTrait>) -> Self {
        Self {
            provider: Some(provider),
            rates: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// An offline service with no provider; rates can still be pinned
    /// manually and the fixed fallback applies everywhere else.
    pub fn new_offline() -> Self {
        Self {
            provider: None,
            rates: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn read_cached_rate(&self, from: &str, to: &str) -> Result<Option<Decimal>> {
        let rates = self
            .rates
            .read()
            .map_err(|e| FxError::CacheError(e.to_string()))?;

        if let Some(rate) = rates.get(&make_fx_symbol(from, to)) {
            return Ok(Some(*rate));
        }
        // Try the inverse pair
        if let Some(inverse) = rates.get(&make_fx_symbol(to, from)) {
            if !inverse.is_zero() {
                return Ok(Some(Decimal::ONE / *inverse));
            }
        }
        Ok(None)
    }
}

#[async_trait]
impl FxServiceTrait for FxService {
    fn get_latest_exchange_rate(&self, from_currency: &str, to_currency: &str) -> Result<Decimal> {
        if from_currency == to_currency {
            return Ok(Decimal::ONE);
        }
        match self.read_cached_rate(from_currency, to_currency)? {
            Some(rate) => Ok(rate),
            None => Err(FxError::RateNotFound(format!(
                "Exchange rate not found for {}/{}",
                from_currency, to_currency
            ))
            .into()),
        }
    }

    fn rate_or_default(&self, from_currency: &str, to_currency: &str) -> Decimal {
        match self.get_latest_exchange_rate(from_currency, to_currency) {
            Ok(rate) => rate,
            Err(e) => {
                let fallback = if from_currency == FOREIGN_CURRENCY && to_currency == BASE_CURRENCY
                {
                    DEFAULT_USD_TWD_RATE
                } else {
                    Decimal::ONE
                };
                warn!(
                    "FX rate {}->{} unavailable ({}). Using fallback {}.",
                    from_currency, to_currency, e, fallback
                );
                fallback
            }
        }
    }

    fn set_rate(&self, from_currency: &str, to_currency: &str, rate: Decimal) -> Result<()> {
        if rate <= Decimal::ZERO {
            return Err(FxError::InvalidRate(format!(
                "Rate for {}/{} must be positive, got {}",
                from_currency, to_currency, rate
            ))
            .into());
        }
        let mut rates = self
            .rates
            .write()
            .map_err(|e| FxError::CacheError(e.to_string()))?;
        rates.insert(make_fx_symbol(from_currency, to_currency), rate);
        Ok(())
    }

    async fn refresh_rates(&self) -> Result<()> {
        let provider = match &self.provider {
            Some(provider) => provider.clone(),
            None => return Ok(()),
        };

        match provider.fetch_rate(FOREIGN_CURRENCY, BASE_CURRENCY).await {
            Ok(rate) if rate > Decimal::ZERO => {
                self.set_rate(FOREIGN_CURRENCY, BASE_CURRENCY, rate)?;
            }
            Ok(rate) => {
                warn!(
                    "Provider returned non-positive {}/{} rate {}. Keeping cached value.",
                    FOREIGN_CURRENCY, BASE_CURRENCY, rate
                );
            }
            Err(e) => {
                warn!(
                    "Failed to refresh {}/{} rate: {}. Keeping cached value.",
                    FOREIGN_CURRENCY, BASE_CURRENCY, e
                );
            }
        }
        Ok(())
    }
}
