use async_trait::async_trait;
use rust_decimal::Decimal;

use super::fx_errors::FxError;
use crate::errors;

/// Trait defining the contract for an external exchange-rate source.
#[async_trait]
pub trait FxProviderTrait: Send + Sync {
    /// Fetches the current conversion rate for one unit of `from_currency`
    /// expressed in `to_currency`.
    async fn fetch_rate(
        &self,
        from_currency: &str,
        to_currency: &str,
    ) -> Result<Decimal, FxError>;
}

/// Trait defining the contract for FX service operations.
#[async_trait]
pub trait FxServiceTrait: Send + Sync {
    /// Returns the cached conversion rate for the pair, or an error when the
    /// pair has never been resolved.
    fn get_latest_exchange_rate(
        &self,
        from_currency: &str,
        to_currency: &str,
    ) -> errors::Result<Decimal>;

    /// Rate for the pair with graceful degradation: identical currencies
    /// convert at 1, an unresolved pair falls back to a fixed default.
    /// Never fails.
    fn rate_or_default(&self, from_currency: &str, to_currency: &str) -> Decimal;

    /// Pins a rate manually, e.g. one restored from the ledger store.
    fn set_rate(
        &self,
        from_currency: &str,
        to_currency: &str,
        rate: Decimal,
    ) -> errors::Result<()>;

    /// Refreshes cached rates from the provider. A provider failure keeps the
    /// previous cache and is not surfaced as an error.
    async fn refresh_rates(&self) -> errors::Result<()>;
}
