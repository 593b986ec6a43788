pub(crate) mod market_data_errors;
pub(crate) mod market_data_model;
pub(crate) mod market_data_service;
pub(crate) mod market_data_traits;
pub(crate) mod providers;

// Re-export the public interface
pub use market_data_errors::MarketDataError;
pub use market_data_model::{DataSource, Quote};
pub use market_data_service::MarketDataService;
pub use market_data_traits::{MarketDataServiceTrait, QuoteProvider};

// Re-export provider types
pub use providers::twse_provider::TwseProvider;
pub use providers::yahoo_provider::YahooQuoteProvider;
