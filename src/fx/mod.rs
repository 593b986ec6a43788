pub mod fx_errors;
pub mod fx_service;
pub mod fx_traits;
pub mod yahoo_fx_provider;

pub use fx_errors::FxError;
pub use fx_service::FxService;
pub use fx_traits::{FxProviderTrait, FxServiceTrait};
pub use yahoo_fx_provider::YahooFxProvider;
