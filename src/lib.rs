pub mod db;

pub mod constants;
pub mod errors;
pub mod fx;
pub mod instruments;
pub mod ledger;
pub mod market_data;
pub mod portfolio;
pub mod schema;
pub mod utils;

pub use errors::{Error, Result};
pub use ledger::*;
pub use portfolio::*;
