pub mod instrument_model;

pub use instrument_model::{classify, normalize_symbol, Market};
