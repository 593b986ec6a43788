mod valuation_model;
mod valuation_service;

pub use valuation_model::*;
pub use valuation_service::*;

#[cfg(test)]
mod valuation_service_tests;
