use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds {
        required: Decimal,
        available: Decimal,
    },

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    #[error("Invalid margin ratio: {0}")]
    InvalidMarginRatio(Decimal),

    #[error("No position held for symbol {0}")]
    PositionNotFound(String),
}

impl LedgerError {
    /// Amount the buyer is short by, for user-facing messages.
    pub fn shortfall(&self) -> Option<Decimal> {
        match self {
            LedgerError::InsufficientFunds {
                required,
                available,
            } => Some(required - available),
            _ => None,
        }
    }
}
