pub mod db_models;
pub mod ledger_errors;
pub mod ledger_model;
pub mod ledger_repository;
pub mod ledger_service;

pub use ledger_errors::LedgerError;
pub use ledger_model::{Ledger, Lot, Position, RealizedTrade, TradeKind};
pub use ledger_repository::{LedgerRepository, LedgerRepositoryTrait};
pub use ledger_service::{BuyOrder, LedgerService, RemovalPolicy, SellOrder};
