mod snapshot_model;
mod snapshot_service;

pub use snapshot_model::*;
pub use snapshot_service::*;
