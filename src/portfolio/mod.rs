pub mod snapshot;
pub mod valuation;

pub use snapshot::{AssetSnapshot, SnapshotService};
pub use valuation::{PortfolioReport, PositionValuation, ValuationService, ValuationServiceTrait};
