use chrono::NaiveDate;
use log::debug;
use rust_decimal::Decimal;

use super::snapshot_model::AssetSnapshot;
use crate::errors::Result;
use crate::ledger::Ledger;

/// Records net-asset-value data points onto the ledger's time series.
/// Recording is an idempotent upsert per calendar date, so however many
/// times a valuation runs in a day the chart gets exactly one point, holding
/// the latest values.
#[derive(Clone, Default)]
pub struct SnapshotService;

impl SnapshotService {
    pub fn new() -> Self {
        SnapshotService
    }

    pub fn record_snapshot(
        &self,
        ledger: &mut Ledger,
        date: NaiveDate,
        net_asset_value: Decimal,
        principal: Decimal,
    ) -> Result<()> {
        ledger.record_snapshot(AssetSnapshot {
            snapshot_date: date,
            net_asset_value,
            principal,
        });
        ledger.touch();
        debug!(
            "Recorded snapshot for {}: NAV {}, principal {}",
            date, net_asset_value, principal
        );
        Ok(())
    }
}
