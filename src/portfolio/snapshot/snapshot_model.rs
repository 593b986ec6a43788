use chrono::NaiveDate;
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::db_models::{decimal_from_db, decimal_to_db};
use crate::utils::decimal_serde::*;

/// One point of the net-asset-value time series: what the portfolio is worth
/// on a calendar date versus the capital contributed by then. At most one
/// entry exists per date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetSnapshot {
    pub snapshot_date: NaiveDate,
    #[serde(with = "decimal_serde")]
    pub net_asset_value: Decimal,
    #[serde(with = "decimal_serde")]
    pub principal: Decimal,
}

// --- DB Representation ---

#[derive(Queryable, Identifiable, Insertable, AsChangeset, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::asset_snapshots)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AssetSnapshotDB {
    /// PK: "ACCOUNTID_YYYY-MM-DD", so a replace keyed on it is the
    /// one-row-per-day upsert.
    pub id: String,
    pub account_id: String,
    pub snapshot_date: String,
    pub net_asset_value: String,
    pub principal: String,
}

impl AssetSnapshotDB {
    pub fn from_domain(account_id: &str, snapshot: &AssetSnapshot) -> Self {
        let snapshot_date = snapshot.snapshot_date.format("%Y-%m-%d").to_string();
        AssetSnapshotDB {
            id: format!("{}_{}", account_id, snapshot_date),
            account_id: account_id.to_string(),
            snapshot_date,
            net_asset_value: decimal_to_db(snapshot.net_asset_value),
            principal: decimal_to_db(snapshot.principal),
        }
    }
}

impl From<AssetSnapshotDB> for AssetSnapshot {
    fn from(db: AssetSnapshotDB) -> Self {
        AssetSnapshot {
            snapshot_date: NaiveDate::parse_from_str(&db.snapshot_date, "%Y-%m-%d")
                .unwrap_or_default(),
            net_asset_value: decimal_from_db(&db.net_asset_value),
            principal: decimal_from_db(&db.principal),
        }
    }
}
