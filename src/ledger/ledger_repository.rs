use std::collections::HashMap;
use std::sync::Arc;

use diesel::connection::Connection;
use diesel::prelude::*;
use log::debug;

use super::db_models::{decimal_from_db, decimal_to_db, AccountDB, PositionDB, RealizedTradeDB};
use super::ledger_model::{Ledger, Position, RealizedTrade};
use crate::db::{get_connection, DbPool};
use crate::errors::{Error, Result};
use crate::portfolio::snapshot::{AssetSnapshot, AssetSnapshotDB};

/// Durable storage for ledgers. `save` replaces the stored state wholesale
/// (last-writer-wins); `load` of an unknown account yields a fresh ledger.
pub trait LedgerRepositoryTrait: Send + Sync {
    fn load(&self, account_id: &str) -> Result<Ledger>;
    fn save(&self, ledger: &Ledger) -> Result<()>;
}

pub struct LedgerRepository {
    pool: Arc<DbPool>,
}

impl LedgerRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }

    fn load_positions(
        &self,
        conn: &mut SqliteConnection,
        input_account_id: &str,
    ) -> Result<HashMap<String, Position>> {
        use crate::schema::positions::dsl::*;

        let rows = positions
            .filter(account_id.eq(input_account_id))
            .load::<PositionDB>(conn)?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let position = row.into_domain();
                (position.symbol.clone(), position)
            })
            .collect())
    }

    fn load_realized_trades(
        &self,
        conn: &mut SqliteConnection,
        input_account_id: &str,
    ) -> Result<Vec<RealizedTrade>> {
        use crate::schema::realized_trades::dsl::*;

        let rows = realized_trades
            .filter(account_id.eq(input_account_id))
            .order(trade_date.asc())
            .load::<RealizedTradeDB>(conn)?;

        Ok(rows.into_iter().map(RealizedTrade::from).collect())
    }

    fn load_snapshots(
        &self,
        conn: &mut SqliteConnection,
        input_account_id: &str,
    ) -> Result<Vec<AssetSnapshot>> {
        use crate::schema::asset_snapshots::dsl::*;

        let rows = asset_snapshots
            .filter(account_id.eq(input_account_id))
            .order(snapshot_date.asc())
            .load::<AssetSnapshotDB>(conn)?;

        Ok(rows.into_iter().map(AssetSnapshot::from).collect())
    }
}

impl LedgerRepositoryTrait for LedgerRepository {
    fn load(&self, input_account_id: &str) -> Result<Ledger> {
        let mut conn = get_connection(&self.pool)?;

        let account_row = {
            use crate::schema::accounts::dsl::*;
            accounts
                .find(input_account_id)
                .first::<AccountDB>(&mut conn)
                .optional()?
        };

        let account_row = match account_row {
            Some(row) => row,
            None => {
                debug!("No stored account {}, starting fresh", input_account_id);
                return Ok(Ledger::new(input_account_id.to_string()));
            }
        };

        let mut ledger = Ledger::new(account_row.id.clone());
        ledger.base_currency = account_row.base_currency.clone();
        ledger.cash_balance = decimal_from_db(&account_row.cash_balance);
        ledger.principal = decimal_from_db(&account_row.principal);
        ledger.updated_at = account_row.parse_updated_at();
        ledger.positions = self.load_positions(&mut conn, input_account_id)?;
        ledger.realized_trades = self.load_realized_trades(&mut conn, input_account_id)?;
        ledger.snapshots = self.load_snapshots(&mut conn, input_account_id)?;

        debug!(
            "Loaded ledger {} ({} positions, {} trades, {} snapshots)",
            input_account_id,
            ledger.positions.len(),
            ledger.realized_trades.len(),
            ledger.snapshots.len()
        );
        Ok(ledger)
    }

    fn save(&self, ledger: &Ledger) -> Result<()> {
        let mut conn = get_connection(&self.pool)?;

        let account_row = AccountDB {
            id: ledger.account_id.clone(),
            base_currency: ledger.base_currency.clone(),
            cash_balance: decimal_to_db(ledger.cash_balance),
            principal: decimal_to_db(ledger.principal),
            updated_at: ledger.updated_at.to_rfc3339(),
        };
        let position_rows: Vec<PositionDB> = ledger
            .positions
            .values()
            .map(|p| PositionDB::from_domain(&ledger.account_id, p))
            .collect();
        let trade_rows: Vec<RealizedTradeDB> = ledger
            .realized_trades
            .iter()
            .map(|t| RealizedTradeDB::from_domain(&ledger.account_id, t))
            .collect();
        let snapshot_rows: Vec<AssetSnapshotDB> = ledger
            .snapshots
            .iter()
            .map(|s| AssetSnapshotDB::from_domain(&ledger.account_id, s))
            .collect();

        conn.transaction::<(), Error, _>(|conn| {
            {
                use crate::schema::accounts::dsl::*;
                diesel::replace_into(accounts)
                    .values(&account_row)
                    .execute(conn)?;
            }
            {
                use crate::schema::positions::dsl::*;
                diesel::delete(positions.filter(account_id.eq(&ledger.account_id)))
                    .execute(conn)?;
                if !position_rows.is_empty() {
                    diesel::insert_into(positions)
                        .values(&position_rows)
                        .execute(conn)?;
                }
            }
            {
                use crate::schema::realized_trades::dsl::*;
                // Append-only history: replace keyed on trade id, so rows
                // already stored are rewritten unchanged
                if !trade_rows.is_empty() {
                    diesel::replace_into(realized_trades)
                        .values(&trade_rows)
                        .execute(conn)?;
                }
            }
            {
                use crate::schema::asset_snapshots::dsl::*;
                if !snapshot_rows.is_empty() {
                    diesel::replace_into(asset_snapshots)
                        .values(&snapshot_rows)
                        .execute(conn)?;
                }
            }
            Ok(())
        })?;

        debug!("Saved ledger {}", ledger.account_id);
        Ok(())
    }
}
