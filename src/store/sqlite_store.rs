use super::error::StoreError;
use super::pragma::apply_pragmas;
use super::{HolderStats, StoredHolder};
use crate::holders::HolderRecord;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS token_holders (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner_address TEXT NOT NULL UNIQUE,
        owner_address_label TEXT,
        balance TEXT NOT NULL,
        balance_formatted TEXT NOT NULL,
        is_contract INTEGER NOT NULL,
        entity TEXT,
        entity_logo TEXT,
        usd_value TEXT,
        percentage_relative_to_total_supply REAL,
        created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    );
    CREATE INDEX IF NOT EXISTS idx_owner_address ON token_holders(owner_address);
    CREATE INDEX IF NOT EXISTS idx_balance_formatted ON token_holders(balance_formatted DESC);
";

const HOLDER_COLUMNS: &str = "id, owner_address, owner_address_label, balance, balance_formatted,
     is_contract, entity, entity_logo, usd_value, percentage_relative_to_total_supply, created_at";

/// SQLite-backed holder table
///
/// Owns the single connection of a run. The connection stays open until
/// [`HolderStore::close`]; every call after that fails with `StoreError::Closed`.
pub struct HolderStore {
    conn: Option<Connection>,
    path: Option<PathBuf>,
}

impl HolderStore {
    /// Open (or create) the database file at `db_path`
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db_path = db_path.as_ref();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(db_path)?;
        apply_pragmas(&conn)?;

        Ok(Self {
            conn: Some(conn),
            path: Some(db_path.to_path_buf()),
        })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Some(conn),
            path: None,
        })
    }

    /// File backing this store; `None` for in-memory stores
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Create the table and its indexes if missing
    pub fn initialize(&self) -> Result<(), StoreError> {
        self.conn()?.execute_batch(SCHEMA)?;
        log::info!("✅ token_holders table ready");
        Ok(())
    }

    /// Insert or overwrite `records` keyed by owner address
    ///
    /// The batch is one transaction: on error nothing from it is kept.
    /// Overwritten rows keep their id and get a fresh `created_at`.
    pub fn upsert(&mut self, records: &[HolderRecord]) -> Result<usize, StoreError> {
        let conn = self.conn.as_mut().ok_or(StoreError::Closed)?;
        if records.is_empty() {
            return Ok(0);
        }

        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO token_holders
                    (owner_address, owner_address_label, balance, balance_formatted, is_contract,
                     entity, entity_logo, usd_value, percentage_relative_to_total_supply, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, CURRENT_TIMESTAMP)
                 ON CONFLICT(owner_address) DO UPDATE SET
                    owner_address_label = excluded.owner_address_label,
                    balance = excluded.balance,
                    balance_formatted = excluded.balance_formatted,
                    is_contract = excluded.is_contract,
                    entity = excluded.entity,
                    entity_logo = excluded.entity_logo,
                    usd_value = excluded.usd_value,
                    percentage_relative_to_total_supply = excluded.percentage_relative_to_total_supply,
                    created_at = CURRENT_TIMESTAMP",
            )?;

            for record in records {
                stmt.execute(params![
                    record.owner_address,
                    record.owner_address_label,
                    record.balance,
                    record.balance_formatted,
                    record.is_contract(),
                    record.entity,
                    record.entity_logo,
                    record.usd_value,
                    record.percentage_relative_to_total_supply,
                ])?;
            }
        }
        tx.commit()?;

        log::debug!("✅ Upserted {} holders", records.len());
        Ok(records.len())
    }

    pub fn stats(&self) -> Result<HolderStats, StoreError> {
        let stats = self.conn()?.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(CASE WHEN is_contract = 0 THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN is_contract = 1 THEN 1 ELSE 0 END), 0),
                    MAX(CASE WHEN is_contract = 0 THEN CAST(balance_formatted AS REAL) END)
             FROM token_holders",
            [],
            |row| {
                Ok(HolderStats {
                    total: row.get::<_, i64>(0)? as u64,
                    non_contract: row.get::<_, i64>(1)? as u64,
                    contract: row.get::<_, i64>(2)? as u64,
                    max_balance: row.get(3)?,
                })
            },
        )?;
        Ok(stats)
    }

    pub fn find(&self, owner_address: &str) -> Result<Option<StoredHolder>, StoreError> {
        let holder = self
            .conn()?
            .query_row(
                &format!("SELECT {} FROM token_holders WHERE owner_address = ?1", HOLDER_COLUMNS),
                params![owner_address],
                row_to_holder,
            )
            .optional()?;
        Ok(holder)
    }

    /// Largest non-contract holders, by numeric formatted balance
    pub fn top_holders(&self, limit: usize) -> Result<Vec<StoredHolder>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM token_holders
             WHERE is_contract = 0
             ORDER BY CAST(balance_formatted AS REAL) DESC
             LIMIT ?1",
            HOLDER_COLUMNS
        ))?;

        let holders = stmt
            .query_map(params![limit as i64], row_to_holder)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(holders)
    }

    /// Close the connection; closing twice is a no-op
    pub fn close(&mut self) -> Result<(), StoreError> {
        if let Some(conn) = self.conn.take() {
            conn.close().map_err(|(_, e)| StoreError::Database(e))?;
            log::debug!("Store connection closed");
        }
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.conn.is_none()
    }

    fn conn(&self) -> Result<&Connection, StoreError> {
        self.conn.as_ref().ok_or(StoreError::Closed)
    }
}

fn row_to_holder(row: &Row<'_>) -> rusqlite::Result<StoredHolder> {
    Ok(StoredHolder {
        id: row.get(0)?,
        owner_address: row.get(1)?,
        owner_address_label: row.get(2)?,
        balance: row.get(3)?,
        balance_formatted: row.get(4)?,
        is_contract: row.get(5)?,
        entity: row.get(6)?,
        entity_logo: row.get(7)?,
        usd_value: row.get(8)?,
        percentage_relative_to_total_supply: row.get(9)?,
        created_at: row.get(10)?,
    })
}
