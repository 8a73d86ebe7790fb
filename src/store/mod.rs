//! Local persistence for harvested holders
//!
//! One SQLite file per run, one `token_holders` table keyed by owner address.

pub mod error;
mod pragma;
pub mod sqlite_store;

use chrono::{DateTime, Local, NaiveDateTime};
use std::path::{Path, PathBuf};

pub use error::StoreError;
pub use sqlite_store::HolderStore;

/// A persisted holder row
#[derive(Debug, Clone, PartialEq)]
pub struct StoredHolder {
    pub id: i64,
    pub owner_address: String,
    pub owner_address_label: Option<String>,
    pub balance: String,
    pub balance_formatted: String,
    pub is_contract: bool,
    pub entity: Option<String>,
    pub entity_logo: Option<String>,
    pub usd_value: Option<String>,
    pub percentage_relative_to_total_supply: Option<f64>,
    pub created_at: NaiveDateTime,
}

/// Aggregate view over the holder table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HolderStats {
    pub total: u64,
    pub non_contract: u64,
    pub contract: u64,
    /// Largest `balance_formatted` among non-contract rows, compared numerically
    pub max_balance: Option<f64>,
}

/// Database file for a run started at `started_at`, e.g. `wbnb_holders_20250101_093000.db`
pub fn run_database_path(dir: &Path, token_symbol: &str, started_at: DateTime<Local>) -> PathBuf {
    dir.join(format!(
        "{}_holders_{}.db",
        token_symbol.to_lowercase(),
        started_at.format("%Y%m%d_%H%M%S")
    ))
}
