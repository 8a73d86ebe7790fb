//! # holder-harvest
//!
//! Pages through the Moralis ERC20 owners endpoint and keeps the non-contract
//! holders of one token in a per-run SQLite file.
//!
//! ## Flow
//!
//! 1. `fetcher` requests one page (bounded retry, linear backoff on 429)
//! 2. `holders::filter` drops contract addresses
//! 3. `store` upserts the page in a single transaction
//! 4. `harvest` advances the cursor and repeats until the API runs dry
//!
//! Only one page is held in memory at a time.

pub mod config;
pub mod fetcher;
pub mod harvest;
pub mod holders;
pub mod store;
pub mod ui;

pub use config::{ConfigError, HarvestConfig};
pub use fetcher::{HolderSource, RetryingFetcher};
pub use harvest::{CancellationFlag, Harvester, RunReport, Termination};
pub use holders::{HolderPage, HolderRecord};
pub use store::{HolderStats, HolderStore, StoredHolder};
