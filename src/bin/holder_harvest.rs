//! Holder harvest runtime
//!
//! Fetches every holder of the configured token, keeps the non-contract ones,
//! and writes them to a fresh SQLite file named after the start time.
//!
//! Usage:
//!   cargo run --release --bin holder_harvest
//!
//! Environment variables (see `HarvestConfig::from_env`):
//!   MORALIS_API_KEY - API key (required)
//!   HOLDERS_TOKEN_ADDRESS / HOLDERS_CHAIN - token to scan (default: WBNB on bsc)
//!   HOLDERS_DB_DIR - output directory (default: .)
//!   RUST_LOG - log filter (default: info)
//!
//! Exit codes: 0 done, 1 fetch exhaustion or error, 130 interrupted.
//!
//! An interrupted run has only part of the listing saved, so it does not exit 0
//! like a finished one. It uses 130 (128 + SIGINT) rather than 1 so scripts can
//! tell a partial save apart from a failed fetch.

use chrono::Local;
use dotenv::dotenv;
use holder_harvest::{
    harvest::EXIT_FAILURE,
    store::run_database_path,
    ui::ConsoleReporter,
    CancellationFlag, HarvestConfig, Harvester, HolderStore, RetryingFetcher,
};
use log::{error, info};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let config = match HarvestConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("❌ {}", e);
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    let db_path = run_database_path(&config.db_dir, &config.token_symbol, Local::now());

    info!("🚀 Holder harvest starting");
    info!("   ├─ Token: {} ({})", config.token_address, config.token_symbol);
    info!("   ├─ Chain: {}", config.chain);
    info!("   ├─ Page size: {}", config.page_size);
    info!("   ├─ Retries: {} (delay {:?})", config.retry_limit, config.retry_delay);
    info!("   └─ Database: {}", db_path.display());

    let mut console = ConsoleReporter::stdout(&config.token_symbol);
    if let Err(e) = console.print_banner(&config, &db_path) {
        error!("❌ Failed to write to stdout: {}", e);
        return ExitCode::from(EXIT_FAILURE);
    }

    let fetcher = match RetryingFetcher::http(&config) {
        Ok(fetcher) => fetcher,
        Err(e) => {
            error!("❌ {}", e);
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    info!("🔧 Initializing database...");
    let mut store = match HolderStore::open(&db_path) {
        Ok(store) => store,
        Err(e) => {
            error!("❌ Failed to open {}: {}", db_path.display(), e);
            return ExitCode::from(EXIT_FAILURE);
        }
    };
    if let Err(e) = store.initialize() {
        error!("❌ Failed to initialize schema: {}", e);
        if let Err(e) = store.close() {
            error!("❌ Failed to close store: {}", e);
        }
        return ExitCode::from(EXIT_FAILURE);
    }
    info!("✅ Database initialized");

    let cancel = CancellationFlag::new();
    let _ctrl_c = cancel.listen_for_ctrl_c();
    info!("🔄 Press CTRL+C to stop (the in-flight page is dropped), twice to exit at once");

    let mut harvester = Harvester::new(&config, fetcher, store, console, cancel);
    let report = harvester.run().await;

    ExitCode::from(report.exit_code())
}
