//! Harvest configuration from environment variables
//!
//! Every knob of a run lives here and is handed to the driver at construction,
//! so tests can point the fetcher at a mock server or another token.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://deep-index.moralis.io/api/v2.2";
pub const DEFAULT_TOKEN_ADDRESS: &str = "0xbb4CdB9CBd36B01bD1cBaEBF2De08d9173bc095c"; // WBNB
pub const MAX_PAGE_SIZE: u32 = 100;

/// Sort order requested from the owners endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    MissingVariable(String),
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingVariable(var) => write!(f, "Missing environment variable: {}", var),
            ConfigError::InvalidValue(msg) => write!(f, "Invalid configuration value: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Configuration for one harvest run
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    /// Moralis API key, sent as `X-API-Key`
    pub api_key: String,

    /// API root, without trailing slash
    pub base_url: String,

    /// ERC20 contract whose holders are fetched
    pub token_address: String,

    /// Short name used for the database file and the summary
    pub token_symbol: String,

    /// Chain identifier understood by the API (e.g. `bsc`, `eth`)
    pub chain: String,

    /// Holders per page
    pub page_size: u32,

    pub order: SortOrder,

    /// Extra attempts after the first failed one
    pub retry_limit: u32,

    /// Base wait between attempts
    pub retry_delay: Duration,

    /// Pause between successful pages (zero = full speed)
    pub request_delay: Duration,

    /// Per-request HTTP timeout
    pub request_timeout: Duration,

    /// Directory that receives the per-run database file
    pub db_dir: PathBuf,
}

impl HarvestConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `MORALIS_API_KEY` (required)
    /// - `MORALIS_API_URL` (default: https://deep-index.moralis.io/api/v2.2)
    /// - `HOLDERS_TOKEN_ADDRESS` (default: WBNB on BSC)
    /// - `HOLDERS_TOKEN_SYMBOL` (default: wbnb)
    /// - `HOLDERS_CHAIN` (default: bsc)
    /// - `HOLDERS_PAGE_SIZE` (default: 100)
    /// - `HOLDERS_ORDER` (default: DESC)
    /// - `HOLDERS_RETRY_LIMIT` (default: 3)
    /// - `HOLDERS_RETRY_DELAY_MS` (default: 1000)
    /// - `HOLDERS_REQUEST_DELAY_MS` (default: 0)
    /// - `HOLDERS_REQUEST_TIMEOUT_SECS` (default: 30)
    /// - `HOLDERS_DB_DIR` (default: .)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`HarvestConfig::from_env`] but reads values through `lookup`
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("MORALIS_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingVariable("MORALIS_API_KEY".to_string()))?;

        let base_url = lookup("MORALIS_API_URL")
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue(
                "MORALIS_API_URL must start with http:// or https://".to_string(),
            ));
        }

        let token_address =
            lookup("HOLDERS_TOKEN_ADDRESS").unwrap_or_else(|| DEFAULT_TOKEN_ADDRESS.to_string());
        if token_address.is_empty() {
            return Err(ConfigError::InvalidValue(
                "HOLDERS_TOKEN_ADDRESS cannot be empty".to_string(),
            ));
        }

        let page_size = parse_or(&lookup, "HOLDERS_PAGE_SIZE", MAX_PAGE_SIZE)?;
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::InvalidValue(format!(
                "HOLDERS_PAGE_SIZE must be between 1 and {}, got {}",
                MAX_PAGE_SIZE, page_size
            )));
        }

        let order = match lookup("HOLDERS_ORDER")
            .unwrap_or_else(|| "DESC".to_string())
            .to_uppercase()
            .as_str()
        {
            "ASC" => SortOrder::Asc,
            "DESC" => SortOrder::Desc,
            other => {
                return Err(ConfigError::InvalidValue(format!(
                    "HOLDERS_ORDER must be ASC or DESC, got '{}'",
                    other
                )))
            }
        };

        Ok(Self {
            api_key,
            base_url,
            token_address,
            token_symbol: lookup("HOLDERS_TOKEN_SYMBOL").unwrap_or_else(|| "wbnb".to_string()),
            chain: lookup("HOLDERS_CHAIN").unwrap_or_else(|| "bsc".to_string()),
            page_size,
            order,
            retry_limit: parse_or(&lookup, "HOLDERS_RETRY_LIMIT", 3)?,
            retry_delay: Duration::from_millis(parse_or(&lookup, "HOLDERS_RETRY_DELAY_MS", 1_000)?),
            request_delay: Duration::from_millis(parse_or(&lookup, "HOLDERS_REQUEST_DELAY_MS", 0)?),
            request_timeout: Duration::from_secs(parse_or(
                &lookup,
                "HOLDERS_REQUEST_TIMEOUT_SECS",
                30,
            )?),
            db_dir: PathBuf::from(lookup("HOLDERS_DB_DIR").unwrap_or_else(|| ".".to_string())),
        })
    }

    /// Full URL of the owners endpoint for the configured token
    pub fn owners_url(&self) -> String {
        format!("{}/erc20/{}/owners", self.base_url, self.token_address)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<T>().map_err(|_| {
            ConfigError::InvalidValue(format!("{} is not a valid number: '{}'", key, raw))
        }),
    }
}
