//! Wire types for the Moralis owners endpoint

use serde::{Deserialize, Deserializer};

/// One holder entry as returned by the API
///
/// Balances stay decimal strings so 256-bit amounts survive untouched.
/// Address and balances are optional so one malformed entry cannot sink the
/// whole page; the store rejects a batch that still carries a missing one.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HolderRecord {
    #[serde(default)]
    pub owner_address: Option<String>,
    #[serde(default)]
    pub owner_address_label: Option<String>,
    #[serde(default)]
    pub balance: Option<String>,
    #[serde(default)]
    pub balance_formatted: Option<String>,
    /// `None` when the API omits the flag
    #[serde(default)]
    pub is_contract: Option<bool>,
    #[serde(default)]
    pub entity: Option<String>,
    #[serde(default)]
    pub entity_logo: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub usd_value: Option<String>,
    #[serde(default)]
    pub percentage_relative_to_total_supply: Option<f64>,
}

impl HolderRecord {
    /// Contract flag with the conservative default: unknown counts as a contract
    pub fn is_contract(&self) -> bool {
        self.is_contract.unwrap_or(true)
    }
}

/// One page of the owners listing
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct HolderPage {
    #[serde(default)]
    pub result: Vec<HolderRecord>,
    #[serde(default)]
    pub cursor: Option<String>,
    /// Only present on the first page
    #[serde(rename = "totalSupply", default, deserialize_with = "string_or_number")]
    pub total_supply: Option<String>,
}

impl HolderPage {
    /// Cursor for the following page; an empty string also ends the stream
    pub fn next_cursor(&self) -> Option<&str> {
        self.cursor.as_deref().filter(|c| !c.is_empty())
    }
}

// usd_value and totalSupply have shown up both quoted and bare
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}
