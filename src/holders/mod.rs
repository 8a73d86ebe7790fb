pub mod filter;
pub mod types;

pub use filter::non_contract_holders;
pub use types::{HolderPage, HolderRecord};
