use super::types::HolderRecord;

/// Keep only holders explicitly marked as non-contract
///
/// Records without an `is_contract` flag are dropped along with contracts.
pub fn non_contract_holders(holders: Vec<HolderRecord>) -> Vec<HolderRecord> {
    holders.into_iter().filter(|h| !h.is_contract()).collect()
}
