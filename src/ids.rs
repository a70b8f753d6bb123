//! Entity ids. Everything here is a pure function of immutable inputs (addresses,
//! hashes, indices), so re-deriving an id is always safe.
//!
//! Composite ids put a fixed-width `0x` + 40 hex address first and join parts with `-`,
//! which never shows up in hex or decimal output, so two different inputs can't
//! produce the same id.
use crate::solidmath::U256;
use anyhow::{anyhow, Result};
use primitive_types::{H160, H256};

pub type Address = H160;

pub const SEPARATOR: &str = "-";

lazy_static! {
    /// mints come out of here
    pub static ref NULL_ADDRESS: Address = Address::zero();
}

/// lowercase, 0x-prefixed, full width
pub fn address_id(address: &Address) -> String {
    format!("{:#x}", address)
}

pub fn get_account_id(account: &Address) -> String {
    address_id(account)
}

pub fn get_market_id(vtoken: &Address) -> String {
    address_id(vtoken)
}

pub fn get_pool_id(comptroller: &Address) -> String {
    address_id(comptroller)
}

pub fn get_rewards_distributor_id(distributor: &Address) -> String {
    address_id(distributor)
}

pub fn get_delegate_id(delegate: &Address) -> String {
    address_id(delegate)
}

pub fn get_account_vtoken_id(market: &Address, account: &Address) -> String {
    [address_id(market), address_id(account)].join(SEPARATOR)
}

pub fn get_reward_speed_id(distributor: &Address, market: &Address) -> String {
    [address_id(distributor), address_id(market)].join(SEPARATOR)
}

pub fn get_pool_action_id(pool: &Address, action: &str) -> String {
    [address_id(pool), action.to_string()].join(SEPARATOR)
}

pub fn get_market_action_id(market: &Address, action: &str) -> String {
    [address_id(market), action.to_string()].join(SEPARATOR)
}

/// one per log: `0x<tx hash>-<log index>`
pub fn get_transaction_id(transaction_hash: &H256, log_index: u64) -> String {
    [format!("{:#x}", transaction_hash), log_index.to_string()].join(SEPARATOR)
}

pub fn get_account_vtoken_transaction_id(
    account: &Address,
    transaction_hash: &H256,
    log_index: u64,
) -> String {
    [
        address_id(account),
        get_transaction_id(transaction_hash, log_index),
    ]
    .join(SEPARATOR)
}

pub fn get_proposal_id(proposal_id: &U256) -> String {
    proposal_id.to_string()
}

pub fn get_vote_id(proposal_id: &U256, voter: &Address) -> String {
    [address_id(voter), get_proposal_id(proposal_id)].join(SEPARATOR)
}

/// Parses a configured or host-supplied address. A malformed one is a configuration
/// error, never something to paper over.
pub fn parse_address(input: &str) -> Result<Address> {
    let digits = input.strip_prefix("0x").unwrap_or(input);
    let bytes =
        hex::decode(digits).map_err(|e| anyhow!("malformed address {:?}: {}", input, e))?;
    if bytes.len() != Address::len_bytes() {
        return Err(anyhow!("malformed address {:?}: want 20 bytes", input));
    }
    Ok(Address::from_slice(&bytes))
}
