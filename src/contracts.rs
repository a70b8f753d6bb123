//! Point-in-time reads of on-chain state that a log doesn't carry.
//!
//! Callers pick the discipline: must-succeed reads go through `?` and abort the event,
//! best-effort reads go through [`best_effort`] and fall back to zero. Retrying a flaky
//! node is the implementor's business, handlers never retry.
use crate::ids::{address_id, Address};
use crate::solidmath::U256;
use anyhow::Result;
use tracing::warn;

/// On-chain names of the reads, for logs and error context.
pub mod calls {
    pub const GOVERNING_POOL_OF: &str = "comptroller";
    pub const ACCOUNT_SNAPSHOT: &str = "getAccountSnapshot";
    pub const BALANCE_OF: &str = "balanceOf";
    pub const EXCHANGE_RATE: &str = "exchangeRateStored";
    pub const BORROW_INDEX: &str = "borrowIndex";
    pub const RESERVES: &str = "totalReserves";
    pub const CASH: &str = "getCash";
    pub const BORROW_RATE: &str = "borrowRatePerBlock";
    pub const SUPPLY_RATE: &str = "supplyRatePerBlock";
    pub const TOTAL_BORROWS: &str = "totalBorrows";
    pub const TOTAL_SUPPLY: &str = "totalSupply";
    pub const INTEREST_RATE_MODEL: &str = "interestRateModel";
    pub const RESERVE_FACTOR: &str = "reserveFactorMantissa";
    pub const UNDERLYING: &str = "underlying";
    pub const TOKEN_METADATA: &str = "name/symbol/decimals";
    pub const UNDERLYING_PRICE: &str = "getUnderlyingPrice";
    pub const ALL_MARKETS: &str = "getAllMarkets";
    pub const REWARD_TOKEN: &str = "rewardToken";
    pub const REWARD_SPEEDS: &str = "rewardTokenBorrowSpeeds/rewardTokenSupplySpeeds";
}

/// `getAccountSnapshot`: vtoken balance and borrow balance, both mantissas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccountSnapshot {
    pub supplied: U256,
    pub borrowed: U256,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewardSpeeds {
    pub borrow_speed: U256,
    pub supply_speed: U256,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    pub decimals: u32,
}

pub trait ContractReader {
    /// the comptroller a vtoken reports to
    fn governing_pool_of(&self, vtoken: &Address) -> Result<Address>;
    fn account_snapshot(&self, vtoken: &Address, account: &Address) -> Result<AccountSnapshot>;
    fn balance_of(&self, vtoken: &Address, account: &Address) -> Result<U256>;

    fn exchange_rate(&self, vtoken: &Address) -> Result<U256>;
    fn borrow_index(&self, vtoken: &Address) -> Result<U256>;
    fn reserves(&self, vtoken: &Address) -> Result<U256>;
    fn cash(&self, vtoken: &Address) -> Result<U256>;
    fn borrow_rate_per_block(&self, vtoken: &Address) -> Result<U256>;
    fn supply_rate_per_block(&self, vtoken: &Address) -> Result<U256>;
    fn total_borrows(&self, vtoken: &Address) -> Result<U256>;
    fn total_supply(&self, vtoken: &Address) -> Result<U256>;
    fn interest_rate_model(&self, vtoken: &Address) -> Result<Address>;
    fn reserve_factor(&self, vtoken: &Address) -> Result<U256>;
    fn underlying(&self, vtoken: &Address) -> Result<Address>;

    /// name, symbol and decimals of any erc20, vtokens included
    fn token_metadata(&self, token: &Address) -> Result<TokenMetadata>;

    /// oracle price of the market's underlying, scaled by 10^(36 - underlying decimals)
    fn underlying_price(&self, pool: &Address, vtoken: &Address) -> Result<U256>;
    fn all_markets(&self, pool: &Address) -> Result<Vec<Address>>;

    fn reward_token(&self, distributor: &Address) -> Result<Address>;
    fn reward_speeds(&self, distributor: &Address, vtoken: &Address) -> Result<RewardSpeeds>;
}

/// Zero when the read failed, with a warning naming what was lost.
pub fn best_effort(read: Result<U256>, contract: &Address, call: &str) -> U256 {
    match read {
        Ok(value) => value,
        Err(e) => {
            warn!(
                contract = %address_id(contract),
                call,
                error = %e,
                "read failed, falling back to zero"
            );
            U256::zero()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn best_effort_passes_values_through() {
        let market = Address::from_low_u64_be(1);
        assert_eq!(
            best_effort(Ok(U256::from(5)), &market, "borrowRatePerBlock"),
            U256::from(5)
        );
    }

    #[test]
    fn best_effort_degrades_to_zero() {
        let market = Address::from_low_u64_be(1);
        let read = Err(anyhow!("execution reverted"));
        assert_eq!(
            best_effort(read, &market, "supplyRatePerBlock"),
            U256::zero()
        );
    }
}
