use crate::entities::impl_entity;
use crate::solidmath::U256;
use anyhow::{anyhow, Result};
use bigdecimal::BigDecimal;
use primitive_types::H256;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub count_liquidator: u64,
    pub count_liquidated: u64,
    pub has_borrowed: bool,
}

impl Account {
    pub fn new(id: String) -> Self {
        Account {
            id,
            count_liquidator: 0,
            count_liquidated: 0,
            has_borrowed: false,
        }
    }
}

impl_entity!(Account, "Account");

/// A comptroller and the risk parameters it applies to its markets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pool {
    pub id: String,
    pub name: String,
    pub creator: Option<String>,
    pub block_posted: u64,
    pub timestamp_posted: u64,
    pub category: String,
    pub logo_url: String,
    pub description: String,
    pub price_oracle: Option<String>,
    pub pause_guardian: Option<String>,
    pub close_factor_mantissa: U256,
    pub liquidation_incentive_mantissa: U256,
    pub min_liquidatable_collateral_mantissa: U256,
}

impl_entity!(Pool, "Pool");

/// One vtoken. Mantissa fields are raw chain integers, `cash` and the usd price are
/// decimals truncated to the underlying's precision.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Market {
    pub id: String,
    pub pool: String,
    pub is_listed: bool,
    pub name: String,
    pub symbol: String,
    pub vtoken_decimals: u32,
    pub underlying_address: String,
    pub underlying_name: String,
    pub underlying_symbol: String,
    pub underlying_decimals: u32,
    pub underlying_price_usd: BigDecimal,
    pub interest_rate_model: String,
    pub reserve_factor_mantissa: U256,
    pub collateral_factor_mantissa: U256,
    pub liquidation_threshold_mantissa: U256,
    pub borrow_cap_mantissa: U256,
    pub supply_cap_mantissa: U256,
    /// last block the interest dependent fields below were read at, never goes back
    pub accrual_block_number: u64,
    pub block_timestamp: u64,
    pub exchange_rate_mantissa: U256,
    pub borrow_index_mantissa: U256,
    pub reserves_mantissa: U256,
    pub cash: BigDecimal,
    pub borrow_rate_mantissa: U256,
    pub supply_rate_mantissa: U256,
    pub treasury_total_borrows_mantissa: U256,
    pub treasury_total_supply_mantissa: U256,
    // only ever moved by +1/-1 on a detected transition, so these are signed:
    // a position that predates the indexer can take one below zero
    pub borrower_count: i64,
    pub borrower_count_adjusted: i64,
    pub supplier_count: i64,
}

impl_entity!(Market, "Market");

/// An account's position in one market.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountVToken {
    pub id: String,
    pub market: String,
    pub account: String,
    pub entered_market: bool,
    pub accrual_block_number: u64,
    pub account_vtoken_supply_balance_mantissa: U256,
    pub account_borrow_balance_mantissa: U256,
    pub account_borrow_index_mantissa: U256,
    pub total_underlying_supplied_mantissa: U256,
    pub total_underlying_redeemed_mantissa: U256,
    pub total_underlying_borrowed_mantissa: U256,
    pub total_underlying_repaid_mantissa: U256,
    /// whether this position is one of the market's `borrower_count_adjusted`
    #[serde(default)]
    pub adjusted_borrower: bool,
}

impl_entity!(AccountVToken, "AccountVToken");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountVTokenTransaction {
    pub id: String,
    pub account_vtoken: String,
    pub transaction_hash: H256,
    pub block_number: u64,
    pub timestamp: u64,
    pub log_index: u64,
}

impl_entity!(AccountVTokenTransaction, "AccountVTokenTransaction");

// history rows below are written once per log and never touched again

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MintEvent {
    pub id: String,
    pub market: String,
    pub minter: String,
    /// set for mint-behalf, where someone else paid
    pub payer: Option<String>,
    pub amount_mantissa: U256,
    pub underlying_amount_mantissa: U256,
    pub block_number: u64,
    pub block_time: u64,
}

impl_entity!(MintEvent, "MintEvent");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedeemEvent {
    pub id: String,
    pub market: String,
    pub redeemer: String,
    pub amount_mantissa: U256,
    pub underlying_amount_mantissa: U256,
    pub block_number: u64,
    pub block_time: u64,
}

impl_entity!(RedeemEvent, "RedeemEvent");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BorrowEvent {
    pub id: String,
    pub market: String,
    pub borrower: String,
    pub amount_mantissa: U256,
    pub account_borrows_mantissa: U256,
    pub block_number: u64,
    pub block_time: u64,
}

impl_entity!(BorrowEvent, "BorrowEvent");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepayEvent {
    pub id: String,
    pub market: String,
    pub borrower: String,
    pub payer: String,
    pub amount_mantissa: U256,
    pub account_borrows_mantissa: U256,
    pub block_number: u64,
    pub block_time: u64,
}

impl_entity!(RepayEvent, "RepayEvent");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferEvent {
    pub id: String,
    pub market: String,
    pub from: String,
    pub to: String,
    pub amount_mantissa: U256,
    pub underlying_amount_mantissa: U256,
    pub block_number: u64,
    pub block_time: u64,
}

impl_entity!(TransferEvent, "TransferEvent");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidationEvent {
    pub id: String,
    pub market: String,
    pub liquidator: String,
    pub borrower: String,
    pub repay_amount_mantissa: U256,
    pub vtoken_collateral: String,
    pub seize_amount_mantissa: U256,
    pub block_number: u64,
    pub block_time: u64,
}

impl_entity!(LiquidationEvent, "LiquidationEvent");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardsDistributor {
    pub id: String,
    pub pool: String,
    /// the token being handed out
    pub reward: String,
}

impl_entity!(RewardsDistributor, "RewardsDistributor");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardSpeed {
    pub id: String,
    pub rewards_distributor: String,
    pub market: String,
    pub borrow_speed_per_block_mantissa: U256,
    pub supply_speed_per_block_mantissa: U256,
}

impl_entity!(RewardSpeed, "RewardSpeed");

/// Pool wide pause switch, last write wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolAction {
    pub id: String,
    pub pool: String,
    pub action: String,
    pub pause_state: bool,
}

impl_entity!(PoolAction, "PoolAction");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketAction {
    pub id: String,
    pub market: String,
    pub action: Action,
    pub pause_state: bool,
}

impl_entity!(MarketAction, "MarketAction");

/// What a comptroller can pause on a single market, numbered as on chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Mint,
    Redeem,
    Borrow,
    Repay,
    Seize,
    Liquidate,
    Transfer,
    EnterMarket,
    ExitMarket,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Mint => "MINT",
            Action::Redeem => "REDEEM",
            Action::Borrow => "BORROW",
            Action::Repay => "REPAY",
            Action::Seize => "SEIZE",
            Action::Liquidate => "LIQUIDATE",
            Action::Transfer => "TRANSFER",
            Action::EnterMarket => "ENTER_MARKET",
            Action::ExitMarket => "EXIT_MARKET",
        }
    }
}

impl TryFrom<u8> for Action {
    type Error = anyhow::Error;

    fn try_from(code: u8) -> Result<Self> {
        Ok(match code {
            0 => Action::Mint,
            1 => Action::Redeem,
            2 => Action::Borrow,
            3 => Action::Repay,
            4 => Action::Seize,
            5 => Action::Liquidate,
            6 => Action::Transfer,
            7 => Action::EnterMarket,
            8 => Action::ExitMarket,
            _ => return Err(anyhow!("unknown market action code {}", code)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{decode, encode};
    use std::str::FromStr;

    #[test]
    fn action_codes_follow_chain_numbering() {
        assert_eq!(Action::try_from(0).unwrap(), Action::Mint);
        assert_eq!(Action::try_from(6).unwrap(), Action::Transfer);
        assert_eq!(Action::try_from(8).unwrap(), Action::ExitMarket);
        assert!(Action::try_from(9).is_err());
        assert_eq!(Action::EnterMarket.name(), "ENTER_MARKET");
    }

    #[test]
    fn market_decimals_survive_storage() {
        let market = Market {
            id: "0x01".to_string(),
            cash: BigDecimal::from_str("1234.000001").unwrap(),
            underlying_price_usd: BigDecimal::from_str("0.99999999").unwrap(),
            exchange_rate_mantissa: U256::from_dec_str("200000000000000000000000000").unwrap(),
            borrower_count: -1,
            ..Default::default()
        };
        let back: Market = decode(&market.id, &encode(&market).unwrap()).unwrap();
        assert_eq!(back, market);
    }
}
