//! An in-process chain to run handlers against, and a builder for the logs they consume.
//! Nothing here talks to a node: state is whatever the test put in, and any read can be
//! made to fail by name.
use crate::contracts::{calls, AccountSnapshot, ContractReader, RewardSpeeds, TokenMetadata};
use crate::ids::{address_id, Address};
use crate::ingest_chain::events::{
    EventKind, GovernanceEvent, LogEvent, MarketEvent, PoolEvent, RegistryEvent, RewardsEvent,
};
use crate::ingest_chain::EventContext;
use crate::solidmath::fixed_point::MANTISSA_ONE;
use crate::solidmath::U256;
use anyhow::{anyhow, Result};
use primitive_types::H256;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

pub fn address(n: u64) -> Address {
    Address::from_low_u64_be(n)
}

/// context of a lone log at the start of `block_number`
pub fn context(block_number: u64, block_timestamp: u64) -> EventContext {
    EventContext {
        block_number,
        block_timestamp,
        transaction_hash: H256::from_low_u64_be(block_number),
        transaction_index: 0,
        log_index: 0,
        transaction_log_index: 0,
    }
}

/// Per-vtoken values behind the market recompute reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketState {
    pub exchange_rate: U256,
    pub borrow_index: U256,
    pub reserves: U256,
    pub cash: U256,
    pub borrow_rate: U256,
    pub supply_rate: U256,
    pub total_borrows: U256,
    pub total_supply: U256,
    pub interest_rate_model: Address,
    pub reserve_factor: U256,
}

impl Default for MarketState {
    fn default() -> Self {
        MarketState {
            exchange_rate: *MANTISSA_ONE,
            borrow_index: *MANTISSA_ONE,
            reserves: U256::zero(),
            cash: U256::zero(),
            borrow_rate: U256::zero(),
            supply_rate: U256::zero(),
            total_borrows: U256::zero(),
            total_supply: U256::zero(),
            interest_rate_model: Address::zero(),
            reserve_factor: U256::zero(),
        }
    }
}

#[derive(Default)]
pub struct MockChain {
    pools: HashMap<Address, Address>,
    markets: HashMap<Address, MarketState>,
    underlyings: HashMap<Address, Address>,
    tokens: HashMap<Address, TokenMetadata>,
    prices: HashMap<Address, U256>,
    snapshots: HashMap<(Address, Address), AccountSnapshot>,
    balances: HashMap<(Address, Address), U256>,
    all_markets: HashMap<Address, Vec<Address>>,
    reward_tokens: HashMap<Address, Address>,
    reward_speeds: HashMap<(Address, Address), RewardSpeeds>,
    failing: HashSet<&'static str>,
    calls: RefCell<HashMap<&'static str, usize>>,
}

impl MockChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// A listed vtoken with an 18 decimal underlying priced at $1, a 1:1 exchange
    /// rate and everything else zero.
    pub fn with_market(&mut self, vtoken: Address, pool: Address) -> &mut Self {
        let underlying = Address::from_low_u64_be(vtoken.to_low_u64_be() ^ 0xffff_0000);
        self.pools.insert(vtoken, pool);
        self.markets.entry(vtoken).or_default();
        self.underlyings.insert(vtoken, underlying);
        self.tokens.insert(
            vtoken,
            TokenMetadata {
                name: format!("Venus Token {}", vtoken.to_low_u64_be()),
                symbol: format!("vTKN{}", vtoken.to_low_u64_be()),
                decimals: 8,
            },
        );
        self.tokens.insert(
            underlying,
            TokenMetadata {
                name: format!("Token {}", vtoken.to_low_u64_be()),
                symbol: format!("TKN{}", vtoken.to_low_u64_be()),
                decimals: 18,
            },
        );
        self.prices.insert(vtoken, *MANTISSA_ONE);
        self.all_markets.entry(pool).or_default().push(vtoken);
        self
    }

    pub fn market_state_mut(&mut self, vtoken: Address) -> &mut MarketState {
        self.markets.entry(vtoken).or_default()
    }

    pub fn set_underlying_decimals(&mut self, vtoken: Address, decimals: u32) {
        if let Some(underlying) = self.underlyings.get(&vtoken) {
            if let Some(metadata) = self.tokens.get_mut(underlying) {
                metadata.decimals = decimals;
            }
        }
    }

    pub fn set_price(&mut self, vtoken: Address, price: U256) {
        self.prices.insert(vtoken, price);
    }

    pub fn set_snapshot(&mut self, vtoken: Address, account: Address, snapshot: AccountSnapshot) {
        self.snapshots.insert((vtoken, account), snapshot);
    }

    pub fn set_balance(&mut self, vtoken: Address, account: Address, balance: U256) {
        self.balances.insert((vtoken, account), balance);
    }

    pub fn set_all_markets(&mut self, pool: Address, markets: Vec<Address>) {
        self.all_markets.insert(pool, markets);
    }

    pub fn set_reward_token(&mut self, distributor: Address, token: Address) {
        self.reward_tokens.insert(distributor, token);
    }

    pub fn set_reward_speeds(&mut self, distributor: Address, vtoken: Address, speeds: RewardSpeeds) {
        self.reward_speeds.insert((distributor, vtoken), speeds);
    }

    /// every read named `call` reverts until `heal`
    pub fn fail(&mut self, call: &'static str) {
        self.failing.insert(call);
    }

    pub fn heal(&mut self, call: &'static str) {
        self.failing.remove(call);
    }

    /// how many times `call` was attempted, failed attempts included
    pub fn calls(&self, call: &str) -> usize {
        self.calls.borrow().get(call).copied().unwrap_or(0)
    }

    fn read<T>(&self, call: &'static str, target: &Address, value: Option<T>) -> Result<T> {
        *self.calls.borrow_mut().entry(call).or_insert(0) += 1;
        if self.failing.contains(call) {
            return Err(anyhow!("{} reverted on {}", call, address_id(target)));
        }
        value.ok_or_else(|| anyhow!("no {} state for {}", call, address_id(target)))
    }

    fn market(&self, vtoken: &Address) -> Option<&MarketState> {
        self.markets.get(vtoken)
    }
}

impl ContractReader for MockChain {
    fn governing_pool_of(&self, vtoken: &Address) -> Result<Address> {
        self.read(calls::GOVERNING_POOL_OF, vtoken, self.pools.get(vtoken).copied())
    }

    // mappings on chain answer zero for accounts they've never seen
    fn account_snapshot(&self, vtoken: &Address, account: &Address) -> Result<AccountSnapshot> {
        let snapshot = self
            .snapshots
            .get(&(*vtoken, *account))
            .copied()
            .unwrap_or_default();
        self.read(calls::ACCOUNT_SNAPSHOT, vtoken, Some(snapshot))
    }

    fn balance_of(&self, vtoken: &Address, account: &Address) -> Result<U256> {
        let balance = self
            .balances
            .get(&(*vtoken, *account))
            .copied()
            .unwrap_or_default();
        self.read(calls::BALANCE_OF, vtoken, Some(balance))
    }

    fn exchange_rate(&self, vtoken: &Address) -> Result<U256> {
        self.read(calls::EXCHANGE_RATE, vtoken, self.market(vtoken).map(|m| m.exchange_rate))
    }

    fn borrow_index(&self, vtoken: &Address) -> Result<U256> {
        self.read(calls::BORROW_INDEX, vtoken, self.market(vtoken).map(|m| m.borrow_index))
    }

    fn reserves(&self, vtoken: &Address) -> Result<U256> {
        self.read(calls::RESERVES, vtoken, self.market(vtoken).map(|m| m.reserves))
    }

    fn cash(&self, vtoken: &Address) -> Result<U256> {
        self.read(calls::CASH, vtoken, self.market(vtoken).map(|m| m.cash))
    }

    fn borrow_rate_per_block(&self, vtoken: &Address) -> Result<U256> {
        self.read(calls::BORROW_RATE, vtoken, self.market(vtoken).map(|m| m.borrow_rate))
    }

    fn supply_rate_per_block(&self, vtoken: &Address) -> Result<U256> {
        self.read(calls::SUPPLY_RATE, vtoken, self.market(vtoken).map(|m| m.supply_rate))
    }

    fn total_borrows(&self, vtoken: &Address) -> Result<U256> {
        self.read(calls::TOTAL_BORROWS, vtoken, self.market(vtoken).map(|m| m.total_borrows))
    }

    fn total_supply(&self, vtoken: &Address) -> Result<U256> {
        self.read(calls::TOTAL_SUPPLY, vtoken, self.market(vtoken).map(|m| m.total_supply))
    }

    fn interest_rate_model(&self, vtoken: &Address) -> Result<Address> {
        self.read(
            calls::INTEREST_RATE_MODEL,
            vtoken,
            self.market(vtoken).map(|m| m.interest_rate_model),
        )
    }

    fn reserve_factor(&self, vtoken: &Address) -> Result<U256> {
        self.read(calls::RESERVE_FACTOR, vtoken, self.market(vtoken).map(|m| m.reserve_factor))
    }

    fn underlying(&self, vtoken: &Address) -> Result<Address> {
        self.read(calls::UNDERLYING, vtoken, self.underlyings.get(vtoken).copied())
    }

    fn token_metadata(&self, token: &Address) -> Result<TokenMetadata> {
        self.read(calls::TOKEN_METADATA, token, self.tokens.get(token).cloned())
    }

    fn underlying_price(&self, _pool: &Address, vtoken: &Address) -> Result<U256> {
        self.read(calls::UNDERLYING_PRICE, vtoken, self.prices.get(vtoken).copied())
    }

    fn all_markets(&self, pool: &Address) -> Result<Vec<Address>> {
        let markets = self.all_markets.get(pool).cloned().unwrap_or_default();
        self.read(calls::ALL_MARKETS, pool, Some(markets))
    }

    fn reward_token(&self, distributor: &Address) -> Result<Address> {
        self.read(calls::REWARD_TOKEN, distributor, self.reward_tokens.get(distributor).copied())
    }

    fn reward_speeds(&self, distributor: &Address, vtoken: &Address) -> Result<RewardSpeeds> {
        let speeds = self
            .reward_speeds
            .get(&(*distributor, *vtoken))
            .copied()
            .unwrap_or_default();
        self.read(calls::REWARD_SPEEDS, distributor, Some(speeds))
    }
}

/// Hands out logs in chain order. Logs land in the current transaction until
/// `next_transaction`, and `next_block` starts a fresh block.
pub struct EventFactory {
    block_number: u64,
    block_timestamp: u64,
    transaction_index: u64,
    log_index: u64,
    transaction_log_index: u64,
    transactions: u64,
}

impl EventFactory {
    pub fn new(block_number: u64) -> Self {
        EventFactory {
            block_number,
            block_timestamp: block_number * 3,
            transaction_index: 0,
            log_index: 0,
            transaction_log_index: 0,
            transactions: 1,
        }
    }

    pub fn block_number(&self) -> u64 {
        self.block_number
    }

    pub fn next_block(&mut self) -> &mut Self {
        self.block_number += 1;
        self.block_timestamp += 3;
        self.transaction_index = 0;
        self.log_index = 0;
        self.transaction_log_index = 0;
        self.transactions += 1;
        self
    }

    pub fn next_transaction(&mut self) -> &mut Self {
        self.transaction_index += 1;
        self.transaction_log_index = 0;
        self.transactions += 1;
        self
    }

    pub fn event(&mut self, address: Address, kind: EventKind) -> LogEvent {
        let context = EventContext {
            block_number: self.block_number,
            block_timestamp: self.block_timestamp,
            transaction_hash: H256::from_low_u64_be(self.transactions),
            transaction_index: self.transaction_index,
            log_index: self.log_index,
            transaction_log_index: self.transaction_log_index,
        };
        self.log_index += 1;
        self.transaction_log_index += 1;
        LogEvent {
            address,
            context,
            kind,
        }
    }

    pub fn pool(&mut self, comptroller: Address, event: PoolEvent) -> LogEvent {
        self.event(comptroller, EventKind::Pool(event))
    }

    pub fn market(&mut self, vtoken: Address, event: MarketEvent) -> LogEvent {
        self.event(vtoken, EventKind::Market(event))
    }

    pub fn rewards(&mut self, distributor: Address, event: RewardsEvent) -> LogEvent {
        self.event(distributor, EventKind::Rewards(event))
    }

    pub fn registry(&mut self, registry: Address, event: RegistryEvent) -> LogEvent {
        self.event(registry, EventKind::Registry(event))
    }

    pub fn governance(&mut self, governor: Address, event: GovernanceEvent) -> LogEvent {
        self.event(governor, EventKind::Governance(event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_orders_logs() {
        let mut factory = EventFactory::new(10);
        let vtoken = address(0x10);
        let accrue = MarketEvent::AccrueInterest {
            cash_prior: U256::zero(),
            interest_accumulated: U256::zero(),
            borrow_index: U256::zero(),
            total_borrows: U256::zero(),
        };
        let a = factory.market(vtoken, accrue.clone());
        factory.next_transaction();
        let b = factory.market(vtoken, accrue.clone());
        factory.next_block();
        let c = factory.market(vtoken, accrue);
        assert!(a.ordinal() < b.ordinal());
        assert!(b.ordinal() < c.ordinal());
        assert_ne!(a.context.transaction_hash, b.context.transaction_hash);
        assert_eq!(b.context.transaction_log_index, 0);
        assert_eq!(b.context.log_index, 1);
        assert_eq!(c.context.block_number, 11);
    }

    #[test]
    fn failures_are_counted_and_healable() {
        let mut chain = MockChain::new();
        chain.with_market(address(0x10), address(0x01));
        chain.fail(calls::CASH);
        assert!(chain.cash(&address(0x10)).is_err());
        chain.heal(calls::CASH);
        assert!(chain.cash(&address(0x10)).is_ok());
        assert_eq!(chain.calls(calls::CASH), 2);
    }

    #[test]
    fn unknown_contracts_have_no_state() {
        let chain = MockChain::new();
        assert!(chain.exchange_rate(&address(0x99)).is_err());
        assert_eq!(
            chain.account_snapshot(&address(0x99), &address(1)).unwrap(),
            AccountSnapshot::default()
        );
    }
}
