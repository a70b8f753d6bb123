use crate::entities::governance::{ProposalState, VoteSupport};
use crate::ids::Address;
use crate::ingest_chain::db_types::{EventContext, EventOrdinal};
use crate::solidmath::U256;
use serde::{Deserialize, Serialize};

/// One decoded log, as handed over by the ingestion layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEvent {
    /// the contract that emitted the log
    pub address: Address,
    pub context: EventContext,
    pub kind: EventKind,
}

impl LogEvent {
    pub fn ordinal(&self) -> EventOrdinal {
        self.context.ordinal()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventKind {
    /// emitted by a comptroller
    Pool(PoolEvent),
    /// emitted by a vtoken
    Market(MarketEvent),
    /// emitted by a rewards distributor
    Rewards(RewardsEvent),
    /// emitted by the pool registry
    Registry(RegistryEvent),
    /// emitted by a governor or the voting token
    Governance(GovernanceEvent),
}

impl EventKind {
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::Pool(e) => e.name(),
            EventKind::Market(e) => e.name(),
            EventKind::Rewards(e) => e.name(),
            EventKind::Registry(e) => e.name(),
            EventKind::Governance(e) => e.name(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PoolEvent {
    MarketSupported {
        vtoken: Address,
    },
    MarketUnlisted {
        vtoken: Address,
    },
    MarketEntered {
        vtoken: Address,
        account: Address,
    },
    MarketExited {
        vtoken: Address,
        account: Address,
    },
    NewCloseFactor {
        new_close_factor_mantissa: U256,
    },
    NewCollateralFactor {
        vtoken: Address,
        new_collateral_factor_mantissa: U256,
    },
    NewLiquidationThreshold {
        vtoken: Address,
        new_liquidation_threshold_mantissa: U256,
    },
    NewLiquidationIncentive {
        new_liquidation_incentive_mantissa: U256,
    },
    NewPriceOracle {
        new_price_oracle: Address,
    },
    NewPauseGuardian {
        new_pause_guardian: Address,
    },
    ActionPausedMarket {
        vtoken: Address,
        action: u8,
        pause_state: bool,
    },
    ActionPausedPool {
        action: String,
        pause_state: bool,
    },
    NewBorrowCap {
        vtoken: Address,
        new_borrow_cap: U256,
    },
    NewSupplyCap {
        vtoken: Address,
        new_supply_cap: U256,
    },
    NewMinLiquidatableCollateral {
        new_min_liquidatable_collateral: U256,
    },
    NewRewardsDistributor {
        rewards_distributor: Address,
    },
}

impl PoolEvent {
    pub fn name(&self) -> &'static str {
        match self {
            PoolEvent::MarketSupported { .. } => "MarketSupported",
            PoolEvent::MarketUnlisted { .. } => "MarketUnlisted",
            PoolEvent::MarketEntered { .. } => "MarketEntered",
            PoolEvent::MarketExited { .. } => "MarketExited",
            PoolEvent::NewCloseFactor { .. } => "NewCloseFactor",
            PoolEvent::NewCollateralFactor { .. } => "NewCollateralFactor",
            PoolEvent::NewLiquidationThreshold { .. } => "NewLiquidationThreshold",
            PoolEvent::NewLiquidationIncentive { .. } => "NewLiquidationIncentive",
            PoolEvent::NewPriceOracle { .. } => "NewPriceOracle",
            PoolEvent::NewPauseGuardian { .. } => "NewPauseGuardian",
            PoolEvent::ActionPausedMarket { .. } => "ActionPausedMarket",
            PoolEvent::ActionPausedPool { .. } => "ActionPausedPool",
            PoolEvent::NewBorrowCap { .. } => "NewBorrowCap",
            PoolEvent::NewSupplyCap { .. } => "NewSupplyCap",
            PoolEvent::NewMinLiquidatableCollateral { .. } => "NewMinLiquidatableCollateral",
            PoolEvent::NewRewardsDistributor { .. } => "NewRewardsDistributor",
        }
    }
}

// `account_balance` is None on legacy vtokens whose mint/redeem logs don't carry the
// account's post-event balance; it gets read from the token instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MarketEvent {
    Mint {
        minter: Address,
        mint_amount: U256,
        mint_tokens: U256,
        account_balance: Option<U256>,
    },
    MintBehalf {
        payer: Address,
        receiver: Address,
        mint_amount: U256,
        mint_tokens: U256,
        account_balance: Option<U256>,
    },
    Redeem {
        redeemer: Address,
        redeem_amount: U256,
        redeem_tokens: U256,
        account_balance: Option<U256>,
    },
    Borrow {
        borrower: Address,
        borrow_amount: U256,
        account_borrows: U256,
        total_borrows: U256,
    },
    RepayBorrow {
        payer: Address,
        borrower: Address,
        repay_amount: U256,
        account_borrows: U256,
        total_borrows: U256,
    },
    LiquidateBorrow {
        liquidator: Address,
        borrower: Address,
        repay_amount: U256,
        vtoken_collateral: Address,
        seize_tokens: U256,
    },
    Transfer {
        from: Address,
        to: Address,
        amount: U256,
    },
    AccrueInterest {
        cash_prior: U256,
        interest_accumulated: U256,
        borrow_index: U256,
        total_borrows: U256,
    },
    NewReserveFactor {
        old_reserve_factor_mantissa: U256,
        new_reserve_factor_mantissa: U256,
    },
    NewMarketInterestRateModel {
        old_interest_rate_model: Address,
        new_interest_rate_model: Address,
    },
}

impl MarketEvent {
    pub fn name(&self) -> &'static str {
        match self {
            MarketEvent::Mint { .. } => "Mint",
            MarketEvent::MintBehalf { .. } => "MintBehalf",
            MarketEvent::Redeem { .. } => "Redeem",
            MarketEvent::Borrow { .. } => "Borrow",
            MarketEvent::RepayBorrow { .. } => "RepayBorrow",
            MarketEvent::LiquidateBorrow { .. } => "LiquidateBorrow",
            MarketEvent::Transfer { .. } => "Transfer",
            MarketEvent::AccrueInterest { .. } => "AccrueInterest",
            MarketEvent::NewReserveFactor { .. } => "NewReserveFactor",
            MarketEvent::NewMarketInterestRateModel { .. } => "NewMarketInterestRateModel",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RewardsEvent {
    RewardTokenBorrowSpeedUpdated { vtoken: Address, new_speed: U256 },
    RewardTokenSupplySpeedUpdated { vtoken: Address, new_speed: U256 },
}

impl RewardsEvent {
    pub fn name(&self) -> &'static str {
        match self {
            RewardsEvent::RewardTokenBorrowSpeedUpdated { .. } => "RewardTokenBorrowSpeedUpdated",
            RewardsEvent::RewardTokenSupplySpeedUpdated { .. } => "RewardTokenSupplySpeedUpdated",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RegistryEvent {
    PoolRegistered {
        comptroller: Address,
        name: String,
        creator: Address,
        block_posted: u64,
        timestamp_posted: u64,
    },
    PoolNameSet {
        comptroller: Address,
        new_name: String,
    },
    PoolMetadataUpdated {
        comptroller: Address,
        category: String,
        logo_url: String,
        description: String,
    },
    MarketAdded {
        comptroller: Address,
        vtoken: Address,
    },
}

impl RegistryEvent {
    pub fn name(&self) -> &'static str {
        match self {
            RegistryEvent::PoolRegistered { .. } => "PoolRegistered",
            RegistryEvent::PoolNameSet { .. } => "PoolNameSet",
            RegistryEvent::PoolMetadataUpdated { .. } => "PoolMetadataUpdated",
            RegistryEvent::MarketAdded { .. } => "MarketAdded",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum GovernanceEvent {
    ProposalCreated {
        id: U256,
        proposer: Address,
        targets: Vec<Address>,
        values: Vec<U256>,
        signatures: Vec<String>,
        calldatas: Vec<Vec<u8>>,
        start_block: u64,
        end_block: u64,
        description: String,
    },
    ProposalCanceled {
        id: U256,
    },
    ProposalQueued {
        id: U256,
        eta: U256,
    },
    ProposalExecuted {
        id: U256,
    },
    /// a host that watches the governor's own `state()` reports what it saw
    ProposalStateSynced {
        id: U256,
        state: ProposalState,
    },
    VoteCast {
        voter: Address,
        proposal_id: U256,
        support: VoteSupport,
        votes: U256,
        reason: Option<String>,
    },
    DelegateChanged {
        delegator: Address,
        from_delegate: Address,
        to_delegate: Address,
    },
    DelegateVotesChanged {
        delegate: Address,
        previous_balance: U256,
        new_balance: U256,
    },
}

impl GovernanceEvent {
    pub fn name(&self) -> &'static str {
        match self {
            GovernanceEvent::ProposalCreated { .. } => "ProposalCreated",
            GovernanceEvent::ProposalCanceled { .. } => "ProposalCanceled",
            GovernanceEvent::ProposalQueued { .. } => "ProposalQueued",
            GovernanceEvent::ProposalExecuted { .. } => "ProposalExecuted",
            GovernanceEvent::ProposalStateSynced { .. } => "ProposalStateSynced",
            GovernanceEvent::VoteCast { .. } => "VoteCast",
            GovernanceEvent::DelegateChanged { .. } => "DelegateChanged",
            GovernanceEvent::DelegateVotesChanged { .. } => "DelegateVotesChanged",
        }
    }
}
