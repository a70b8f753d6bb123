use crate::entities::impl_entity;
use crate::solidmath::U256;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pending -> Active -> {Canceled | Defeated | Succeeded -> Queued -> Executed | Expired}.
/// Canceled is reachable from every state that isn't final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProposalState {
    Pending,
    Active,
    Canceled,
    Defeated,
    Succeeded,
    Queued,
    Executed,
    Expired,
}

impl ProposalState {
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            ProposalState::Canceled
                | ProposalState::Defeated
                | ProposalState::Executed
                | ProposalState::Expired
        )
    }

    pub fn can_become(&self, next: ProposalState) -> bool {
        use ProposalState::*;
        if self.is_final() {
            return false;
        }
        match (self, next) {
            (_, Canceled) => true,
            (Pending, Active) => true,
            (Active, Defeated) | (Active, Succeeded) => true,
            (Succeeded, Queued) => true,
            (Queued, Executed) | (Queued, Expired) => true,
            _ => false,
        }
    }
}

impl fmt::Display for ProposalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoteSupport {
    Against,
    For,
    Abstain,
}

impl VoteSupport {
    /// alpha governors only know yes/no
    pub fn from_bool(support: bool) -> Self {
        if support {
            VoteSupport::For
        } else {
            VoteSupport::Against
        }
    }
}

impl TryFrom<u8> for VoteSupport {
    type Error = anyhow::Error;

    fn try_from(code: u8) -> Result<Self> {
        match code {
            0 => Ok(VoteSupport::Against),
            1 => Ok(VoteSupport::For),
            2 => Ok(VoteSupport::Abstain),
            _ => Err(anyhow!("unknown vote support {}", code)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: String,
    pub proposer: String,
    pub targets: Vec<String>,
    pub values: Vec<U256>,
    pub signatures: Vec<String>,
    /// hex, 0x prefixed
    pub calldatas: Vec<String>,
    pub start_block: u64,
    pub end_block: u64,
    pub description: String,
    pub state: ProposalState,
    pub eta: Option<U256>,
    pub for_votes: U256,
    pub against_votes: U256,
    pub abstain_votes: U256,
    pub created_block: u64,
    pub created_timestamp: u64,
}

impl_entity!(Proposal, "Proposal");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    pub id: String,
    pub proposal: String,
    pub voter: String,
    pub support: VoteSupport,
    pub votes: U256,
    pub reason: Option<String>,
    pub block_number: u64,
}

impl_entity!(Vote, "Vote");

/// Voting power held by an address through delegation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delegate {
    pub id: String,
    pub delegated_votes_mantissa: U256,
    /// accounts currently delegating here; delegations older than the indexer can push it below zero
    pub delegate_count: i64,
    pub proposals_created: u64,
}

impl Delegate {
    pub fn new(id: String) -> Self {
        Delegate {
            id,
            delegated_votes_mantissa: U256::zero(),
            delegate_count: 0,
            proposals_created: 0,
        }
    }
}

impl_entity!(Delegate, "Delegate");
