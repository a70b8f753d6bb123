//! Governor and voting token logs.
//!
//! Proposal state only moves when the governor says so; nothing here looks at block
//! numbers or clocks. Votes and tallies are the only thing tracked locally.
use crate::entities::governance::{Proposal, ProposalState, Vote, VoteSupport};
use crate::ids::{address_id, get_proposal_id, get_vote_id, Address, NULL_ADDRESS};
use crate::ingest_chain::events::GovernanceEvent;
use crate::operations::{get_or_create_delegate, Ctx};
use crate::solidmath::U256;
use anyhow::{anyhow, Result};
use tracing::{debug, warn};

pub fn handle(ctx: &mut Ctx, event: &GovernanceEvent) -> Result<()> {
    match event {
        GovernanceEvent::ProposalCreated {
            id,
            proposer,
            targets,
            values,
            signatures,
            calldatas,
            start_block,
            end_block,
            description,
        } => {
            let proposal = Proposal {
                id: get_proposal_id(id),
                proposer: address_id(proposer),
                targets: targets.iter().map(address_id).collect(),
                values: values.clone(),
                signatures: signatures.clone(),
                calldatas: calldatas
                    .iter()
                    .map(|data| format!("0x{}", hex::encode(data)))
                    .collect(),
                start_block: *start_block,
                end_block: *end_block,
                description: description.clone(),
                state: ProposalState::Pending,
                eta: None,
                for_votes: U256::zero(),
                against_votes: U256::zero(),
                abstain_votes: U256::zero(),
                created_block: ctx.block_number(),
                created_timestamp: ctx.timestamp(),
            };
            ctx.store.insert_new(&proposal)?;

            let mut delegate = get_or_create_delegate(ctx, proposer)?;
            delegate.proposals_created += 1;
            ctx.store.save(&delegate)
        }
        GovernanceEvent::ProposalCanceled { id } => {
            let mut proposal = require_proposal(ctx, id)?;
            advance(&mut proposal, ProposalState::Canceled)?;
            ctx.store.save(&proposal)
        }
        GovernanceEvent::ProposalQueued { id, eta } => {
            let mut proposal = require_proposal(ctx, id)?;
            // the governor never announces success, queueing implies it
            if proposal.state == ProposalState::Active {
                advance(&mut proposal, ProposalState::Succeeded)?;
            }
            advance(&mut proposal, ProposalState::Queued)?;
            proposal.eta = Some(*eta);
            ctx.store.save(&proposal)
        }
        GovernanceEvent::ProposalExecuted { id } => {
            let mut proposal = require_proposal(ctx, id)?;
            advance(&mut proposal, ProposalState::Executed)?;
            ctx.store.save(&proposal)
        }
        GovernanceEvent::ProposalStateSynced { id, state } => {
            let mut proposal = require_proposal(ctx, id)?;
            if proposal.state == *state {
                debug!(proposal = %proposal.id, %state, "proposal state unchanged");
                return Ok(());
            }
            advance(&mut proposal, *state)?;
            ctx.store.save(&proposal)
        }
        GovernanceEvent::VoteCast {
            voter,
            proposal_id,
            support,
            votes,
            reason,
        } => handle_vote_cast(ctx, voter, proposal_id, *support, *votes, reason.clone()),
        GovernanceEvent::DelegateChanged {
            from_delegate,
            to_delegate,
            ..
        } => {
            if from_delegate != &*NULL_ADDRESS {
                let mut from = get_or_create_delegate(ctx, from_delegate)?;
                from.delegate_count -= 1;
                ctx.store.save(&from)?;
            }
            let mut to = get_or_create_delegate(ctx, to_delegate)?;
            to.delegate_count += 1;
            ctx.store.save(&to)
        }
        GovernanceEvent::DelegateVotesChanged {
            delegate,
            new_balance,
            ..
        } => {
            let mut delegate = get_or_create_delegate(ctx, delegate)?;
            delegate.delegated_votes_mantissa = *new_balance;
            ctx.store.save(&delegate)
        }
    }
}

fn require_proposal(ctx: &Ctx, id: &U256) -> Result<Proposal> {
    ctx.store.require(&get_proposal_id(id))
}

fn advance(proposal: &mut Proposal, next: ProposalState) -> Result<()> {
    if !proposal.state.can_become(next) {
        warn!(proposal = %proposal.id, from = %proposal.state, to = %next, "illegal proposal transition");
        return Err(anyhow!(
            "proposal {} can't go from {} to {}",
            proposal.id,
            proposal.state,
            next
        ));
    }
    proposal.state = next;
    Ok(())
}

/// One vote per voter and proposal. The first vote on a pending proposal is the
/// proof that voting opened.
fn handle_vote_cast(
    ctx: &mut Ctx,
    voter: &Address,
    proposal_id: &U256,
    support: VoteSupport,
    votes: U256,
    reason: Option<String>,
) -> Result<()> {
    let mut proposal = require_proposal(ctx, proposal_id)?;
    let vote_id = get_vote_id(proposal_id, voter);
    if ctx.store.exists::<Vote>(&vote_id)? {
        return Err(anyhow!(
            "{} already voted on proposal {}",
            address_id(voter),
            proposal.id
        ));
    }

    if proposal.state == ProposalState::Pending {
        advance(&mut proposal, ProposalState::Active)?;
    }
    if proposal.state != ProposalState::Active {
        return Err(anyhow!(
            "vote on proposal {} while {}",
            proposal.id,
            proposal.state
        ));
    }
    match support {
        VoteSupport::For => proposal.for_votes = proposal.for_votes.saturating_add(votes),
        VoteSupport::Against => {
            proposal.against_votes = proposal.against_votes.saturating_add(votes)
        }
        VoteSupport::Abstain => {
            proposal.abstain_votes = proposal.abstain_votes.saturating_add(votes)
        }
    }

    let vote = Vote {
        id: vote_id,
        proposal: proposal.id.clone(),
        voter: address_id(voter),
        support,
        votes,
        reason,
        block_number: ctx.block_number(),
    };
    ctx.store.insert_new(&vote)?;
    ctx.store.save(&proposal)
}
