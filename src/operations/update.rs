use crate::contracts::{best_effort, calls};
use crate::entities::lending::{
    AccountVToken, AccountVTokenTransaction, Action, Market, MarketAction, PoolAction,
};
use crate::ids::{
    address_id, get_account_vtoken_id, get_account_vtoken_transaction_id, get_market_action_id,
    get_market_id, get_pool_action_id, get_pool_id, parse_address, Address,
};
use crate::operations::get_or_create::{
    get_or_create_account, get_or_create_account_vtoken, get_or_create_market,
};
use crate::operations::Ctx;
use crate::solidmath::fixed_point::{mantissa_to_decimal, price_to_usd, truncate};
use anyhow::{Context, Result};
use tracing::debug;

/// Re-reads everything interest dependent on a market. Runs at most once per block:
/// a market already read at this block (or a later one) comes back untouched and unsaved.
pub fn update_market(ctx: &mut Ctx, vtoken: &Address) -> Result<Market> {
    let mut market = get_or_create_market(ctx, vtoken, None)?;
    let block_number = ctx.block_number();
    if market.accrual_block_number >= block_number {
        debug!(
            market = %market.id,
            accrual_block_number = market.accrual_block_number,
            block_number,
            "market already current"
        );
        return Ok(market);
    }

    let chain = ctx.chain;
    let id = market.id.clone();
    let must = |call: &str| format!("{} on {}", call, id);

    let pool = parse_address(&market.pool)?;
    let price = chain
        .underlying_price(&pool, vtoken)
        .with_context(|| must(calls::UNDERLYING_PRICE))?;
    market.underlying_price_usd = price_to_usd(price, market.underlying_decimals)?;

    market.exchange_rate_mantissa = chain
        .exchange_rate(vtoken)
        .with_context(|| must(calls::EXCHANGE_RATE))?;
    market.borrow_index_mantissa = chain
        .borrow_index(vtoken)
        .with_context(|| must(calls::BORROW_INDEX))?;
    market.reserves_mantissa = chain
        .reserves(vtoken)
        .with_context(|| must(calls::RESERVES))?;
    let cash = chain.cash(vtoken).with_context(|| must(calls::CASH))?;
    market.cash = truncate(
        &mantissa_to_decimal(cash, market.underlying_decimals)?,
        market.underlying_decimals,
    );

    // rates can revert for reasons outside the market, a stale zero beats a lost event
    market.borrow_rate_mantissa = best_effort(
        chain.borrow_rate_per_block(vtoken),
        vtoken,
        calls::BORROW_RATE,
    );
    market.supply_rate_mantissa = best_effort(
        chain.supply_rate_per_block(vtoken),
        vtoken,
        calls::SUPPLY_RATE,
    );

    market.treasury_total_borrows_mantissa = chain
        .total_borrows(vtoken)
        .with_context(|| must(calls::TOTAL_BORROWS))?;
    market.treasury_total_supply_mantissa = chain
        .total_supply(vtoken)
        .with_context(|| must(calls::TOTAL_SUPPLY))?;

    market.accrual_block_number = block_number;
    market.block_timestamp = ctx.timestamp();
    ctx.store.save(&market)?;
    Ok(market)
}

/// The part every position touching handler shares: the account exists, the position
/// exists (seeded on first sight), this log is on the position's transaction list and
/// the position is stamped with the block. The caller mutates and saves.
pub fn update_account_vtoken(
    ctx: &mut Ctx,
    vtoken: &Address,
    account: &Address,
) -> Result<AccountVToken> {
    let account_entity = get_or_create_account(ctx, account)?;
    ctx.store.save(&account_entity)?;

    let mut position = get_or_create_account_vtoken(ctx, vtoken, account, false)?;

    let transaction_id = get_account_vtoken_transaction_id(
        account,
        &ctx.event.transaction_hash,
        ctx.event.log_index,
    );
    if !ctx.store.exists::<AccountVTokenTransaction>(&transaction_id)? {
        let transaction = AccountVTokenTransaction {
            id: transaction_id,
            account_vtoken: get_account_vtoken_id(vtoken, account),
            transaction_hash: ctx.event.transaction_hash,
            block_number: ctx.block_number(),
            timestamp: ctx.timestamp(),
            log_index: ctx.event.log_index,
        };
        ctx.store.save(&transaction)?;
    }

    position.accrual_block_number = ctx.block_number();
    Ok(position)
}

/// `entered_market` of None leaves the flag as it was.
pub fn update_or_create_account_vtoken(
    ctx: &mut Ctx,
    vtoken: &Address,
    account: &Address,
    entered_market: Option<bool>,
) -> Result<AccountVToken> {
    let mut position = update_account_vtoken(ctx, vtoken, account)?;
    if let Some(entered) = entered_market {
        position.entered_market = entered;
    }
    ctx.store.save(&position)?;
    Ok(position)
}

pub fn update_or_create_market_action(
    ctx: &mut Ctx,
    vtoken: &Address,
    action: Action,
    pause_state: bool,
) -> Result<MarketAction> {
    let market_action = MarketAction {
        id: get_market_action_id(vtoken, action.name()),
        market: get_market_id(vtoken),
        action,
        pause_state,
    };
    ctx.store.save(&market_action)?;
    Ok(market_action)
}

pub fn update_or_create_pool_action(
    ctx: &mut Ctx,
    pool: &Address,
    action: &str,
    pause_state: bool,
) -> Result<PoolAction> {
    let pool_action = PoolAction {
        id: get_pool_action_id(pool, action),
        pool: get_pool_id(pool),
        action: action.to_string(),
        pause_state,
    };
    ctx.store.save(&pool_action)?;
    debug!(pool = %address_id(pool), action, pause_state, "pool action");
    Ok(pool_action)
}
