use crate::contracts::calls;
use crate::entities::governance::Delegate;
use crate::entities::lending::{
    Account, AccountVToken, Market, Pool, RewardSpeed, RewardsDistributor,
};
use crate::ids::{
    address_id, get_account_id, get_account_vtoken_id, get_delegate_id, get_market_id,
    get_pool_id, get_reward_speed_id, get_rewards_distributor_id, Address,
};
use crate::operations::Ctx;
use crate::solidmath::U256;
use anyhow::{Context, Result};
use bigdecimal::BigDecimal;
use tracing::info;

// None of these save what they build, the caller saves after mutating. The rewards
// distributor is the exception: its snapshot is a bundle of entities written at once.

pub fn get_or_create_account(ctx: &Ctx, account: &Address) -> Result<Account> {
    let id = get_account_id(account);
    ctx.store
        .get_or_create(&id, || Ok(Account::new(id.clone())))
}

pub fn get_or_create_pool(ctx: &Ctx, comptroller: &Address) -> Result<Pool> {
    let id = get_pool_id(comptroller);
    ctx.store.get_or_create(&id, || {
        Ok(Pool {
            id: id.clone(),
            ..Default::default()
        })
    })
}

pub fn get_or_create_delegate(ctx: &Ctx, delegate: &Address) -> Result<Delegate> {
    let id = get_delegate_id(delegate);
    ctx.store
        .get_or_create(&id, || Ok(Delegate::new(id.clone())))
}

/// Loads a market, or builds it from the vtoken's own state. Without a `pool` the
/// vtoken is asked for its comptroller. Every read here must succeed.
pub fn get_or_create_market(
    ctx: &Ctx,
    vtoken: &Address,
    pool: Option<&Address>,
) -> Result<Market> {
    let id = get_market_id(vtoken);
    ctx.store.get_or_create(&id, || create_market(ctx, vtoken, pool))
}

/// For logs emitted by the pool itself. The pool is saved along the way so the market
/// never points at a pool we don't have.
pub fn get_or_create_pool_market(
    ctx: &mut Ctx,
    pool: &Address,
    vtoken: &Address,
) -> Result<Market> {
    let pool_entity = get_or_create_pool(ctx, pool)?;
    ctx.store.save(&pool_entity)?;
    get_or_create_market(ctx, vtoken, Some(pool))
}

/// for events that only make sense on a market we already know about
pub fn require_market(ctx: &Ctx, vtoken: &Address) -> Result<Market> {
    ctx.store.require(&get_market_id(vtoken))
}

fn create_market(ctx: &Ctx, vtoken: &Address, pool: Option<&Address>) -> Result<Market> {
    let chain = ctx.chain;
    let market = address_id(vtoken);
    let pool = match pool {
        Some(pool) => *pool,
        None => chain
            .governing_pool_of(vtoken)
            .with_context(|| format!("{} on {}", calls::GOVERNING_POOL_OF, market))?,
    };
    let vtoken_metadata = chain
        .token_metadata(vtoken)
        .with_context(|| format!("{} on {}", calls::TOKEN_METADATA, market))?;
    let underlying = chain
        .underlying(vtoken)
        .with_context(|| format!("{} on {}", calls::UNDERLYING, market))?;
    let underlying_metadata = chain.token_metadata(&underlying).with_context(|| {
        format!(
            "{} on underlying {} of {}",
            calls::TOKEN_METADATA,
            address_id(&underlying),
            market
        )
    })?;
    let interest_rate_model = chain
        .interest_rate_model(vtoken)
        .with_context(|| format!("{} on {}", calls::INTEREST_RATE_MODEL, market))?;
    let reserve_factor = chain
        .reserve_factor(vtoken)
        .with_context(|| format!("{} on {}", calls::RESERVE_FACTOR, market))?;

    Ok(Market {
        id: market,
        pool: get_pool_id(&pool),
        name: vtoken_metadata.name,
        symbol: vtoken_metadata.symbol,
        vtoken_decimals: ctx.config.vtoken_decimals,
        underlying_address: address_id(&underlying),
        underlying_name: underlying_metadata.name,
        underlying_symbol: underlying_metadata.symbol,
        underlying_decimals: underlying_metadata.decimals,
        underlying_price_usd: BigDecimal::from(0),
        interest_rate_model: address_id(&interest_rate_model),
        reserve_factor_mantissa: reserve_factor,
        block_timestamp: ctx.timestamp(),
        cash: BigDecimal::from(0),
        ..Default::default()
    })
}

/// The first time a (market, account) pair shows up its balances come from the
/// vtoken's account snapshot, a zero would be wrong for any account older than us.
/// An outstanding borrow in the snapshot is taken to be in the adjusted count already.
pub fn get_or_create_account_vtoken(
    ctx: &Ctx,
    vtoken: &Address,
    account: &Address,
    entered_market: bool,
) -> Result<AccountVToken> {
    let id = get_account_vtoken_id(vtoken, account);
    ctx.store.get_or_create(&id, || {
        let snapshot = ctx.chain.account_snapshot(vtoken, account).with_context(|| {
            format!(
                "{} of {} on {}",
                calls::ACCOUNT_SNAPSHOT,
                address_id(account),
                address_id(vtoken)
            )
        })?;
        Ok(AccountVToken {
            id: id.clone(),
            market: get_market_id(vtoken),
            account: get_account_id(account),
            entered_market,
            account_vtoken_supply_balance_mantissa: snapshot.supplied,
            account_borrow_balance_mantissa: snapshot.borrowed,
            adjusted_borrower: !snapshot.borrowed.is_zero(),
            ..Default::default()
        })
    })
}

pub fn get_or_create_reward_speed(
    ctx: &Ctx,
    distributor: &Address,
    vtoken: &Address,
) -> Result<RewardSpeed> {
    let id = get_reward_speed_id(distributor, vtoken);
    ctx.store.get_or_create(&id, || {
        Ok(RewardSpeed {
            id: id.clone(),
            rewards_distributor: get_rewards_distributor_id(distributor),
            market: get_market_id(vtoken),
            borrow_speed_per_block_mantissa: U256::zero(),
            supply_speed_per_block_mantissa: U256::zero(),
        })
    })
}

/// A distributor seen for the first time gets its reward token and the current speeds
/// of every market in the pool read and saved. The distributor may have been paying
/// out long before we saw it, so this is a snapshot, not a delta.
pub fn get_or_create_rewards_distributor(
    ctx: &mut Ctx,
    distributor: &Address,
    pool: &Address,
) -> Result<RewardsDistributor> {
    let id = get_rewards_distributor_id(distributor);
    if let Some(existing) = ctx.store.load::<RewardsDistributor>(&id)? {
        return Ok(existing);
    }

    let chain = ctx.chain;
    let reward = chain
        .reward_token(distributor)
        .with_context(|| format!("{} on {}", calls::REWARD_TOKEN, id))?;
    let markets = chain
        .all_markets(pool)
        .with_context(|| format!("{} on {}", calls::ALL_MARKETS, address_id(pool)))?;

    let pool_entity = get_or_create_pool(ctx, pool)?;
    ctx.store.save(&pool_entity)?;

    let rewards_distributor = RewardsDistributor {
        id: id.clone(),
        pool: get_pool_id(pool),
        reward: address_id(&reward),
    };
    ctx.store.save(&rewards_distributor)?;

    for vtoken in markets.iter() {
        let speeds = chain.reward_speeds(distributor, vtoken).with_context(|| {
            format!("{} on {} for {}", calls::REWARD_SPEEDS, id, address_id(vtoken))
        })?;
        let mut reward_speed = get_or_create_reward_speed(ctx, distributor, vtoken)?;
        reward_speed.borrow_speed_per_block_mantissa = speeds.borrow_speed;
        reward_speed.supply_speed_per_block_mantissa = speeds.supply_speed;
        ctx.store.save(&reward_speed)?;
    }

    info!(
        distributor = %id,
        pool = %address_id(pool),
        markets = markets.len(),
        "seeded rewards distributor"
    );
    Ok(rewards_distributor)
}
