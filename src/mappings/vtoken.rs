//! VToken logs. The emitting address is the market.
//!
//! Mint, redeem and seize all come with a `Transfer` in the same transaction, and the
//! transfer is what moves position balances. The handlers for the companion logs only
//! keep market counters and history.
use crate::contracts::calls;
use crate::entities::lending::{BorrowEvent, LiquidationEvent, MintEvent, RedeemEvent, RepayEvent, TransferEvent};
use crate::ids::{address_id, get_account_id, get_market_id, Address, NULL_ADDRESS};
use crate::ingest_chain::events::MarketEvent;
use crate::operations::{
    get_or_create_account, get_or_create_market, update_account_vtoken, update_market, Ctx,
};
use crate::solidmath::full_math::mul_mantissa;
use crate::solidmath::U256;
use anyhow::{Context, Result};
use tracing::debug;

pub fn handle(ctx: &mut Ctx, vtoken: &Address, event: &MarketEvent) -> Result<()> {
    match event {
        MarketEvent::Mint {
            minter,
            mint_amount,
            mint_tokens,
            account_balance,
        } => handle_mint(
            ctx,
            vtoken,
            minter,
            None,
            *mint_amount,
            *mint_tokens,
            *account_balance,
        ),
        MarketEvent::MintBehalf {
            payer,
            receiver,
            mint_amount,
            mint_tokens,
            account_balance,
        } => handle_mint(
            ctx,
            vtoken,
            receiver,
            Some(payer),
            *mint_amount,
            *mint_tokens,
            *account_balance,
        ),
        MarketEvent::Redeem {
            redeemer,
            redeem_amount,
            redeem_tokens,
            account_balance,
        } => handle_redeem(
            ctx,
            vtoken,
            redeemer,
            *redeem_amount,
            *redeem_tokens,
            *account_balance,
        ),
        MarketEvent::Borrow {
            borrower,
            borrow_amount,
            account_borrows,
            ..
        } => handle_borrow(ctx, vtoken, borrower, *borrow_amount, *account_borrows),
        MarketEvent::RepayBorrow {
            payer,
            borrower,
            repay_amount,
            account_borrows,
            ..
        } => handle_repay_borrow(ctx, vtoken, payer, borrower, *repay_amount, *account_borrows),
        MarketEvent::LiquidateBorrow {
            liquidator,
            borrower,
            repay_amount,
            vtoken_collateral,
            seize_tokens,
        } => handle_liquidate_borrow(
            ctx,
            vtoken,
            liquidator,
            borrower,
            *repay_amount,
            vtoken_collateral,
            *seize_tokens,
        ),
        MarketEvent::Transfer { from, to, amount } => {
            handle_transfer(ctx, vtoken, from, to, *amount)
        }
        MarketEvent::AccrueInterest { .. } => {
            update_market(ctx, vtoken)?;
            Ok(())
        }
        MarketEvent::NewReserveFactor {
            new_reserve_factor_mantissa,
            ..
        } => {
            let mut market = get_or_create_market(ctx, vtoken, None)?;
            market.reserve_factor_mantissa = *new_reserve_factor_mantissa;
            ctx.store.save(&market)
        }
        MarketEvent::NewMarketInterestRateModel {
            new_interest_rate_model,
            ..
        } => {
            let mut market = get_or_create_market(ctx, vtoken, None)?;
            market.interest_rate_model = address_id(new_interest_rate_model);
            ctx.store.save(&market)
        }
    }
}

/// Older vtokens don't put the account's balance in the log, ask the token instead.
fn balance_after(
    ctx: &Ctx,
    vtoken: &Address,
    account: &Address,
    reported: Option<U256>,
) -> Result<U256> {
    match reported {
        Some(balance) => Ok(balance),
        None => ctx.chain.balance_of(vtoken, account).with_context(|| {
            format!(
                "{} of {} on {}",
                calls::BALANCE_OF,
                address_id(account),
                address_id(vtoken)
            )
        }),
    }
}

/// A balance equal to what was just minted means there was nothing before: a new supplier.
fn handle_mint(
    ctx: &mut Ctx,
    vtoken: &Address,
    supplier: &Address,
    payer: Option<&Address>,
    mint_amount: U256,
    mint_tokens: U256,
    account_balance: Option<U256>,
) -> Result<()> {
    let mut market = get_or_create_market(ctx, vtoken, None)?;
    let balance = balance_after(ctx, vtoken, supplier, account_balance)?;

    let mint = MintEvent {
        id: ctx.record_id(),
        market: market.id.clone(),
        minter: get_account_id(supplier),
        payer: payer.map(get_account_id),
        amount_mantissa: mint_tokens,
        underlying_amount_mantissa: mint_amount,
        block_number: ctx.block_number(),
        block_time: ctx.timestamp(),
    };
    ctx.store.insert_new(&mint)?;

    if balance == mint_tokens {
        market.supplier_count += 1;
    }
    ctx.store.save(&market)
}

/// Nothing left after the redeem means the account stopped supplying.
fn handle_redeem(
    ctx: &mut Ctx,
    vtoken: &Address,
    redeemer: &Address,
    redeem_amount: U256,
    redeem_tokens: U256,
    account_balance: Option<U256>,
) -> Result<()> {
    let mut market = get_or_create_market(ctx, vtoken, None)?;
    let balance = balance_after(ctx, vtoken, redeemer, account_balance)?;

    let redeem = RedeemEvent {
        id: ctx.record_id(),
        market: market.id.clone(),
        redeemer: get_account_id(redeemer),
        amount_mantissa: redeem_tokens,
        underlying_amount_mantissa: redeem_amount,
        block_number: ctx.block_number(),
        block_time: ctx.timestamp(),
    };
    ctx.store.insert_new(&redeem)?;

    if balance.is_zero() {
        market.supplier_count -= 1;
    }
    ctx.store.save(&market)
}

/// `account_borrows` is the borrower's total after this borrow. When it equals the
/// amount just borrowed, the account owed nothing before. A dust position topped back
/// up to the threshold rejoins the adjusted count.
fn handle_borrow(
    ctx: &mut Ctx,
    vtoken: &Address,
    borrower: &Address,
    borrow_amount: U256,
    account_borrows: U256,
) -> Result<()> {
    let mut market = get_or_create_market(ctx, vtoken, None)?;

    let mut position = update_account_vtoken(ctx, vtoken, borrower)?;
    if account_borrows == borrow_amount {
        market.borrower_count += 1;
        market.borrower_count_adjusted += 1;
        position.adjusted_borrower = true;
    } else if !position.adjusted_borrower && account_borrows >= ctx.config.dust_threshold {
        market.borrower_count_adjusted += 1;
        position.adjusted_borrower = true;
    }
    position.account_borrow_balance_mantissa = account_borrows;
    position.account_borrow_index_mantissa = market.borrow_index_mantissa;
    position.total_underlying_borrowed_mantissa = position
        .total_underlying_borrowed_mantissa
        .saturating_add(borrow_amount);
    ctx.store.save(&position)?;

    let mut account = get_or_create_account(ctx, borrower)?;
    account.has_borrowed = true;
    ctx.store.save(&account)?;

    let borrow = BorrowEvent {
        id: ctx.record_id(),
        market: market.id.clone(),
        borrower: get_account_id(borrower),
        amount_mantissa: borrow_amount,
        account_borrows_mantissa: account_borrows,
        block_number: ctx.block_number(),
        block_time: ctx.timestamp(),
    };
    ctx.store.insert_new(&borrow)?;
    ctx.store.save(&market)
}

/// Paid off in full drops the borrower from both counts. A leftover below the dust
/// threshold drops it from the adjusted count only: the position still exists, it just
/// isn't a borrower anyone cares about. A position leaves the adjusted count once.
fn handle_repay_borrow(
    ctx: &mut Ctx,
    vtoken: &Address,
    payer: &Address,
    borrower: &Address,
    repay_amount: U256,
    account_borrows: U256,
) -> Result<()> {
    let mut market = get_or_create_market(ctx, vtoken, None)?;

    let mut position = update_account_vtoken(ctx, vtoken, borrower)?;
    let paid_off = account_borrows.is_zero();
    if paid_off {
        market.borrower_count -= 1;
    }
    if position.adjusted_borrower && (paid_off || account_borrows < ctx.config.dust_threshold) {
        market.borrower_count_adjusted -= 1;
        position.adjusted_borrower = false;
    }
    position.account_borrow_balance_mantissa = account_borrows;
    position.account_borrow_index_mantissa = market.borrow_index_mantissa;
    position.total_underlying_repaid_mantissa = position
        .total_underlying_repaid_mantissa
        .saturating_add(repay_amount);
    ctx.store.save(&position)?;

    let repay = RepayEvent {
        id: ctx.record_id(),
        market: market.id.clone(),
        borrower: get_account_id(borrower),
        payer: get_account_id(payer),
        amount_mantissa: repay_amount,
        account_borrows_mantissa: account_borrows,
        block_number: ctx.block_number(),
        block_time: ctx.timestamp(),
    };
    ctx.store.insert_new(&repay)?;
    ctx.store.save(&market)
}

/// Counts only. The repay and the seize transfer that come with a liquidation move
/// the balances.
fn handle_liquidate_borrow(
    ctx: &mut Ctx,
    vtoken: &Address,
    liquidator: &Address,
    borrower: &Address,
    repay_amount: U256,
    vtoken_collateral: &Address,
    seize_tokens: U256,
) -> Result<()> {
    let mut liquidator_account = get_or_create_account(ctx, liquidator)?;
    liquidator_account.count_liquidator += 1;
    ctx.store.save(&liquidator_account)?;

    let mut borrower_account = get_or_create_account(ctx, borrower)?;
    borrower_account.count_liquidated += 1;
    ctx.store.save(&borrower_account)?;

    let repay_market = get_or_create_market(ctx, vtoken, None)?;
    ctx.store.save(&repay_market)?;
    let collateral_market = get_or_create_market(ctx, vtoken_collateral, None)?;
    ctx.store.save(&collateral_market)?;

    let liquidation = LiquidationEvent {
        id: ctx.record_id(),
        market: repay_market.id,
        liquidator: get_account_id(liquidator),
        borrower: get_account_id(borrower),
        repay_amount_mantissa: repay_amount,
        vtoken_collateral: collateral_market.id,
        seize_amount_mantissa: seize_tokens,
        block_number: ctx.block_number(),
        block_time: ctx.timestamp(),
    };
    ctx.store.insert_new(&liquidation)
}

/// Moves vtoken balances between positions. Mints come from the zero address or the
/// market and have no sender position. Tokens sent to the market itself (redeems, or
/// someone sending vtokens to the contract by mistake) have no receiver position, so
/// the mistaken case goes unrecorded.
fn handle_transfer(
    ctx: &mut Ctx,
    vtoken: &Address,
    from: &Address,
    to: &Address,
    amount: U256,
) -> Result<()> {
    let mut market = get_or_create_market(ctx, vtoken, None)?;
    // mint, redeem and seize run behind an accrual this same block, plain transfers don't
    if market.accrual_block_number < ctx.block_number() {
        market = update_market(ctx, vtoken)?;
    }
    let amount_underlying = mul_mantissa(amount, market.exchange_rate_mantissa)?;

    if from != &*NULL_ADDRESS && from != vtoken {
        let mut sender = update_account_vtoken(ctx, vtoken, from)?;
        // the seed snapshot is read after this log, so it may already lack `amount`
        sender.account_vtoken_supply_balance_mantissa = sender
            .account_vtoken_supply_balance_mantissa
            .saturating_sub(amount);
        sender.total_underlying_redeemed_mantissa = sender
            .total_underlying_redeemed_mantissa
            .saturating_add(amount_underlying);
        ctx.store.save(&sender)?;
    }

    if to != vtoken {
        let mut receiver = update_account_vtoken(ctx, vtoken, to)?;
        receiver.account_vtoken_supply_balance_mantissa = receiver
            .account_vtoken_supply_balance_mantissa
            .saturating_add(amount);
        receiver.total_underlying_supplied_mantissa = receiver
            .total_underlying_supplied_mantissa
            .saturating_add(amount_underlying);
        ctx.store.save(&receiver)?;
    } else if from != &*NULL_ADDRESS {
        debug!(market = %market.id, from = %address_id(from), "transfer into the market, no receiver position");
    }

    let transfer = TransferEvent {
        id: ctx.record_id(),
        market: get_market_id(vtoken),
        from: address_id(from),
        to: address_id(to),
        amount_mantissa: amount,
        underlying_amount_mantissa: amount_underlying,
        block_number: ctx.block_number(),
        block_time: ctx.timestamp(),
    };
    ctx.store.insert_new(&transfer)
}
