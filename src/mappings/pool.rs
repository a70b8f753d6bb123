//! Comptroller logs. The emitting address is the pool.
use crate::entities::lending::{Action, Pool};
use crate::ids::{address_id, Address};
use crate::ingest_chain::events::PoolEvent;
use crate::operations::{
    get_or_create_pool, get_or_create_pool_market, get_or_create_rewards_distributor,
    require_market,
    update_or_create_account_vtoken, update_or_create_market_action,
    update_or_create_pool_action, Ctx,
};
use crate::solidmath::U256;
use anyhow::Result;

pub fn handle(ctx: &mut Ctx, pool: &Address, event: &PoolEvent) -> Result<()> {
    match event {
        PoolEvent::MarketSupported { vtoken } => handle_market_supported(ctx, pool, vtoken),
        PoolEvent::MarketUnlisted { vtoken } => handle_market_unlisted(ctx, vtoken),
        PoolEvent::MarketEntered { vtoken, account } => {
            update_or_create_account_vtoken(ctx, vtoken, account, Some(true))?;
            Ok(())
        }
        PoolEvent::MarketExited { vtoken, account } => {
            update_or_create_account_vtoken(ctx, vtoken, account, Some(false))?;
            Ok(())
        }
        PoolEvent::NewCloseFactor {
            new_close_factor_mantissa,
        } => update_pool(ctx, pool, |p| {
            p.close_factor_mantissa = *new_close_factor_mantissa
        }),
        PoolEvent::NewCollateralFactor {
            vtoken,
            new_collateral_factor_mantissa,
        } => {
            let mut market = get_or_create_pool_market(ctx, pool, vtoken)?;
            market.collateral_factor_mantissa = *new_collateral_factor_mantissa;
            ctx.store.save(&market)
        }
        PoolEvent::NewLiquidationThreshold {
            vtoken,
            new_liquidation_threshold_mantissa,
        } => {
            let mut market = get_or_create_pool_market(ctx, pool, vtoken)?;
            market.liquidation_threshold_mantissa = *new_liquidation_threshold_mantissa;
            ctx.store.save(&market)
        }
        PoolEvent::NewLiquidationIncentive {
            new_liquidation_incentive_mantissa,
        } => update_pool(ctx, pool, |p| {
            p.liquidation_incentive_mantissa = *new_liquidation_incentive_mantissa
        }),
        PoolEvent::NewPriceOracle { new_price_oracle } => update_pool(ctx, pool, |p| {
            p.price_oracle = Some(address_id(new_price_oracle))
        }),
        PoolEvent::NewPauseGuardian { new_pause_guardian } => update_pool(ctx, pool, |p| {
            p.pause_guardian = Some(address_id(new_pause_guardian))
        }),
        PoolEvent::ActionPausedMarket {
            vtoken,
            action,
            pause_state,
        } => {
            let action = Action::try_from(*action)?;
            update_or_create_market_action(ctx, vtoken, action, *pause_state)?;
            Ok(())
        }
        PoolEvent::ActionPausedPool {
            action,
            pause_state,
        } => {
            update_or_create_pool_action(ctx, pool, action, *pause_state)?;
            Ok(())
        }
        PoolEvent::NewBorrowCap {
            vtoken,
            new_borrow_cap,
        } => {
            let mut market = require_market(ctx, vtoken)?;
            market.borrow_cap_mantissa = *new_borrow_cap;
            ctx.store.save(&market)
        }
        PoolEvent::NewSupplyCap {
            vtoken,
            new_supply_cap,
        } => {
            let mut market = require_market(ctx, vtoken)?;
            market.supply_cap_mantissa = *new_supply_cap;
            ctx.store.save(&market)
        }
        PoolEvent::NewMinLiquidatableCollateral {
            new_min_liquidatable_collateral,
        } => update_pool(ctx, pool, |p| {
            p.min_liquidatable_collateral_mantissa = *new_min_liquidatable_collateral
        }),
        PoolEvent::NewRewardsDistributor {
            rewards_distributor,
        } => {
            get_or_create_rewards_distributor(ctx, rewards_distributor, pool)?;
            Ok(())
        }
    }
}

/// Listing makes sure the pool exists and starts the market with no collateral
/// value; factors and thresholds come in their own logs.
fn handle_market_supported(ctx: &mut Ctx, pool: &Address, vtoken: &Address) -> Result<()> {
    let mut market = get_or_create_pool_market(ctx, pool, vtoken)?;
    market.is_listed = true;
    market.collateral_factor_mantissa = U256::zero();
    market.liquidation_threshold_mantissa = U256::zero();
    ctx.store.save(&market)
}

fn handle_market_unlisted(ctx: &mut Ctx, vtoken: &Address) -> Result<()> {
    let mut market = require_market(ctx, vtoken)?;
    market.is_listed = false;
    ctx.store.save(&market)
}

fn update_pool<F: FnOnce(&mut Pool)>(ctx: &mut Ctx, pool: &Address, set: F) -> Result<()> {
    let mut pool = get_or_create_pool(ctx, pool)?;
    set(&mut pool);
    ctx.store.save(&pool)
}

#[cfg(test)]
mod tests {
    use crate::config::IndexerConfig;
    use crate::contracts::{calls, RewardSpeeds};
    use crate::entities::lending::{Market, MarketAction, Pool, PoolAction, RewardSpeed};
    use crate::ids::{
        address_id, get_market_action_id, get_pool_action_id, get_reward_speed_id,
    };
    use crate::indexer::Indexer;
    use crate::ingest_chain::events::PoolEvent;
    use crate::solidmath::U256;
    use crate::store::{Entity, EntityStore, MemoryStore};
    use crate::unitest::{address, EventFactory, MockChain};

    const POOL: u64 = 0x01;
    const VTOKEN: u64 = 0x10;

    fn indexer() -> Indexer<MemoryStore, MockChain> {
        let mut chain = MockChain::new();
        chain.with_market(address(VTOKEN), address(POOL));
        Indexer::new(MemoryStore::new(), chain, IndexerConfig::default()).unwrap()
    }

    #[test]
    fn listing_creates_pool_and_market() {
        let mut indexer = indexer();
        let mut events = EventFactory::new(100);
        let vtoken = address(VTOKEN);
        indexer
            .process(&events.pool(address(POOL), PoolEvent::MarketSupported { vtoken }))
            .unwrap();

        let market: Market = indexer.store().load(&address_id(&vtoken)).unwrap().unwrap();
        assert!(market.is_listed);
        assert_eq!(market.collateral_factor_mantissa, U256::zero());
        assert_eq!(market.pool, address_id(&address(POOL)));
        assert!(indexer
            .store()
            .load::<Pool>(&address_id(&address(POOL)))
            .unwrap()
            .is_some());
        // listed by the pool itself, so no need to ask the vtoken
        assert_eq!(indexer.chain().calls(calls::GOVERNING_POOL_OF), 0);
    }

    #[test]
    fn market_parameters_bring_their_pool_along() {
        let mut indexer = indexer();
        let mut events = EventFactory::new(100);
        let (pool, vtoken) = (address(POOL), address(VTOKEN));
        indexer
            .process(&events.pool(
                pool,
                PoolEvent::NewCollateralFactor {
                    vtoken,
                    new_collateral_factor_mantissa: U256::from(7),
                },
            ))
            .unwrap();

        let market: Market = indexer.store().load(&address_id(&vtoken)).unwrap().unwrap();
        assert_eq!(market.collateral_factor_mantissa, U256::from(7));
        let stored: Option<Pool> = indexer.store().load(&market.pool).unwrap();
        assert!(stored.is_some());
        assert_eq!(indexer.store().count(Pool::KIND), 1);

        indexer
            .process(&events.pool(
                pool,
                PoolEvent::NewLiquidationThreshold {
                    vtoken,
                    new_liquidation_threshold_mantissa: U256::from(8),
                },
            ))
            .unwrap();
        assert_eq!(indexer.store().count(Pool::KIND), 1);
    }

    #[test]
    fn pool_parameters_are_plain_assignments() {
        let mut indexer = indexer();
        let mut events = EventFactory::new(100);
        let pool = address(POOL);
        for event in [
            PoolEvent::NewCloseFactor {
                new_close_factor_mantissa: U256::from(5),
            },
            PoolEvent::NewLiquidationIncentive {
                new_liquidation_incentive_mantissa: U256::from(11),
            },
            PoolEvent::NewMinLiquidatableCollateral {
                new_min_liquidatable_collateral: U256::from(100),
            },
            PoolEvent::NewPriceOracle {
                new_price_oracle: address(0x0c),
            },
            PoolEvent::NewPauseGuardian {
                new_pause_guardian: address(0x9a),
            },
        ] {
            indexer.process(&events.pool(pool, event)).unwrap();
        }

        let stored: Pool = indexer.store().load(&address_id(&pool)).unwrap().unwrap();
        assert_eq!(stored.close_factor_mantissa, U256::from(5));
        assert_eq!(stored.liquidation_incentive_mantissa, U256::from(11));
        assert_eq!(stored.min_liquidatable_collateral_mantissa, U256::from(100));
        assert_eq!(stored.price_oracle, Some(address_id(&address(0x0c))));
        assert_eq!(stored.pause_guardian, Some(address_id(&address(0x9a))));
    }

    #[test]
    fn caps_and_unlisting_need_a_known_market() {
        let mut indexer = indexer();
        let mut events = EventFactory::new(100);
        let (pool, vtoken) = (address(POOL), address(VTOKEN));

        let cap = PoolEvent::NewBorrowCap {
            vtoken,
            new_borrow_cap: U256::from(1_000),
        };
        assert!(indexer.process(&events.pool(pool, cap.clone())).is_err());
        assert!(indexer
            .process(&events.pool(pool, PoolEvent::MarketUnlisted { vtoken }))
            .is_err());
        assert_eq!(indexer.store().count(Market::KIND), 0);

        indexer
            .process(&events.pool(pool, PoolEvent::MarketSupported { vtoken }))
            .unwrap();
        indexer.process(&events.pool(pool, cap)).unwrap();
        indexer
            .process(&events.pool(
                pool,
                PoolEvent::NewSupplyCap {
                    vtoken,
                    new_supply_cap: U256::from(2_000),
                },
            ))
            .unwrap();
        indexer
            .process(&events.pool(pool, PoolEvent::MarketUnlisted { vtoken }))
            .unwrap();

        let market: Market = indexer.store().load(&address_id(&vtoken)).unwrap().unwrap();
        assert_eq!(market.borrow_cap_mantissa, U256::from(1_000));
        assert_eq!(market.supply_cap_mantissa, U256::from(2_000));
        assert!(!market.is_listed);
    }

    #[test]
    fn pause_actions() {
        let mut indexer = indexer();
        let mut events = EventFactory::new(100);
        let (pool, vtoken) = (address(POOL), address(VTOKEN));

        indexer
            .process(&events.pool(
                pool,
                PoolEvent::ActionPausedMarket {
                    vtoken,
                    action: 2,
                    pause_state: true,
                },
            ))
            .unwrap();
        indexer
            .process(&events.pool(
                pool,
                PoolEvent::ActionPausedPool {
                    action: "Transfer".to_string(),
                    pause_state: true,
                },
            ))
            .unwrap();
        assert!(indexer
            .process(&events.pool(
                pool,
                PoolEvent::ActionPausedMarket {
                    vtoken,
                    action: 42,
                    pause_state: true,
                },
            ))
            .is_err());

        let market_action: MarketAction = indexer
            .store()
            .load(&get_market_action_id(&vtoken, "BORROW"))
            .unwrap()
            .unwrap();
        assert!(market_action.pause_state);
        let pool_action: PoolAction = indexer
            .store()
            .load(&get_pool_action_id(&pool, "Transfer"))
            .unwrap()
            .unwrap();
        assert!(pool_action.pause_state);
    }

    #[test]
    fn new_rewards_distributor_seeds_speeds() {
        let (pool, vtoken, distributor) = (address(POOL), address(VTOKEN), address(0xd1));
        let mut chain = MockChain::new();
        chain.with_market(vtoken, pool);
        chain.set_reward_token(distributor, address(0xee));
        chain.set_reward_speeds(
            distributor,
            vtoken,
            RewardSpeeds {
                borrow_speed: U256::from(3),
                supply_speed: U256::from(4),
            },
        );
        let mut indexer = Indexer::new(MemoryStore::new(), chain, IndexerConfig::default()).unwrap();
        let mut events = EventFactory::new(100);

        indexer
            .process(&events.pool(
                pool,
                PoolEvent::NewRewardsDistributor {
                    rewards_distributor: distributor,
                },
            ))
            .unwrap();
        let speed: RewardSpeed = indexer
            .store()
            .load(&get_reward_speed_id(&distributor, &vtoken))
            .unwrap()
            .unwrap();
        assert_eq!(speed.borrow_speed_per_block_mantissa, U256::from(3));
        assert_eq!(speed.supply_speed_per_block_mantissa, U256::from(4));
        assert!(indexer
            .store()
            .load::<Pool>(&address_id(&pool))
            .unwrap()
            .is_some());
    }

    #[test]
    fn failed_distributor_snapshot_leaves_nothing_behind() {
        let (pool, vtoken, distributor) = (address(POOL), address(VTOKEN), address(0xd1));
        let mut chain = MockChain::new();
        chain.with_market(vtoken, pool);
        chain.set_reward_token(distributor, address(0xee));
        chain.fail(calls::REWARD_SPEEDS);
        let mut indexer = Indexer::new(MemoryStore::new(), chain, IndexerConfig::default()).unwrap();
        let mut events = EventFactory::new(100);

        let event = events.pool(
            pool,
            PoolEvent::NewRewardsDistributor {
                rewards_distributor: distributor,
            },
        );
        assert!(indexer.process(&event).is_err());
        assert_eq!(indexer.store().count("RewardsDistributor"), 0);
        assert!(!indexer.indexed_blocks().contains(100));
    }
}
