//! Rewards distributor logs. The emitting address is the distributor.
use crate::ids::Address;
use crate::ingest_chain::events::RewardsEvent;
use crate::operations::{get_or_create_reward_speed, Ctx};
use anyhow::Result;

pub fn handle(ctx: &mut Ctx, distributor: &Address, event: &RewardsEvent) -> Result<()> {
    match event {
        RewardsEvent::RewardTokenBorrowSpeedUpdated { vtoken, new_speed } => {
            let mut speed = get_or_create_reward_speed(ctx, distributor, vtoken)?;
            speed.borrow_speed_per_block_mantissa = *new_speed;
            ctx.store.save(&speed)
        }
        RewardsEvent::RewardTokenSupplySpeedUpdated { vtoken, new_speed } => {
            let mut speed = get_or_create_reward_speed(ctx, distributor, vtoken)?;
            speed.supply_speed_per_block_mantissa = *new_speed;
            ctx.store.save(&speed)
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::IndexerConfig;
    use crate::entities::lending::RewardSpeed;
    use crate::ids::get_reward_speed_id;
    use crate::indexer::Indexer;
    use crate::ingest_chain::events::RewardsEvent;
    use crate::solidmath::U256;
    use crate::store::{EntityStore, MemoryStore};
    use crate::unitest::{address, EventFactory, MockChain};

    #[test]
    fn speed_updates_touch_one_side() {
        let mut indexer =
            Indexer::new(MemoryStore::new(), MockChain::new(), IndexerConfig::default()).unwrap();
        let mut events = EventFactory::new(100);
        let (distributor, vtoken) = (address(0xd1), address(0x10));

        indexer
            .process(&events.rewards(
                distributor,
                RewardsEvent::RewardTokenBorrowSpeedUpdated {
                    vtoken,
                    new_speed: U256::from(5),
                },
            ))
            .unwrap();
        let speed: RewardSpeed = indexer
            .store()
            .load(&get_reward_speed_id(&distributor, &vtoken))
            .unwrap()
            .unwrap();
        assert_eq!(speed.borrow_speed_per_block_mantissa, U256::from(5));
        assert_eq!(speed.supply_speed_per_block_mantissa, U256::zero());

        indexer
            .process(&events.rewards(
                distributor,
                RewardsEvent::RewardTokenSupplySpeedUpdated {
                    vtoken,
                    new_speed: U256::from(8),
                },
            ))
            .unwrap();
        let speed: RewardSpeed = indexer
            .store()
            .load(&get_reward_speed_id(&distributor, &vtoken))
            .unwrap()
            .unwrap();
        assert_eq!(speed.borrow_speed_per_block_mantissa, U256::from(5));
        assert_eq!(speed.supply_speed_per_block_mantissa, U256::from(8));
    }
}
