//! Pool registry logs: pools announce themselves and their markets here.
use crate::ids::address_id;
use crate::ingest_chain::events::RegistryEvent;
use crate::operations::{get_or_create_pool, get_or_create_pool_market, Ctx};
use anyhow::Result;

pub fn handle(ctx: &mut Ctx, event: &RegistryEvent) -> Result<()> {
    match event {
        RegistryEvent::PoolRegistered {
            comptroller,
            name,
            creator,
            block_posted,
            timestamp_posted,
        } => {
            let mut pool = get_or_create_pool(ctx, comptroller)?;
            pool.name = name.clone();
            pool.creator = Some(address_id(creator));
            pool.block_posted = *block_posted;
            pool.timestamp_posted = *timestamp_posted;
            ctx.store.save(&pool)
        }
        RegistryEvent::PoolNameSet {
            comptroller,
            new_name,
        } => {
            let mut pool = get_or_create_pool(ctx, comptroller)?;
            pool.name = new_name.clone();
            ctx.store.save(&pool)
        }
        RegistryEvent::PoolMetadataUpdated {
            comptroller,
            category,
            logo_url,
            description,
        } => {
            let mut pool = get_or_create_pool(ctx, comptroller)?;
            pool.category = category.clone();
            pool.logo_url = logo_url.clone();
            pool.description = description.clone();
            ctx.store.save(&pool)
        }
        RegistryEvent::MarketAdded {
            comptroller,
            vtoken,
        } => {
            let market = get_or_create_pool_market(ctx, comptroller, vtoken)?;
            ctx.store.save(&market)
        }
    }
}
