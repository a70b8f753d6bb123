//! One handler per log kind. Handlers resolve the entities a log touches through the
//! context's staged store, creating them on first reference, and save every entity
//! they change. A handler returning `Err` leaves nothing behind.
use crate::ingest_chain::events::{EventKind, LogEvent};
use crate::operations::Ctx;
use anyhow::Result;

pub mod governance;
pub mod pool;
pub mod pool_registry;
pub mod rewards;
pub mod vtoken;

pub fn dispatch(ctx: &mut Ctx, event: &LogEvent) -> Result<()> {
    match &event.kind {
        EventKind::Pool(e) => pool::handle(ctx, &event.address, e),
        EventKind::Market(e) => vtoken::handle(ctx, &event.address, e),
        EventKind::Rewards(e) => rewards::handle(ctx, &event.address, e),
        EventKind::Registry(e) => pool_registry::handle(ctx, e),
        EventKind::Governance(e) => governance::handle(ctx, e),
    }
}
