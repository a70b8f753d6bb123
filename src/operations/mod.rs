//! Shared building blocks for the event handlers: how each entity kind comes into
//! existence, and the updates more than one handler performs.
use crate::config::IndexerConfig;
use crate::contracts::ContractReader;
use crate::ids::get_transaction_id;
use crate::ingest_chain::EventContext;
use crate::store::{Staged, WriteBatch};

pub mod get_or_create;
pub mod update;

pub use get_or_create::*;
pub use update::*;

/// Everything a handler may touch while applying one event.
pub struct Ctx<'a> {
    pub store: Staged<'a>,
    pub chain: &'a dyn ContractReader,
    pub config: &'a IndexerConfig,
    pub event: &'a EventContext,
}

impl<'a> Ctx<'a> {
    pub fn new(
        store: Staged<'a>,
        chain: &'a dyn ContractReader,
        config: &'a IndexerConfig,
        event: &'a EventContext,
    ) -> Self {
        Ctx {
            store,
            chain,
            config,
            event,
        }
    }

    pub fn block_number(&self) -> u64 {
        self.event.block_number
    }

    pub fn timestamp(&self) -> u64 {
        self.event.block_timestamp
    }

    /// id of the history row this log produces
    pub fn record_id(&self) -> String {
        get_transaction_id(&self.event.transaction_hash, self.event.log_index)
    }

    pub fn into_batch(self) -> WriteBatch {
        self.store.into_batch()
    }
}
