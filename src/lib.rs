// projects lending-protocol logs (pools, markets, rewards, governance) into an entity graph.
// the host feeds decoded logs in chain order, we load/mutate/save entities and read chain state where the log isn't enough.
#[macro_use]
extern crate lazy_static;

pub mod config;
pub mod contracts;
pub mod entities;
pub mod ids;
pub mod indexer;
pub mod ingest_chain;
pub mod mappings;
pub mod operations;
pub mod solidmath;
pub mod store;
pub mod unitest;

pub use config::IndexerConfig;
pub use contracts::ContractReader;
pub use indexer::{Indexer, StreamReport};
pub use ingest_chain::events::{EventKind, LogEvent};
pub use store::{EntityStore, MemoryStore};
