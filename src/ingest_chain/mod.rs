// everything about the ordered log stream we get handed: where a log sits in the chain,
// what it says, which blocks we've already applied, and the sled-backed store those
// projections land in.
pub mod blocks;
pub mod db_types;
pub mod events;
pub mod talk_to_sled;

pub use blocks::{BlockNumber, Blocks};
pub use db_types::{EventContext, EventOrdinal};
