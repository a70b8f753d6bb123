use crate::ingest_chain::blocks::BlockNumber;
use primitive_types::H256;
use serde::{Deserialize, Serialize};

/// Where a log sits in canonical chain order: block, then transaction, then log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct EventOrdinal {
    pub block_number: BlockNumber,
    pub transaction_index: u64,
    pub log_index: u64,
}

/// Block and transaction context every decoded log arrives with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventContext {
    pub block_number: BlockNumber,
    pub block_timestamp: u64,
    pub transaction_hash: H256,
    pub transaction_index: u64,
    // index of the log within the block
    pub log_index: u64,
    // index of the log within its transaction
    pub transaction_log_index: u64,
}

impl EventContext {
    pub fn ordinal(&self) -> EventOrdinal {
        EventOrdinal {
            block_number: self.block_number,
            transaction_index: self.transaction_index,
            log_index: self.log_index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ordinal(block_number: u64, transaction_index: u64, log_index: u64) -> EventOrdinal {
        EventOrdinal {
            block_number,
            transaction_index,
            log_index,
        }
    }

    #[test]
    fn ordinals_sort_block_then_tx_then_log() {
        let mut seen = vec![
            ordinal(2, 0, 0),
            ordinal(1, 3, 9),
            ordinal(1, 3, 2),
            ordinal(1, 0, 50),
        ];
        seen.sort();
        assert_eq!(
            seen,
            vec![
                ordinal(1, 0, 50),
                ordinal(1, 3, 2),
                ordinal(1, 3, 9),
                ordinal(2, 0, 0)
            ]
        );
    }
}
