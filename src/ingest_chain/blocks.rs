use anyhow::{anyhow, Result};
use core::ops::Bound;
use ranges::GenericRange;
use ranges::Ranges;
use serde::{Deserialize, Serialize};
use std::ops::RangeBounds;

pub type BlockNumber = u64;

/// Set of blocks the indexer has applied at least one event from.
#[derive(PartialEq, Clone, Debug)]
pub struct Blocks {
    ranges: Ranges<BlockNumber>,
}

impl Blocks {
    pub fn empty() -> Self {
        Blocks {
            ranges: Ranges::new(),
        }
    }

    pub fn insert_block(&mut self, block: BlockNumber) {
        self.ranges.insert(GenericRange::from(block..=block));
    }

    pub fn contains(&self, block: BlockNumber) -> bool {
        self.ranges
            .as_ref()
            .iter()
            .any(|range| range.contains(&block))
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.as_ref().is_empty()
    }
}

impl Default for Blocks {
    fn default() -> Self {
        Blocks::empty()
    }
}

impl AsRef<Vec<GenericRange<BlockNumber>>> for Blocks {
    fn as_ref(&self) -> &Vec<GenericRange<BlockNumber>> {
        self.ranges.as_ref()
    }
}

#[derive(Serialize, Deserialize, Clone)]
enum MyBlockBound {
    Included(BlockNumber),
    Excluded(BlockNumber),
}

impl TryFrom<Bound<&BlockNumber>> for MyBlockBound {
    type Error = anyhow::Error;
    fn try_from(b: Bound<&BlockNumber>) -> Result<MyBlockBound> {
        match b.cloned() {
            Bound::Included(a) => Ok(MyBlockBound::Included(a)),
            Bound::Excluded(a) => Ok(MyBlockBound::Excluded(a)),
            Bound::Unbounded => Err(anyhow!("block ranges are always finite")),
        }
    }
}

impl From<MyBlockBound> for Bound<BlockNumber> {
    fn from(b: MyBlockBound) -> Self {
        match b {
            MyBlockBound::Included(a) => Bound::Included(a),
            MyBlockBound::Excluded(a) => Bound::Excluded(a),
        }
    }
}

// Ranges has no serde support, so it goes through this on the way to disk
#[derive(Serialize, Deserialize)]
struct StoreBlocks {
    serdeable_ranges: Vec<(MyBlockBound, MyBlockBound)>,
}

impl TryFrom<&Blocks> for StoreBlocks {
    type Error = anyhow::Error;
    fn try_from(blocks: &Blocks) -> Result<StoreBlocks> {
        Ok(StoreBlocks {
            serdeable_ranges: blocks
                .as_ref()
                .iter()
                .map(|generic_range| {
                    Ok((
                        generic_range.start_bound().try_into()?,
                        generic_range.end_bound().try_into()?,
                    ))
                })
                .collect::<Result<Vec<_>>>()?,
        })
    }
}

impl From<StoreBlocks> for Blocks {
    fn from(stored: StoreBlocks) -> Blocks {
        let mut ranges = Ranges::new();
        for (start, end) in stored.serdeable_ranges {
            ranges.insert(GenericRange::<BlockNumber>::from((
                Bound::<BlockNumber>::from(start),
                Bound::<BlockNumber>::from(end),
            )));
        }
        Blocks { ranges }
    }
}

impl TryFrom<&[u8]> for Blocks {
    type Error = anyhow::Error;

    fn try_from(bytes: &[u8]) -> Result<Blocks> {
        let sb: StoreBlocks = bincode::deserialize(bytes)?;
        Ok(sb.into())
    }
}

impl TryInto<Vec<u8>> for &Blocks {
    type Error = anyhow::Error;
    fn try_into(self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(&StoreBlocks::try_from(self)?)?)
    }
}
