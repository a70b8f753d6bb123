use crate::config::IndexerConfig;
use crate::ingest_chain::blocks::Blocks;
use crate::store::{EntityStore, WriteBatch, INDEXED_BLOCKS_ID, META_KIND};
use anyhow::{anyhow, ensure, Result};
use sled::transaction::ConflictableTransactionError;
use sled::Transactional;
use tracing::info;

/// Layout of the sled database.
/// There's a data tree holding every entity, keyed by `kind 0x1F id` so kinds never
/// collide and a prefix scan over one kind is possible. The value is the entity's
/// serialized snapshot.
/// There's also a headers tree holding bookkeeping (`META_KIND` writes), most importantly
/// which blocks have already been projected into the data tree, so a host can tell where
/// to resume. Both trees change in one transaction per event.
const HEADERS_TREE_KEY: &[u8] = b"HEADERS_TREE";
const DATA_TREE_KEY: &[u8] = b"DATA_TREE";
const SEP: u8 = 0x1F;

fn data_key(kind: &str, id: &str) -> Result<Vec<u8>> {
    ensure!(
        !kind.as_bytes().contains(&SEP),
        "entity kind {:?} contains the key separator",
        kind
    );
    let mut key = Vec::with_capacity(kind.len() + id.len() + 1);
    key.extend_from_slice(kind.as_bytes());
    key.push(SEP);
    key.extend_from_slice(id.as_bytes());
    Ok(key)
}

pub struct SledHandle {
    db: sled::Db,
    header_tree: sled::Tree,
    data_tree: sled::Tree,
}

impl SledHandle {
    /// opens/creates the database at the requested sled path.
    pub fn new(sled_path: &str) -> Result<Self> {
        let db = sled::open(sled_path)?;
        info!(path = sled_path, "opened sled entity store");
        Self::from_db(db)
    }

    /// Opens `sled_path` from the config, or a temporary database when there is none.
    pub fn from_config(config: &IndexerConfig) -> Result<Self> {
        match &config.sled_path {
            Some(path) => Self::new(path),
            None => {
                info!("no sled_path configured, entity store is temporary");
                Self::temporary()
            }
        }
    }

    /// throwaway database that disappears on drop
    pub fn temporary() -> Result<Self> {
        Self::from_db(sled::Config::new().temporary(true).open()?)
    }

    fn from_db(db: sled::Db) -> Result<Self> {
        let header_tree = db.open_tree(HEADERS_TREE_KEY)?;
        let data_tree = db.open_tree(DATA_TREE_KEY)?;
        Ok(SledHandle {
            db,
            header_tree,
            data_tree,
        })
    }

    pub fn indexed_blocks(&self) -> Result<Blocks> {
        match self.header_tree.get(INDEXED_BLOCKS_ID.as_bytes())? {
            None => Ok(Blocks::empty()),
            Some(bytes) => Blocks::try_from(&bytes[..]),
        }
    }

    /// how many entities of one kind are stored
    pub fn count(&self, kind: &str) -> Result<usize> {
        let mut prefix = kind.as_bytes().to_vec();
        prefix.push(SEP);
        let mut n = 0;
        for entry in self.data_tree.scan_prefix(prefix) {
            entry?;
            n += 1;
        }
        Ok(n)
    }

    pub fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }
}

impl EntityStore for SledHandle {
    fn get(&self, kind: &str, id: &str) -> Result<Option<Vec<u8>>> {
        let found = if kind == META_KIND {
            self.header_tree.get(id.as_bytes())?
        } else {
            self.data_tree.get(data_key(kind, id)?)?
        };
        Ok(found.map(|ivec| ivec.to_vec()))
    }

    fn apply(&mut self, batch: WriteBatch) -> Result<()> {
        // (is header write, key, value)
        let writes = batch
            .into_iter()
            .map(|write| {
                if write.kind == META_KIND {
                    Ok((true, write.id.into_bytes(), write.bytes))
                } else {
                    Ok((false, data_key(&write.kind, &write.id)?, write.bytes))
                }
            })
            .collect::<Result<Vec<(bool, Vec<u8>, Vec<u8>)>>>()?;

        (&self.data_tree, &self.header_tree)
            .transaction(|(data, headers)| {
                for (is_header, key, value) in writes.iter() {
                    if *is_header {
                        headers.insert(key.as_slice(), value.as_slice())?;
                    } else {
                        data.insert(key.as_slice(), value.as_slice())?;
                    }
                }
                Ok::<(), ConflictableTransactionError<()>>(())
            })
            .map_err(|e| anyhow!("sled transaction failed: {:?}", e))
    }
}
