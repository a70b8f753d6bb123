//! Entity repository.
//!
//! Stores only know bytes keyed by `(kind, id)`. Handlers never talk to a store
//! directly: every event gets a [`Staged`] overlay, loads see that event's own
//! pending writes first, and the whole overlay is applied as one batch once the
//! event's handler returned `Ok`. Dropping a `Staged` throws its writes away.
use anyhow::{anyhow, Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;

/// Kind reserved for indexer bookkeeping that isn't an entity.
pub const META_KIND: &str = "_meta";
pub const INDEXED_BLOCKS_ID: &str = "indexed_blocks";
pub const LAST_APPLIED_ID: &str = "last_applied";

/// Something persisted under a stable id.
pub trait Entity: Serialize + DeserializeOwned {
    const KIND: &'static str;
    fn id(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Write {
    pub kind: String,
    pub id: String,
    pub bytes: Vec<u8>,
}

/// Writes that land together or not at all.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WriteBatch {
    writes: Vec<Write>,
}

impl WriteBatch {
    pub fn insert(&mut self, kind: &str, id: &str, bytes: Vec<u8>) {
        self.writes.push(Write {
            kind: kind.to_string(),
            id: id.to_string(),
            bytes,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }
}

impl IntoIterator for WriteBatch {
    type Item = Write;
    type IntoIter = std::vec::IntoIter<Write>;
    fn into_iter(self) -> Self::IntoIter {
        self.writes.into_iter()
    }
}

pub fn encode<E: Entity>(entity: &E) -> Result<Vec<u8>> {
    serde_json::to_vec(entity).with_context(|| format!("encoding {} {}", E::KIND, entity.id()))
}

pub fn decode<E: Entity>(id: &str, bytes: &[u8]) -> Result<E> {
    serde_json::from_slice(bytes).with_context(|| format!("decoding {} {}", E::KIND, id))
}

pub trait EntityStore {
    fn get(&self, kind: &str, id: &str) -> Result<Option<Vec<u8>>>;

    /// overwrites whatever was committed for each key before
    fn apply(&mut self, batch: WriteBatch) -> Result<()>;

    fn load<E: Entity>(&self, id: &str) -> Result<Option<E>>
    where
        Self: Sized,
    {
        self.get(E::KIND, id)?
            .map(|bytes| decode(id, &bytes))
            .transpose()
    }
}

#[derive(Default, Debug)]
pub struct MemoryStore {
    entries: BTreeMap<(String, String), Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// how many entities of a kind are committed
    pub fn count(&self, kind: &str) -> usize {
        self.entries.keys().filter(|(k, _)| k == kind).count()
    }
}

impl EntityStore for MemoryStore {
    fn get(&self, kind: &str, id: &str) -> Result<Option<Vec<u8>>> {
        Ok(self
            .entries
            .get(&(kind.to_string(), id.to_string()))
            .cloned())
    }

    fn apply(&mut self, batch: WriteBatch) -> Result<()> {
        for write in batch {
            self.entries.insert((write.kind, write.id), write.bytes);
        }
        Ok(())
    }
}

/// Per-event write overlay on top of a committed store.
pub struct Staged<'s> {
    base: &'s dyn EntityStore,
    pending: BTreeMap<(&'static str, String), Vec<u8>>,
    raw: Vec<Write>,
}

impl<'s> Staged<'s> {
    pub fn new(base: &'s dyn EntityStore) -> Self {
        Staged {
            base,
            pending: BTreeMap::new(),
            raw: Vec::new(),
        }
    }

    pub fn load<E: Entity>(&self, id: &str) -> Result<Option<E>> {
        match self.pending.get(&(E::KIND, id.to_string())) {
            Some(bytes) => decode(id, bytes).map(Some),
            None => self
                .base
                .get(E::KIND, id)?
                .map(|bytes| decode(id, &bytes))
                .transpose(),
        }
    }

    pub fn exists<E: Entity>(&self, id: &str) -> Result<bool> {
        if self.pending.contains_key(&(E::KIND, id.to_string())) {
            return Ok(true);
        }
        Ok(self.base.get(E::KIND, id)?.is_some())
    }

    /// like `load`, but a missing entity is an error
    pub fn require<E: Entity>(&self, id: &str) -> Result<E> {
        self.load(id)?
            .ok_or_else(|| anyhow!("{} {} was never created", E::KIND, id))
    }

    /// Loads `id`, or builds it with `create`. A freshly built entity is NOT saved.
    pub fn get_or_create<E, F>(&self, id: &str, create: F) -> Result<E>
    where
        E: Entity,
        F: FnOnce() -> Result<E>,
    {
        match self.load(id)? {
            Some(entity) => Ok(entity),
            None => create(),
        }
    }

    pub fn save<E: Entity>(&mut self, entity: &E) -> Result<()> {
        let bytes = encode(entity)?;
        self.pending
            .insert((E::KIND, entity.id().to_string()), bytes);
        Ok(())
    }

    /// Saves a write-once record; fails if something already sits under its id.
    pub fn insert_new<E: Entity>(&mut self, entity: &E) -> Result<()> {
        if self.exists::<E>(entity.id())? {
            return Err(anyhow!(
                "{} {} already recorded, refusing to overwrite history",
                E::KIND,
                entity.id()
            ));
        }
        self.save(entity)
    }

    /// bookkeeping bytes that aren't entities, committed with the rest
    pub fn put_raw(&mut self, kind: &str, id: &str, bytes: Vec<u8>) {
        self.raw.push(Write {
            kind: kind.to_string(),
            id: id.to_string(),
            bytes,
        });
    }

    pub fn into_batch(self) -> WriteBatch {
        let mut batch = WriteBatch::default();
        for ((kind, id), bytes) in self.pending {
            batch.insert(kind, &id, bytes);
        }
        for write in self.raw {
            batch.writes.push(write);
        }
        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Counter {
        id: String,
        n: u64,
    }

    impl Entity for Counter {
        const KIND: &'static str = "Counter";
        fn id(&self) -> &str {
            &self.id
        }
    }

    fn counter(id: &str, n: u64) -> Counter {
        Counter {
            id: id.to_string(),
            n,
        }
    }

    #[test]
    fn staged_reads_its_own_writes() {
        let store = MemoryStore::new();
        let mut staged = Staged::new(&store);
        staged.save(&counter("a", 1)).unwrap();
        assert_eq!(staged.load::<Counter>("a").unwrap(), Some(counter("a", 1)));
        assert_eq!(store.load::<Counter>("a").unwrap(), None);
    }

    #[test]
    fn dropping_staged_discards_writes() {
        let mut store = MemoryStore::new();
        {
            let mut staged = Staged::new(&store);
            staged.save(&counter("a", 1)).unwrap();
        }
        let staged = Staged::new(&store);
        let batch = staged.into_batch();
        assert!(batch.is_empty());
        store.apply(batch).unwrap();
        assert_eq!(store.count(Counter::KIND), 0);
    }

    #[test]
    fn commit_overwrites_previous_snapshot() {
        let mut store = MemoryStore::new();
        let mut staged = Staged::new(&store);
        staged.save(&counter("a", 1)).unwrap();
        let batch = staged.into_batch();
        store.apply(batch).unwrap();

        let mut staged = Staged::new(&store);
        let mut c: Counter = staged.require("a").unwrap();
        c.n += 1;
        staged.save(&c).unwrap();
        staged.save(&c).unwrap();
        let batch = staged.into_batch();
        assert_eq!(batch.len(), 1);
        store.apply(batch).unwrap();
        assert_eq!(store.load::<Counter>("a").unwrap(), Some(counter("a", 2)));
    }

    #[test]
    fn get_or_create_does_not_save() {
        let store = MemoryStore::new();
        let staged = Staged::new(&store);
        let c = staged
            .get_or_create("fresh", || Ok(counter("fresh", 7)))
            .unwrap();
        assert_eq!(c.n, 7);
        assert!(!staged.exists::<Counter>("fresh").unwrap());
    }

    #[test]
    fn get_or_create_skips_constructor_when_present() {
        let mut store = MemoryStore::new();
        let mut staged = Staged::new(&store);
        staged.save(&counter("a", 3)).unwrap();
        let batch = staged.into_batch();
        store.apply(batch).unwrap();

        let staged = Staged::new(&store);
        let c: Counter = staged
            .get_or_create("a", || Err(anyhow!("should not be called")))
            .unwrap();
        assert_eq!(c.n, 3);
    }

    #[test]
    fn history_rows_are_write_once() {
        let store = MemoryStore::new();
        let mut staged = Staged::new(&store);
        staged.insert_new(&counter("tx-1", 1)).unwrap();
        assert!(staged.insert_new(&counter("tx-1", 2)).is_err());
        assert_eq!(staged.require::<Counter>("tx-1").unwrap().n, 1);
    }

    #[test]
    fn require_reports_missing_entity() {
        let store = MemoryStore::new();
        let staged = Staged::new(&store);
        let err = staged.require::<Counter>("nope").unwrap_err();
        assert!(err.to_string().contains("never created"));
    }
}
