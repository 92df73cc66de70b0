//! Direct-mapped key/value store held by each storage node.
//!
//! The table has a fixed number of slots and every key maps to exactly one
//! of them, `hash(key) mod capacity`. There is no chaining and no probing:
//! a second key landing on an occupied slot replaces the first. Lookups and
//! deletes compare the stored key, so a collision reads as "not found"
//! rather than returning another key's value.

use crate::error::{Error, Result};
use crate::partitioner::{DefaultPartitioner, Partitioner};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default slot count for a node store.
pub const DEFAULT_CAPACITY: usize = 100;

/// One storage cell. An empty `key` marks an empty slot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub key: String,
    #[serde(default)]
    pub value: String,
}

impl Slot {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.key.is_empty()
    }
}

/// Capacity and fill level of a store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    /// Total slot count.
    pub slots: usize,
    /// Slots holding a key.
    pub filled: usize,
}

/// Fixed-capacity, direct-mapped slot table.
#[derive(Debug)]
pub struct NodeStore<P: Partitioner = DefaultPartitioner> {
    partitioner: P,
    /// Slot count, fixed at construction.
    capacity: u32,
    slots: RwLock<Vec<Slot>>,
}

impl NodeStore {
    /// Creates an empty store with `capacity` slots and the default partitioner.
    pub fn new(capacity: usize) -> Result<Self> {
        Self::with_partitioner(capacity, DefaultPartitioner::default())
    }
}

impl<P: Partitioner> NodeStore<P> {
    pub fn with_partitioner(capacity: usize, partitioner: P) -> Result<Self> {
        let slot_count = match u32::try_from(capacity) {
            Ok(n) if n > 0 => n,
            _ => return Err(Error::InvalidCapacity(capacity)),
        };
        Ok(Self {
            partitioner,
            capacity: slot_count,
            slots: RwLock::new(vec![Slot::default(); capacity]),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity as usize
    }

    /// Slot index `key` maps to.
    pub fn slot_index(&self, key: &str) -> usize {
        self.partitioner.bucket(key, self.capacity) as usize
    }

    /// Writes `key` into its slot, replacing whatever was there.
    pub fn put(&self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let key = key.into();
        if key.is_empty() {
            return Err(Error::EmptyKey);
        }
        let idx = self.slot_index(&key);
        self.slots.write()[idx] = Slot::new(key, value);
        Ok(())
    }

    /// Value stored under `key`, if its slot currently holds that key.
    pub fn get(&self, key: &str) -> Option<String> {
        let idx = self.slot_index(key);
        let slots = self.slots.read();
        let slot = &slots[idx];
        (!slot.is_empty() && slot.key == key).then(|| slot.value.clone())
    }

    /// Clears the slot for `key` if it holds that key. Returns whether a slot
    /// was cleared; deleting an absent key is a no-op.
    pub fn delete(&self, key: &str) -> bool {
        let idx = self.slot_index(key);
        let mut slots = self.slots.write();
        if !slots[idx].is_empty() && slots[idx].key == key {
            slots[idx] = Slot::default();
            true
        } else {
            false
        }
    }

    /// Snapshot of every occupied slot.
    pub fn all_items(&self) -> HashMap<String, String> {
        self.slots
            .read()
            .iter()
            .filter(|s| !s.is_empty())
            .map(|s| (s.key.clone(), s.value.clone()))
            .collect()
    }

    /// Applies `put` for every slot in `items`, skipping empty keys.
    /// Returns the number of items written.
    pub fn bulk_put<I>(&self, items: I) -> usize
    where
        I: IntoIterator<Item = Slot>,
    {
        let mut slots = self.slots.write();
        let mut written = 0;
        for item in items.into_iter().filter(|s| !s.is_empty()) {
            let idx = self.slot_index(&item.key);
            slots[idx] = item;
            written += 1;
        }
        written
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            slots: self.capacity(),
            filled: self.slots.read().iter().filter(|s| !s.is_empty()).count(),
        }
    }
}
