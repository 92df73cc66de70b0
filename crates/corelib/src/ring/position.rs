//! Position table backing the hash ring.
//!
//! `PositionTable` is the unsynchronized core: a sorted vector of occupied
//! positions, the entry at each position, and a node-id index. `HashRing`
//! wraps it in a lock; everything here assumes exclusive access for
//! mutation.

use crate::node::{NodeId, RingEntry};
use std::collections::HashMap;

/// Sorted position table with a node-id index.
///
/// # Invariants
///
/// - `positions` is strictly ascending and equals the key set of `entries`
/// - `by_node[e.node_id] == e.position` for every entry `e`
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PositionTable {
    positions: Vec<u32>,
    entries: HashMap<u32, RingEntry>,
    by_node: HashMap<NodeId, u32>,
}

impl PositionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Occupied positions in ascending order.
    pub fn positions(&self) -> &[u32] {
        &self.positions
    }

    pub fn get(&self, position: u32) -> Option<&RingEntry> {
        self.entries.get(&position)
    }

    pub fn position_of(&self, node_id: &NodeId) -> Option<u32> {
        self.by_node.get(node_id).copied()
    }

    /// Entries in ascending position order.
    pub fn entries(&self) -> impl Iterator<Item = &RingEntry> + '_ {
        self.positions.iter().filter_map(|p| self.entries.get(p))
    }

    /// Inserts `entry`, returning every entry it pushed out.
    ///
    /// Two kinds of entries are displaced: the one already sitting at the
    /// same position, and an earlier entry registered under the same node id
    /// at a different position.
    pub fn insert(&mut self, entry: RingEntry) -> Vec<RingEntry> {
        let mut displaced = Vec::new();

        if let Some(old_pos) = self.by_node.get(&entry.node_id).copied() {
            if old_pos != entry.position {
                if let Some(old) = self.remove_position(old_pos) {
                    displaced.push(old);
                }
            }
        }

        let position = entry.position;
        let node_id = entry.node_id.clone();
        let unchanged = self.entries.get(&position) == Some(&entry);

        match self.entries.insert(position, entry) {
            Some(old) => {
                if old.node_id != node_id {
                    self.by_node.remove(&old.node_id);
                }
                if !unchanged {
                    displaced.push(old);
                }
            }
            None => {
                if let Err(idx) = self.positions.binary_search(&position) {
                    self.positions.insert(idx, position);
                }
            }
        }
        self.by_node.insert(node_id, position);

        displaced
    }

    /// Removes the entry registered under `node_id`.
    pub fn remove_node(&mut self, node_id: &NodeId) -> Option<RingEntry> {
        let position = self.by_node.get(node_id).copied()?;
        self.remove_position(position)
    }

    fn remove_position(&mut self, position: u32) -> Option<RingEntry> {
        let entry = self.entries.remove(&position)?;
        if let Ok(idx) = self.positions.binary_search(&position) {
            self.positions.remove(idx);
        }
        if self.by_node.get(&entry.node_id) == Some(&position) {
            self.by_node.remove(&entry.node_id);
        }
        Some(entry)
    }

    /// The entry at the smallest position strictly greater than `position`,
    /// wrapping to the smallest position overall.
    ///
    /// When `position` is the only occupied position the entry found is the
    /// one at `position` itself.
    pub fn successor(&self, position: u32) -> Option<&RingEntry> {
        let idx = self.positions.partition_point(|&p| p <= position);
        self.wrapped(idx)
    }

    /// The entry owning hashed point `h`: the smallest position `>= h`,
    /// wrapping to the smallest position overall.
    pub fn owner(&self, h: u32) -> Option<&RingEntry> {
        let idx = self.positions.partition_point(|&p| p < h);
        self.wrapped(idx)
    }

    fn wrapped(&self, idx: usize) -> Option<&RingEntry> {
        let first = *self.positions.first()?;
        let position = self.positions.get(idx).copied().unwrap_or(first);
        self.entries.get(&position)
    }
}
