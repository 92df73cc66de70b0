//! Hash ring data structure.
//!
//! The ring has a fixed number of positions. Each node sits at
//! `hash(address) mod ring_size`, and a key belongs to the first node found
//! walking clockwise from `hash(key) mod ring_size`.

use crate::error::{Error, Result};
use crate::node::{NodeId, RingEntry};
use crate::partitioner::{DefaultPartitioner, Partitioner};
use crate::ring::position::PositionTable;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, warn};

/// Default ring size used by `RingBuilder`.
pub const DEFAULT_RING_SIZE: u32 = 1024;

/// Outcome of adding a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    /// The position the node landed on.
    pub position: u32,
    /// The node that owned this arc before the join; keys it holds that now
    /// hash to the new node must migrate. `None` when the new node is alone
    /// on the ring.
    pub successor: Option<RingEntry>,
    /// Entries pushed out by this add (position collision, or the same node
    /// id previously registered elsewhere).
    pub displaced: Vec<RingEntry>,
    /// Ownership right after this add. Migrations for the join filter keys
    /// against it rather than against whatever the ring looks like later.
    pub ownership: Arc<PositionTable>,
}

/// Outcome of removing a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub removed: RingEntry,
    /// The node inheriting the removed node's keys. `None` when the ring is
    /// now empty.
    pub successor: Option<RingEntry>,
    /// Ownership right after this removal.
    pub ownership: Arc<PositionTable>,
}

/// Consistent hash ring with a fixed number of positions.
///
/// All access to the position table goes through one `RwLock`: lookups take
/// the shared side, `add`/`remove` the exclusive side, so a lookup never sees
/// the sorted positions out of step with the entries. The table is shared
/// copy-on-write, so a snapshot stays frozen while the ring moves on.
#[derive(Debug)]
pub struct HashRing<P: Partitioner = DefaultPartitioner> {
    ring_size: u32,
    partitioner: P,
    table: RwLock<Arc<PositionTable>>,
}

impl HashRing {
    /// Creates an empty ring with the default partitioner.
    pub fn new(ring_size: u32) -> Result<Self> {
        Self::with_partitioner(ring_size, DefaultPartitioner::default())
    }
}

impl<P: Partitioner> HashRing<P> {
    /// Creates an empty ring hashing with `partitioner`.
    pub fn with_partitioner(ring_size: u32, partitioner: P) -> Result<Self> {
        if ring_size == 0 {
            return Err(Error::InvalidRingSize(ring_size));
        }
        Ok(Self {
            ring_size,
            partitioner,
            table: RwLock::new(Arc::new(PositionTable::new())),
        })
    }

    /// Number of positions on the ring. Fixed for the ring's lifetime.
    pub fn ring_size(&self) -> u32 {
        self.ring_size
    }

    pub fn partitioner_name(&self) -> &'static str {
        self.partitioner.name()
    }

    /// Position a node at `address` occupies (or would occupy).
    pub fn position_for(&self, address: &str) -> u32 {
        self.partitioner.bucket(address, self.ring_size)
    }

    /// Hashed point of `key` on the ring.
    pub fn point_for(&self, key: &str) -> u32 {
        self.partitioner.bucket(key, self.ring_size)
    }

    /// Owner of `key` in `ownership`, a table taken from this ring earlier.
    pub fn owner_in<'a>(&self, ownership: &'a PositionTable, key: &str) -> Option<&'a RingEntry> {
        ownership.owner(self.point_for(key))
    }

    /// Current ownership, frozen. Later membership changes do not show up in
    /// the returned table.
    pub fn snapshot(&self) -> Arc<PositionTable> {
        Arc::clone(&*self.table.read())
    }

    /// Adds a node, overwriting whatever sits at its position.
    pub fn add(&self, address: impl Into<String>, node_id: impl Into<NodeId>) -> Placement {
        let address = address.into();
        let node_id = node_id.into();
        let position = self.position_for(&address);

        let mut guard = self.table.write();
        let table = Arc::make_mut(&mut *guard);
        let displaced = table.insert(RingEntry::new(node_id.clone(), address, position));
        let successor = table
            .successor(position)
            .filter(|e| e.node_id != node_id)
            .cloned();
        let ownership = Arc::clone(&*guard);
        drop(guard);

        for old in &displaced {
            warn!(%node_id, displaced = %old, "ring entry overwritten");
        }
        debug!(%node_id, position, successor = ?successor.as_ref().map(|e| &e.node_id), "added node to ring");

        Placement {
            position,
            successor,
            displaced,
            ownership,
        }
    }

    /// Removes the node registered as `node_id`. `None` if it is not on the ring.
    pub fn remove(&self, node_id: &NodeId) -> Option<Departure> {
        let mut guard = self.table.write();
        if guard.position_of(node_id).is_none() {
            return None;
        }
        let table = Arc::make_mut(&mut *guard);
        let removed = table.remove_node(node_id)?;
        let successor = table.successor(removed.position).cloned();
        let ownership = Arc::clone(&*guard);
        drop(guard);

        debug!(%node_id, position = removed.position, "removed node from ring");
        Some(Departure {
            removed,
            successor,
            ownership,
        })
    }

    /// Address of the node owning `key`, or `None` on an empty ring.
    pub fn get(&self, key: &str) -> Option<String> {
        self.owner(key).map(|e| e.address)
    }

    /// Full entry of the node owning `key`.
    pub fn owner(&self, key: &str) -> Option<RingEntry> {
        let h = self.point_for(key);
        self.table.read().owner(h).cloned()
    }

    /// Entry registered as `node_id`.
    pub fn entry(&self, node_id: &NodeId) -> Option<RingEntry> {
        let table = self.table.read();
        let position = table.position_of(node_id)?;
        table.get(position).cloned()
    }

    /// Snapshot of all entries in position order.
    pub fn entries(&self) -> Vec<RingEntry> {
        self.table.read().entries().cloned().collect()
    }

    /// Snapshot of occupied positions in ascending order.
    pub fn positions(&self) -> Vec<u32> {
        self.table.read().positions().to_vec()
    }

    pub fn len(&self) -> usize {
        self.table.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.read().is_empty()
    }
}

/// Builder for a ring with an initial membership.
///
/// Nodes added through the builder are placed without reporting successors;
/// use it for membership that already matches data placement (e.g. process
/// start-up).
#[derive(Debug)]
pub struct RingBuilder<P: Partitioner = DefaultPartitioner> {
    ring_size: u32,
    partitioner: P,
    nodes: Vec<(String, NodeId)>,
}

impl RingBuilder {
    pub fn new() -> Self {
        Self {
            ring_size: DEFAULT_RING_SIZE,
            partitioner: DefaultPartitioner::default(),
            nodes: Vec::new(),
        }
    }
}

impl Default for RingBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Partitioner> RingBuilder<P> {
    pub fn with_size(mut self, ring_size: u32) -> Self {
        self.ring_size = ring_size;
        self
    }

    pub fn with_partitioner<Q: Partitioner>(self, partitioner: Q) -> RingBuilder<Q> {
        RingBuilder {
            ring_size: self.ring_size,
            partitioner,
            nodes: self.nodes,
        }
    }

    pub fn add_node(mut self, address: impl Into<String>, node_id: impl Into<NodeId>) -> Self {
        self.nodes.push((address.into(), node_id.into()));
        self
    }

    pub fn build(self) -> Result<HashRing<P>> {
        let ring = HashRing::with_partitioner(self.ring_size, self.partitioner)?;
        for (address, node_id) in self.nodes {
            ring.add(address, node_id);
        }
        Ok(ring)
    }
}
