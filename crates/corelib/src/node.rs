//! Node abstractions for the consistent hash ring.
//!
//! A node is identified by an opaque `NodeId` and reached at a network
//! address. The address, not the id, is hashed onto the ring so that any
//! process holding the membership list computes the same owner for a key.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier for a storage node (e.g. a container or host name).
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// One ring membership record.
///
/// Keep this struct small and cheap to clone; lookups hand out copies of the
/// address rather than references into the locked table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RingEntry {
    pub node_id: NodeId,
    /// Base URL of the node's store, e.g. `http://10.0.0.4:8080`.
    pub address: String,
    /// `hash(address) mod ring_size`.
    pub position: u32,
}

impl RingEntry {
    pub fn new(node_id: NodeId, address: impl Into<String>, position: u32) -> Self {
        Self {
            node_id,
            address: address.into(),
            position,
        }
    }
}

impl fmt::Display for RingEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{} (pos={})", self.node_id, self.address, self.position)
    }
}
