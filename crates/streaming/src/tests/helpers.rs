//! Shared test utilities: an in-process `NodeClient` over `NodeStore`s.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use corelib::{HashRing, NodeStore, Slot, StoreStats};
use dashmap::{DashMap, DashSet};
use parking_lot::Mutex;

use crate::client::NodeClient;
use crate::error::StreamingError;
use crate::protocol::Inventory;

pub const TEST_CAPACITY: usize = 4096;
pub const TEST_RING_SIZE: u32 = 1 << 16;

/// Operations that can be made to fail per address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fault {
    Fetch,
    Bulk,
    Delete,
    Stats,
    /// Every call to the address hangs.
    Hang,
}

/// Calls observed by `InMemoryNodes`, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Fetch(String),
    Bulk(String, usize),
    Delete(String, String),
}

/// Node stores addressed by string, reachable without sockets.
#[derive(Default)]
pub struct InMemoryNodes {
    stores: DashMap<String, Arc<NodeStore>>,
    faults: DashSet<(String, Fault)>,
    log: Mutex<Vec<Op>>,
}

impl InMemoryNodes {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Registers an empty store at `address` and returns it.
    pub fn spawn(&self, address: &str) -> Arc<NodeStore> {
        let store = Arc::new(NodeStore::new(TEST_CAPACITY).unwrap());
        self.stores.insert(address.to_string(), Arc::clone(&store));
        store
    }

    pub fn store(&self, address: &str) -> Arc<NodeStore> {
        Arc::clone(self.stores.get(address).unwrap().value())
    }

    pub fn addresses(&self) -> Vec<String> {
        self.stores.iter().map(|e| e.key().clone()).collect()
    }

    pub fn inject(&self, address: &str, fault: Fault) {
        self.faults.insert((address.to_string(), fault));
    }

    pub fn ops(&self) -> Vec<Op> {
        self.log.lock().clone()
    }

    async fn check(&self, address: &str, fault: Fault) -> Result<Arc<NodeStore>, StreamingError> {
        if self.faults.contains(&(address.to_string(), Fault::Hang)) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if self.faults.contains(&(address.to_string(), fault)) {
            return Err(StreamingError::Status {
                address: address.to_string(),
                status: 500,
            });
        }
        self.stores
            .get(address)
            .map(|s| Arc::clone(s.value()))
            .ok_or_else(|| StreamingError::Status {
                address: address.to_string(),
                status: 502,
            })
    }
}

#[async_trait]
impl NodeClient for InMemoryNodes {
    async fn get(&self, address: &str, key: &str) -> Result<Option<String>, StreamingError> {
        Ok(self.check(address, Fault::Fetch).await?.get(key))
    }

    async fn put(&self, address: &str, key: &str, value: &str) -> Result<(), StreamingError> {
        let store = self.check(address, Fault::Bulk).await?;
        store.put(key, value).map_err(|_| StreamingError::Status {
            address: address.to_string(),
            status: 400,
        })
    }

    async fn delete(&self, address: &str, key: &str) -> Result<(), StreamingError> {
        let store = self.check(address, Fault::Delete).await?;
        self.log
            .lock()
            .push(Op::Delete(address.to_string(), key.to_string()));
        store.delete(key);
        Ok(())
    }

    async fn fetch_all(&self, address: &str) -> Result<Inventory, StreamingError> {
        let store = self.check(address, Fault::Fetch).await?;
        self.log.lock().push(Op::Fetch(address.to_string()));
        Ok(store.all_items())
    }

    async fn bulk_put(&self, address: &str, items: &[Slot]) -> Result<(), StreamingError> {
        let store = self.check(address, Fault::Bulk).await?;
        self.log
            .lock()
            .push(Op::Bulk(address.to_string(), items.len()));
        store.bulk_put(items.iter().cloned());
        Ok(())
    }

    async fn stats(&self, address: &str) -> Result<StoreStats, StreamingError> {
        Ok(self.check(address, Fault::Stats).await?.stats())
    }
}

/// `n` keys that all map to different slots of a `TEST_CAPACITY` store, so
/// moving them between stores never collides.
pub fn distinct_slot_keys(n: usize) -> HashMap<String, String> {
    let probe = NodeStore::new(TEST_CAPACITY).unwrap();
    let mut used = std::collections::HashSet::new();
    (0..)
        .map(|i| format!("key-{}", i))
        .filter(|k| used.insert(probe.slot_index(k)))
        .take(n)
        .map(|k| {
            let v = format!("value-of-{}", k);
            (k, v)
        })
        .collect()
}

/// Writes every key to the node the ring currently routes it to.
pub fn place(nodes: &InMemoryNodes, ring: &HashRing, keys: &HashMap<String, String>) {
    for (k, v) in keys {
        let owner = ring.get(k).unwrap();
        nodes.store(&owner).put(k.as_str(), v.as_str()).unwrap();
    }
}

/// Every key sits on its ring owner with its value and on no other node.
pub fn assert_converged(nodes: &InMemoryNodes, ring: &HashRing, keys: &HashMap<String, String>) {
    for (k, v) in keys {
        let owner = ring.get(k).unwrap();
        for address in nodes.addresses() {
            let held = nodes.store(&address).get(k);
            if address == owner {
                assert_eq!(held.as_ref(), Some(v), "{} missing from owner {}", k, owner);
            } else {
                assert_eq!(held, None, "{} still on non-owner {}", k, address);
            }
        }
    }
}

/// First address of the form `http://node-N` landing on `position`.
pub fn address_at(ring: &HashRing, position: u32) -> String {
    (0..)
        .map(|i| format!("http://node-{}", i))
        .find(|a| ring.position_for(a) == position)
        .unwrap()
}
