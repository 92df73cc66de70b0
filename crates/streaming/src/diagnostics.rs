//! Read-only diagnostic snapshot of the ring and the nodes behind it.
//!
//! Kept apart from ring mutation and lookup: it copies the entries out of the
//! ring first and only then goes to the network, querying all nodes
//! concurrently. A node that fails or times out keeps its ring fields and
//! loses the ones that came from the node.

use crate::client::NodeClient;
use crate::protocol::{NodeInfo, RingInfo};
use corelib::{HashRing, RingEntry};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub struct Diagnostics {
    client: Arc<dyn NodeClient>,
    timeout: Duration,
}

impl Diagnostics {
    pub fn new(client: Arc<dyn NodeClient>, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    pub async fn snapshot(&self, ring: &HashRing) -> RingInfo {
        let entries = ring.entries();
        let nodes = join_all(entries.into_iter().map(|e| self.describe(e))).await;
        RingInfo {
            size: ring.ring_size(),
            nodes,
        }
    }

    async fn describe(&self, entry: RingEntry) -> NodeInfo {
        let address = entry.address.as_str();
        let (stats, keys) = tokio::join!(
            tokio::time::timeout(self.timeout, self.client.stats(address)),
            tokio::time::timeout(self.timeout, self.client.fetch_all(address)),
        );

        let stats = match stats {
            Ok(Ok(stats)) => Some(stats),
            Ok(Err(e)) => {
                debug!(address, error = %e, "stats query failed");
                None
            }
            Err(_) => {
                debug!(address, "stats query timed out");
                None
            }
        };
        let keys = match keys {
            Ok(Ok(keys)) => Some(keys),
            Ok(Err(e)) => {
                debug!(address, error = %e, "inventory query failed");
                None
            }
            Err(_) => {
                debug!(address, "inventory query timed out");
                None
            }
        };

        NodeInfo {
            node_id: entry.node_id.clone(),
            addr: entry.address.clone(),
            key: entry.position,
            keys,
            slots: stats.map(|s| s.slots),
            filled: stats.map(|s| s.filled),
        }
    }
}
