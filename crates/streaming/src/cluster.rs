//! Membership changes wired to data migration.
//!
//! `Cluster` owns the ring, the migration queue and the diagnostics view.
//! `add_node` and `remove_node` update the ring immediately and return; the
//! data they displace is moved afterwards by the migration worker. Until that
//! finishes a lookup can route a key to a node that does not hold it yet.

use crate::client::{NodeClient, DEFAULT_TIMEOUT};
use crate::diagnostics::Diagnostics;
use crate::error::StreamingError;
use crate::migration::{MigrationQueue, MigrationReason, MigrationStats, MigrationTask};
use crate::protocol::RingInfo;
use corelib::{Departure, HashRing, NodeId, Placement};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Coordinator-side settings.
#[derive(Debug, Clone)]
pub struct ClusterConfig {
    /// Number of ring positions.
    ///
    /// Defaults to 1024.
    pub ring_size: u32,

    /// Bound on each diagnostic node query.
    ///
    /// Defaults to 5s.
    pub node_timeout: Duration,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            ring_size: corelib::ring::DEFAULT_RING_SIZE,
            node_timeout: DEFAULT_TIMEOUT,
        }
    }
}

pub struct Cluster {
    ring: Arc<HashRing>,
    client: Arc<dyn NodeClient>,
    migrations: MigrationQueue,
    diagnostics: Diagnostics,
}

impl Cluster {
    /// Creates a cluster around an existing ring. Must be called inside a
    /// tokio runtime; the migration worker is spawned here.
    pub fn new(ring: HashRing, client: Arc<dyn NodeClient>, config: &ClusterConfig) -> Self {
        let ring = Arc::new(ring);
        let migrations = MigrationQueue::start(Arc::clone(&client), Arc::clone(&ring));
        let diagnostics = Diagnostics::new(Arc::clone(&client), config.node_timeout);
        Self {
            ring,
            client,
            migrations,
            diagnostics,
        }
    }

    /// Creates a cluster with an empty ring of `config.ring_size` positions.
    pub fn empty(
        client: Arc<dyn NodeClient>,
        config: &ClusterConfig,
    ) -> corelib::Result<Self> {
        Ok(Self::new(HashRing::new(config.ring_size)?, client, config))
    }

    pub fn ring(&self) -> &Arc<HashRing> {
        &self.ring
    }

    pub fn client(&self) -> &Arc<dyn NodeClient> {
        &self.client
    }

    /// Address of the node owning `key`.
    pub fn route(&self, key: &str) -> Result<String, StreamingError> {
        self.ring.get(key).ok_or(StreamingError::NoNodes)
    }

    /// Places a node on the ring and schedules the pull of its keys from the
    /// successor. Returns the node's ring position.
    pub fn add_node(&self, address: impl Into<String>, node_id: impl Into<NodeId>) -> u32 {
        let address = address.into();
        let node_id = node_id.into();
        let Placement {
            position,
            successor,
            displaced,
            ownership,
        } = self.ring.add(address.clone(), node_id.clone());

        info!(%node_id, %address, position, "node joined");
        if !displaced.is_empty() {
            warn!(
                %node_id,
                displaced = displaced.len(),
                "join overwrote existing ring entries; their keys stay where they are"
            );
        }

        match successor {
            Some(successor) if successor.address != address => {
                self.schedule(MigrationTask {
                    from: successor.address,
                    to: address,
                    reason: MigrationReason::Join(node_id),
                    ownership,
                });
            }
            _ => {}
        }

        position
    }

    /// Takes a node off the ring and schedules the hand-off of all its keys
    /// to the successor. `None` if `node_id` is not on the ring.
    pub fn remove_node(&self, node_id: &NodeId) -> Option<Departure> {
        let departure = self.ring.remove(node_id)?;
        info!(%node_id, address = %departure.removed.address, "node left");

        match &departure.successor {
            Some(successor) if successor.address != departure.removed.address => {
                self.schedule(MigrationTask {
                    from: departure.removed.address.clone(),
                    to: successor.address.clone(),
                    reason: MigrationReason::Leave(node_id.clone()),
                    ownership: Arc::clone(&departure.ownership),
                });
            }
            Some(_) => {}
            None => {
                warn!(%node_id, "last node left the ring; its keys are no longer reachable");
            }
        }

        Some(departure)
    }

    fn schedule(&self, task: MigrationTask) {
        if let Err(e) = self.migrations.submit(task) {
            error!(error = %e, "could not schedule migration");
        }
    }

    /// Diagnostic snapshot of every ring entry and its node.
    pub async fn info(&self) -> RingInfo {
        self.diagnostics.snapshot(&self.ring).await
    }

    pub fn migration_stats(&self) -> MigrationStats {
        self.migrations.stats()
    }

    /// Waits for every migration scheduled so far.
    pub async fn wait_for_migrations(&self) {
        self.migrations.wait_idle().await
    }

    /// Drains pending migrations and stops the worker.
    pub async fn shutdown(&self) {
        self.migrations.shutdown().await
    }
}
