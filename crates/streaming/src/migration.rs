//! Key migration between node stores after a membership change.
//!
//! A migration moves every key held by `from` whose current ring owner is
//! `to`:
//!
//! 1. fetch the full inventory of `from`
//! 2. keep the keys owned by `to` in the task's ownership snapshot
//! 3. stop if there are none
//! 4. bulk-write them to `to` in one call
//! 5. delete them from `from` one by one
//!
//! The bulk write always lands before any delete, so an interrupted run can
//! leave a key on both nodes but never on neither. Fetch, decode and bulk
//! write failures abort the run; a failed delete is logged and skipped.
//!
//! Migrations run on a background worker fed by `MigrationQueue`. The
//! worker processes tasks one at a time in submission order. Each task
//! carries the ring ownership taken with the membership change that
//! scheduled it, so a task that runs late still moves exactly the keys that
//! change handed over; later changes are covered by their own tasks.

use crate::client::NodeClient;
use crate::error::StreamingError;
use crate::protocol::Slot;
use corelib::ring::PositionTable;
use corelib::{HashRing, NodeId};
use metrics::counter;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Why a migration was scheduled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationReason {
    /// A node joined and takes over part of its successor's arc.
    Join(NodeId),
    /// A node left and its successor inherits everything it held.
    Leave(NodeId),
}

impl fmt::Display for MigrationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationReason::Join(id) => write!(f, "join of {}", id),
            MigrationReason::Leave(id) => write!(f, "leave of {}", id),
        }
    }
}

/// One unit of migration work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationTask {
    pub from: String,
    pub to: String,
    pub reason: MigrationReason,
    /// Ring ownership right after the membership change.
    pub ownership: Arc<PositionTable>,
}

/// Result of a completed migration run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationOutcome {
    /// Keys written to the destination.
    pub moved: usize,
    /// Keys written to the destination but not deleted from the source.
    pub delete_failures: usize,
}

/// Runs one migration from `from` to `to`. Keys are assigned with `ring`'s
/// hash against `ownership`, a table previously taken from `ring`.
pub async fn migrate<C>(
    client: &C,
    ring: &HashRing,
    ownership: &PositionTable,
    from: &str,
    to: &str,
) -> Result<MigrationOutcome, StreamingError>
where
    C: NodeClient + ?Sized,
{
    let inventory = client.fetch_all(from).await?;

    let batch: Vec<Slot> = inventory
        .into_iter()
        .filter(|(key, _)| {
            ring.owner_in(ownership, key)
                .is_some_and(|owner| owner.address == to)
        })
        .map(|(key, value)| Slot::new(key, value))
        .collect();

    if batch.is_empty() {
        debug!(from, to, "nothing to migrate");
        return Ok(MigrationOutcome::default());
    }

    client.bulk_put(to, &batch).await?;
    counter!("migration.keys_moved").increment(batch.len() as u64);

    let mut delete_failures = 0;
    for slot in &batch {
        if let Err(e) = client.delete(from, &slot.key).await {
            warn!(key = %slot.key, from, error = %e, "failed to delete migrated key");
            counter!("migration.delete_failures").increment(1);
            delete_failures += 1;
        }
    }

    Ok(MigrationOutcome {
        moved: batch.len(),
        delete_failures,
    })
}

/// Counters describing queue activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationStats {
    pub submitted: u64,
    pub completed: u64,
    pub failed: u64,
    pub keys_moved: u64,
}

impl MigrationStats {
    pub fn pending(&self) -> u64 {
        self.submitted
            .saturating_sub(self.completed)
            .saturating_sub(self.failed)
    }
}

#[derive(Debug, Default)]
struct Counters {
    submitted: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    keys_moved: AtomicU64,
}

/// Work queue feeding a single background migration worker.
///
/// Tasks are executed strictly in submission order, so two migrations never
/// interleave their writes and deletes.
pub struct MigrationQueue {
    sender: Mutex<Option<mpsc::UnboundedSender<MigrationTask>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    counters: Arc<Counters>,
    finished: watch::Receiver<u64>,
}

impl MigrationQueue {
    /// Spawns the worker on the current tokio runtime.
    pub fn start(client: Arc<dyn NodeClient>, ring: Arc<HashRing>) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let (finished_tx, finished) = watch::channel(0u64);
        let counters = Arc::new(Counters::default());

        let worker = tokio::spawn(run_worker(
            receiver,
            client,
            ring,
            Arc::clone(&counters),
            finished_tx,
        ));

        Self {
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(worker)),
            counters,
            finished,
        }
    }

    /// Enqueues a task. Fails only after `shutdown`.
    pub fn submit(&self, task: MigrationTask) -> Result<(), StreamingError> {
        let sender = self.sender.lock();
        let sender = sender.as_ref().ok_or(StreamingError::QueueClosed)?;
        self.counters.submitted.fetch_add(1, Ordering::SeqCst);
        if sender.send(task).is_err() {
            self.counters.submitted.fetch_sub(1, Ordering::SeqCst);
            return Err(StreamingError::QueueClosed);
        }
        Ok(())
    }

    pub fn stats(&self) -> MigrationStats {
        // Finished counters first: a task is counted as submitted before it
        // can finish, so `submitted` read last is never behind them.
        let completed = self.counters.completed.load(Ordering::SeqCst);
        let failed = self.counters.failed.load(Ordering::SeqCst);
        let keys_moved = self.counters.keys_moved.load(Ordering::SeqCst);
        MigrationStats {
            submitted: self.counters.submitted.load(Ordering::SeqCst),
            completed,
            failed,
            keys_moved,
        }
    }

    /// Waits until every task submitted so far has finished.
    pub async fn wait_idle(&self) {
        let target = self.counters.submitted.load(Ordering::SeqCst);
        let mut finished = self.finished.clone();
        // The worker holds the sender side until it exits; an error here means
        // it is gone and nothing else will finish.
        let _ = finished.wait_for(|&done| done >= target).await;
    }

    /// Stops accepting tasks, drains the queue, and waits for the worker.
    pub async fn shutdown(&self) {
        self.sender.lock().take();
        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            if let Err(e) = worker.await {
                error!(error = %e, "migration worker panicked");
            }
        }
    }
}

async fn run_worker(
    mut receiver: mpsc::UnboundedReceiver<MigrationTask>,
    client: Arc<dyn NodeClient>,
    ring: Arc<HashRing>,
    counters: Arc<Counters>,
    finished: watch::Sender<u64>,
) {
    let mut done = 0u64;
    while let Some(task) = receiver.recv().await {
        debug!(from = %task.from, to = %task.to, reason = %task.reason, "migration started");
        match migrate(client.as_ref(), &ring, &task.ownership, &task.from, &task.to).await {
            Ok(outcome) => {
                counters.completed.fetch_add(1, Ordering::SeqCst);
                counters
                    .keys_moved
                    .fetch_add(outcome.moved as u64, Ordering::SeqCst);
                info!(
                    from = %task.from,
                    to = %task.to,
                    reason = %task.reason,
                    moved = outcome.moved,
                    delete_failures = outcome.delete_failures,
                    "migration finished"
                );
            }
            Err(e) => {
                counters.failed.fetch_add(1, Ordering::SeqCst);
                counter!("migration.aborted").increment(1);
                error!(
                    from = %task.from,
                    to = %task.to,
                    reason = %task.reason,
                    error = %e,
                    "migration aborted"
                );
            }
        }
        done += 1;
        finished.send_replace(done);
    }
    debug!("migration worker stopped");
}
