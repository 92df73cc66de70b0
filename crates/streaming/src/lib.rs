//! Data streaming between node stores.
//!
//! This crate provides everything that crosses the network:
//! - The node store's HTTP protocol and the `NodeClient` seam over it
//! - Key migration after ring membership changes, run by a background queue
//! - `Cluster`, binding ring mutations to migration
//! - The diagnostic ring snapshot

pub mod client;
pub mod cluster;
pub mod diagnostics;
pub mod error;
pub mod migration;
pub mod protocol;

#[cfg(test)]
mod tests;

pub use client::{HttpNodeClient, NodeClient};
pub use cluster::{Cluster, ClusterConfig};
pub use diagnostics::Diagnostics;
pub use error::StreamingError;
pub use migration::{migrate, MigrationOutcome, MigrationQueue, MigrationStats, MigrationTask};
pub use protocol::{NodeInfo, RingInfo};
