//! Core library for consistent hashing.
//!
//! This crate provides the fundamental pieces shared by the coordinator and
//! the storage nodes:
//! - Partitioners hashing keys and addresses to `u32`
//! - The fixed-size hash ring and its position table
//! - Node identities and ring entries
//! - The per-node direct-mapped slot store

pub mod error;
pub mod node;
pub mod partitioner;
pub mod ring;
pub mod store;

pub use error::{Error, Result};
pub use node::{NodeId, RingEntry};
pub use partitioner::Partitioner;
pub use ring::{Departure, HashRing, Placement, Ring, RingBuilder};
pub use store::{NodeStore, Slot, StoreStats};
