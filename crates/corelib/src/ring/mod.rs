//! Consistent hash ring implementation.
//!
//! The ring manages node positions and provides lookup of the node
//! responsible for a key.

pub mod position;
#[allow(clippy::module_inception)]
pub mod ring;

pub use position::PositionTable;
pub use ring::{Departure, HashRing, Placement, RingBuilder, DEFAULT_RING_SIZE};

/// Alias for the main ring type (used by lib.rs).
pub type Ring = HashRing;
