//! Partitioner abstraction for consistent hashing.
//!
//! Partitioners are responsible for converting keys and node addresses into
//! integers that are then reduced onto the ring or onto a store's slot table.

pub mod siphash;
pub mod traits;
pub mod xxhash;

pub use siphash::SipHashPartitioner;
pub use traits::Partitioner;
pub use xxhash::XxHash32Partitioner;

/// Partitioner used when none is named explicitly.
pub type DefaultPartitioner = XxHash32Partitioner;
