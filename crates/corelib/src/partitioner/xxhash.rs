//! xxHash32 partitioner implementation.

use crate::partitioner::traits::Partitioner;
use xxhash_rust::xxh32::xxh32;

/// Default partitioner: xxh32 with a zero seed.
#[derive(Clone, Copy, Debug, Default)]
pub struct XxHash32Partitioner;

impl Partitioner for XxHash32Partitioner {
    fn hash(&self, key: &[u8]) -> u32 {
        xxh32(key, 0)
    }

    fn name(&self) -> &'static str {
        "XxHash32Partitioner"
    }
}
