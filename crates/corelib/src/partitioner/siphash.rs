//! SipHash partitioner implementation.

use crate::partitioner::traits::Partitioner;
use siphasher::sip::SipHasher13;
use std::hash::Hasher;

/// SipHash-1-3 with zero keys, folded to 32 bits.
#[derive(Clone, Copy, Debug, Default)]
pub struct SipHashPartitioner;

impl Partitioner for SipHashPartitioner {
    fn hash(&self, key: &[u8]) -> u32 {
        let mut hasher = SipHasher13::new();
        hasher.write(key);
        let h = hasher.finish();
        (h ^ (h >> 32)) as u32
    }

    fn name(&self) -> &'static str {
        "SipHashPartitioner"
    }
}
