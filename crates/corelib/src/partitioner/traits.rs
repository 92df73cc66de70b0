//! Core partitioner trait definitions.

/// A partitioner converts keys into bounded integer hashes.
///
/// Partitioners are stateless and thread-safe, allowing concurrent
/// hashing without synchronization overhead. The ring and every node store
/// must agree on the partitioner, otherwise routing and slot placement
/// disagree about where a key lives.
pub trait Partitioner: Clone + Default + Send + Sync + 'static {
    /// Hashes raw bytes to a 32-bit value.
    fn hash(&self, key: &[u8]) -> u32;

    /// Hashes `key` and reduces it modulo `modulus`.
    ///
    /// # Panics
    ///
    /// Panics if `modulus` is zero. Callers validate sizes at construction.
    fn bucket(&self, key: &str, modulus: u32) -> u32 {
        self.hash(key.as_bytes()) % modulus
    }

    /// Returns the name of this partitioner.
    fn name(&self) -> &'static str;
}
