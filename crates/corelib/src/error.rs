//! Error types for the core library.

/// Result type alias for the core library.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the core library.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Ring size must be positive; positions are computed modulo it.
    #[error("invalid ring size: {0}")]
    InvalidRingSize(u32),

    /// Slot count must be positive; slot indices are computed modulo it.
    #[error("invalid store capacity: {0}")]
    InvalidCapacity(usize),

    /// The empty key marks an empty slot and cannot be stored.
    #[error("key must not be empty")]
    EmptyKey,
}
