//! Error types for node transport and migration.

/// Errors raised while talking to node stores or coordinating migrations.
#[derive(Debug, thiserror::Error)]
pub enum StreamingError {
    /// The node address could not be turned into a request URL.
    #[error("invalid node address: {0}")]
    InvalidAddress(String),

    /// The request did not complete within the configured timeout.
    #[error("request to {address} timed out")]
    Timeout { address: String },

    /// Connection or protocol failure below HTTP status level.
    #[error("transport error talking to {address}: {source}")]
    Transport {
        address: String,
        #[source]
        source: reqwest::Error,
    },

    /// The node answered with an unexpected status code.
    #[error("{address} answered with status {status}")]
    Status { address: String, status: u16 },

    /// A response body could not be decoded.
    #[error("malformed payload from {address}: {source}")]
    Decode {
        address: String,
        #[source]
        source: serde_json::Error,
    },

    /// The ring has no entries, so no node owns the key.
    #[error("no nodes available")]
    NoNodes,

    /// The migration queue has been shut down.
    #[error("migration queue is closed")]
    QueueClosed,
}

impl StreamingError {
    pub(crate) fn transport(address: &str, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            StreamingError::Timeout {
                address: address.to_string(),
            }
        } else {
            StreamingError::Transport {
                address: address.to_string(),
                source,
            }
        }
    }
}
