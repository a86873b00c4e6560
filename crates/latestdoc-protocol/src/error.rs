//! Protocol error types.

use thiserror::Error;

pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Framing and transport failures. Application-level errors travel as
/// [`crate::Response::Error`] instead.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("frame of {size} bytes exceeds the {max}-byte limit")]
    MessageTooLarge { size: u32, max: u32 },

    #[error("invalid JSON payload: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("stream I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The peer stopped sending partway through a frame.
    #[error("truncated frame: expected {expected} bytes, got {received}")]
    IncompleteMessage { expected: usize, received: usize },

    #[error("zero-length frame")]
    EmptyMessage,

    #[error("timed out while trying to {operation}")]
    Timeout { operation: String },
}

impl ProtocolError {
    pub fn timeout(operation: impl Into<String>) -> Self {
        Self::Timeout {
            operation: operation.into(),
        }
    }
}
