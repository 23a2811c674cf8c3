//! Error types for the dialogue memory

use recall_ai::AiError;
use thiserror::Error;

use crate::store::SessionId;

/// Dialogue memory error types
#[derive(Error, Debug)]
pub enum MemoryError {
    /// Any embedding or generation call failure. Never retried by the workflow.
    #[error("API request failed: {0}")]
    Provider(#[from] AiError),

    #[error("session id {session_id} is outside 0..{max_session_id}")]
    SessionOutOfRange {
        session_id: SessionId,
        max_session_id: SessionId,
    },

    #[error("vector index has not been initialized")]
    UninitializedIndex,

    #[error("response has not been generated yet")]
    ResponseNotReady,

    #[error("embedding dimension mismatch: index has {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("embedding provider returned {actual} vectors for {expected} inputs")]
    EmbeddingCountMismatch { expected: usize, actual: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("dialogue processing was cancelled before session {next_session}")]
    Cancelled { next_session: usize },
}

impl MemoryError {
    /// Provider failures are the only kind a caller may sensibly retry.
    pub fn is_provider_failure(&self) -> bool {
        matches!(self, MemoryError::Provider(_))
    }
}

/// Result type alias for memory operations
pub type Result<T> = std::result::Result<T, MemoryError>;
