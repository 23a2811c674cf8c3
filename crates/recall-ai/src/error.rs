//! Error types for provider calls

use thiserror::Error;

/// Provider error types
#[derive(Error, Debug)]
pub enum AiError {
    #[error("LLM error: {0}")]
    Llm(String),

    #[error("{provider} API error {status}: {message}")]
    LlmHttp {
        provider: String,
        status: u16,
        message: String,
        retry_after_secs: Option<u64>,
    },

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Invalid response format: {0}")]
    InvalidFormat(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AiError {
    /// Whether a transport-level retry may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            AiError::LlmHttp { status, .. } => *status == 429 || *status >= 500,
            AiError::Http(err) => err.is_timeout() || err.is_connect(),
            AiError::Llm(message) | AiError::Embedding(message) => {
                let lower = message.to_ascii_lowercase();
                lower.contains("rate limit") || lower.contains("timeout")
            }
            AiError::InvalidFormat(_) | AiError::Json(_) => false,
        }
    }

    /// Server-provided retry delay, if any.
    pub fn retry_after(&self) -> Option<u64> {
        match self {
            AiError::LlmHttp {
                retry_after_secs, ..
            } => *retry_after_secs,
            _ => None,
        }
    }
}

/// Result type alias for provider operations
pub type Result<T> = std::result::Result<T, AiError>;
