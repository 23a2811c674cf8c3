//! Recall AI - provider collaborators for the dialogue memory
//!
//! This crate provides:
//! - LLM client abstraction with an OpenAI-compatible implementation
//! - Embedding provider abstraction with an OpenAI-compatible implementation
//! - Deterministic mock providers for tests and offline runs
//! - Token usage tracking and structured (JSON) completions

pub mod embedding;
pub mod error;
mod http_client;
pub mod llm;

// Re-export commonly used types
pub use embedding::{
    CachedEmbedding, EmbeddingCache, EmbeddingConfig, EmbeddingProvider, HashEmbedding,
    OpenAIEmbedding,
};
pub use error::{AiError, Result};
pub use llm::{
    CompletionRequest, CompletionResponse, FinishReason, LlmClient, LlmRetryConfig, Message,
    MockLlmClient, MockStep, OpenAIClient, Role, TokenUsage, TrackedLlm, UsageTotals,
};
