//! Embedding providers and utilities.

mod cache;
mod hash;
mod openai;
mod provider;

pub use cache::{CachedEmbedding, EmbeddingCache};
pub use hash::HashEmbedding;
pub use openai::OpenAIEmbedding;
pub use provider::{EmbeddingConfig, EmbeddingProvider};
