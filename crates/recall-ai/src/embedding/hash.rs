use async_trait::async_trait;

use super::provider::EmbeddingProvider;
use crate::error::Result;

/// Deterministic offline embedder.
///
/// Lowercased word tokens are feature-hashed into a fixed number of buckets,
/// so identical texts always map to identical vectors and texts sharing words
/// have positive inner product. Useful for tests and for running without a
/// network provider; it carries no semantic knowledge.
#[derive(Debug, Clone)]
pub struct HashEmbedding {
    dimension: usize,
    model: String,
}

impl HashEmbedding {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
            model: format!("hash-{}", dimension.max(1)),
        }
    }

    /// Embed synchronously; the async trait methods delegate here.
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|token| !token.is_empty())
        {
            let bucket = (fnv1a(&token.to_lowercase()) % self.dimension as u64) as usize;
            vector[bucket] += 1.0;
        }
        vector
    }
}

impl Default for HashEmbedding {
    fn default() -> Self {
        Self::new(256)
    }
}

fn fnv1a(value: &str) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    value.bytes().fold(OFFSET, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(PRIME)
    })
}

#[async_trait]
impl EmbeddingProvider for HashEmbedding {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed_text(text)).collect())
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_text(text))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
