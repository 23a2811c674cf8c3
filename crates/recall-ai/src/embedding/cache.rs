use async_trait::async_trait;
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

use super::provider::EmbeddingProvider;
use crate::error::{AiError, Result};

/// In-memory cache for embeddings to avoid redundant API calls
pub struct EmbeddingCache {
    cache: RwLock<HashMap<String, Vec<f32>>>,
    max_entries: usize,
}

impl EmbeddingCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
            max_entries: max_entries.max(1),
        }
    }

    fn cache_key(text: &str, model: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(model.as_bytes());
        hasher.update(b":");
        hasher.update(text.as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn get(&self, text: &str, model: &str) -> Option<Vec<f32>> {
        let key = Self::cache_key(text, model);
        self.cache.read().get(&key).cloned()
    }

    pub fn put(&self, text: &str, model: &str, embedding: Vec<f32>) {
        let key = Self::cache_key(text, model);
        let mut cache = self.cache.write();
        if cache.len() >= self.max_entries {
            let keys_to_remove: Vec<_> = cache
                .keys()
                .take((self.max_entries / 2).max(1))
                .cloned()
                .collect();
            for k in keys_to_remove {
                cache.remove(&k);
            }
        }
        cache.insert(key, embedding);
    }

    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Embedding provider decorator that serves repeated texts from an [`EmbeddingCache`].
pub struct CachedEmbedding<P> {
    inner: P,
    cache: EmbeddingCache,
}

impl<P: EmbeddingProvider> CachedEmbedding<P> {
    pub fn new(inner: P, max_entries: usize) -> Self {
        Self {
            inner,
            cache: EmbeddingCache::new(max_entries),
        }
    }

    pub fn cache(&self) -> &EmbeddingCache {
        &self.cache
    }
}

#[async_trait]
impl<P: EmbeddingProvider> EmbeddingProvider for CachedEmbedding<P> {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let model = self.inner.model_name();
        let mut resolved: Vec<Option<Vec<f32>>> =
            texts.iter().map(|text| self.cache.get(text, model)).collect();

        let missing: Vec<usize> = resolved
            .iter()
            .enumerate()
            .filter_map(|(i, hit)| hit.is_none().then_some(i))
            .collect();

        if !missing.is_empty() {
            let pending: Vec<String> = missing.iter().map(|&i| texts[i].clone()).collect();
            let fresh = self.inner.embed_documents(&pending).await?;
            if fresh.len() != pending.len() {
                return Err(AiError::Embedding(format!(
                    "expected {} embeddings, got {}",
                    pending.len(),
                    fresh.len()
                )));
            }
            for (i, vector) in missing.into_iter().zip(fresh) {
                self.cache.put(&texts[i], model, vector.clone());
                resolved[i] = Some(vector);
            }
        }

        Ok(resolved.into_iter().flatten().collect())
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let model = self.inner.model_name();
        if let Some(hit) = self.cache.get(text, model) {
            return Ok(hit);
        }
        let vector = self.inner.embed_query(text).await?;
        self.cache.put(text, model, vector.clone());
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}
