//! Embedding-backed fragment store with recency-weighted retrieval.
//!
//! Fragments are append-only. Row `i` of the [`FlatIndex`] always belongs to
//! fragment `i`: every insertion validates the whole batch before touching
//! either side, and nothing is mutated until the embedding call has returned.

mod index;
mod vector;

pub use index::FlatIndex;
pub use vector::{importance_weight, l2_normalize};

use recall_ai::EmbeddingProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::block::Block;
use crate::error::{MemoryError, Result};

/// Index of a session within a dialogue. Signed so invalid ids are representable.
pub type SessionId = i64;

/// Default number of results returned by [`MemoryStore::find_similar`].
pub const DEFAULT_TOP_K: usize = 5;

/// One stored memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryFragment {
    /// Rendered text that was embedded.
    pub embed_content: String,
    /// Payload returned on retrieval; the code body for code blocks.
    pub content: String,
    pub session_id: SessionId,
}

impl MemoryFragment {
    pub fn from_block(block: &Block, session_id: SessionId) -> Self {
        Self {
            embed_content: block.to_string(),
            content: block.payload(),
            session_id,
        }
    }
}

/// A retrieval hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredFragment {
    pub content: String,
    pub score: f32,
    pub session_id: SessionId,
}

/// Index metadata in a [`StoreSnapshot`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexSnapshot {
    pub row_count: usize,
    pub dimension: usize,
}

/// Diagnostic record of a store. There is no way back from it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreSnapshot {
    pub fragments: Vec<MemoryFragment>,
    pub max_session_id: SessionId,
    pub fragment_count: usize,
    pub initialized: bool,
    pub index: Option<IndexSnapshot>,
}

/// Vector-indexed memory over text fragments.
///
/// Not internally synchronized: reads may be shared once populated, but
/// [`add_memory`](Self::add_memory) takes `&mut self`.
pub struct MemoryStore {
    embeddings: Arc<dyn EmbeddingProvider>,
    max_session_id: SessionId,
    fragments: Vec<MemoryFragment>,
    index: Option<FlatIndex>,
}

impl MemoryStore {
    pub fn new(embeddings: Arc<dyn EmbeddingProvider>, max_session_id: SessionId) -> Self {
        Self {
            embeddings,
            max_session_id,
            fragments: Vec::new(),
            index: None,
        }
    }

    pub fn max_session_id(&self) -> SessionId {
        self.max_session_id
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn is_initialized(&self) -> bool {
        self.index.is_some()
    }

    pub fn fragments(&self) -> &[MemoryFragment] {
        &self.fragments
    }

    /// Embed `blocks` in one batch and append them as fragments of `session_id`.
    ///
    /// An empty input is a no-op. The first non-empty batch fixes the index
    /// width; a later batch of another width fails with
    /// [`MemoryError::DimensionMismatch`] and leaves the store untouched.
    pub async fn add_memory<'a, I>(&mut self, blocks: I, session_id: SessionId) -> Result<()>
    where
        I: IntoIterator<Item = &'a Block>,
    {
        let fragments: Vec<MemoryFragment> = blocks
            .into_iter()
            .map(|block| MemoryFragment::from_block(block, session_id))
            .collect();
        if fragments.is_empty() {
            return Ok(());
        }

        let texts: Vec<String> = fragments.iter().map(|f| f.embed_content.clone()).collect();
        let mut vectors = self.embeddings.embed_documents(&texts).await?;
        if vectors.len() != fragments.len() {
            return Err(MemoryError::EmbeddingCountMismatch {
                expected: fragments.len(),
                actual: vectors.len(),
            });
        }

        let weight = importance_weight(session_id, self.max_session_id);
        for vector in vectors.iter_mut() {
            l2_normalize(vector);
            for value in vector.iter_mut() {
                *value *= weight;
            }
        }

        match &mut self.index {
            Some(index) => index.add(&vectors)?,
            None => {
                let mut index = FlatIndex::new(vectors[0].len());
                index.add(&vectors)?;
                self.index = Some(index);
            }
        }

        debug!(
            session_id,
            added = fragments.len(),
            total = self.fragments.len() + fragments.len(),
            weight,
            "Added memory fragments"
        );
        self.fragments.extend(fragments);
        Ok(())
    }

    /// Scored top-`top_k` fragments for `query`, best first.
    pub async fn search(&self, query: &str, top_k: usize) -> Result<Vec<ScoredFragment>> {
        if self.fragments.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }
        let index = self.index.as_ref().ok_or(MemoryError::UninitializedIndex)?;

        let mut query_vector = self.embeddings.embed_query(query).await?;
        l2_normalize(&mut query_vector);

        let k = top_k.min(self.fragments.len());
        let hits = index.search(&query_vector, k)?;
        debug!(top_k = k, hits = hits.len(), "Searched memory store");

        Ok(hits
            .into_iter()
            .filter_map(|(row, score)| {
                self.fragments.get(row).map(|fragment| ScoredFragment {
                    content: fragment.content.clone(),
                    score,
                    session_id: fragment.session_id,
                })
            })
            .collect())
    }

    /// Contents of the `top_k` fragments most similar to `query`, best first.
    ///
    /// An empty store yields an empty list without calling the embedder.
    pub async fn find_similar(&self, query: &str, top_k: usize) -> Result<Vec<String>> {
        Ok(self
            .search(query, top_k)
            .await?
            .into_iter()
            .map(|hit| hit.content)
            .collect())
    }

    /// Contents of every fragment of `session_id`, in insertion order.
    pub fn get_session_memory(&self, session_id: SessionId) -> Result<Vec<String>> {
        if !(0..self.max_session_id).contains(&session_id) {
            return Err(MemoryError::SessionOutOfRange {
                session_id,
                max_session_id: self.max_session_id,
            });
        }
        Ok(self
            .fragments
            .iter()
            .filter(|f| f.session_id == session_id)
            .map(|f| f.content.clone())
            .collect())
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            fragments: self.fragments.clone(),
            max_session_id: self.max_session_id,
            fragment_count: self.fragments.len(),
            initialized: self.index.is_some(),
            index: self.index.as_ref().map(|index| IndexSnapshot {
                row_count: index.row_count(),
                dimension: index.dimension(),
            }),
        }
    }
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore")
            .field("embedding_model", &self.embeddings.model_name())
            .field("max_session_id", &self.max_session_id)
            .field("fragments", &self.fragments.len())
            .field("index", &self.index.as_ref().map(FlatIndex::row_count))
            .finish()
    }
}
