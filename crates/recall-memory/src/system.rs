//! Dialogue system facade.

use recall_ai::{EmbeddingProvider, LlmClient, TrackedLlm, UsageTotals};
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::{MemoryConfig, StrategyKind};
use crate::error::Result;
use crate::response::{LlmResponseGenerator, ResponseGenerator};
use crate::session::Session;
use crate::store::{MemoryStore, StoreSnapshot};
use crate::summarizer::{RecursiveSummarizer, SessionSummarizer, Summarizer};
use crate::workflow::{DialogueState, DialogueWorkflow, RecursiveMemory, StrategyState};

/// Long-lived memory of a dialogue system.
///
/// Owned by the caller and passed into every `process_dialogue` call, so
/// stores accumulate across queries for as long as the caller keeps it.
#[derive(Debug)]
pub struct DialogueMemory {
    pub(crate) text: Option<MemoryStore>,
    pub(crate) code: Option<MemoryStore>,
    pub(crate) tool: Option<MemoryStore>,
}

/// Snapshots of every configured store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemorySnapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<StoreSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<StoreSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool: Option<StoreSnapshot>,
}

impl DialogueMemory {
    /// Stores for `config`: a text store for the memory-bank strategy, plus
    /// code and tool stores when enabled.
    pub fn new(embeddings: Arc<dyn EmbeddingProvider>, config: &MemoryConfig) -> Self {
        let store = || MemoryStore::new(embeddings.clone(), config.max_session_id);
        Self {
            text: (config.strategy == StrategyKind::MemoryBank).then(store),
            code: config.embed_code.then(store),
            tool: config.embed_tool.then(store),
        }
    }

    pub fn text_store(&self) -> Option<&MemoryStore> {
        self.text.as_ref()
    }

    pub fn code_store(&self) -> Option<&MemoryStore> {
        self.code.as_ref()
    }

    pub fn tool_store(&self) -> Option<&MemoryStore> {
        self.tool.as_ref()
    }

    pub fn snapshot(&self) -> MemorySnapshot {
        MemorySnapshot {
            text: self.text.as_ref().map(MemoryStore::snapshot),
            code: self.code.as_ref().map(MemoryStore::snapshot),
            tool: self.tool.as_ref().map(MemoryStore::snapshot),
        }
    }
}

/// Facade wiring the configured summarizer, response generator and stores.
pub struct DialogueSystem {
    config: MemoryConfig,
    llm: Arc<TrackedLlm>,
    embeddings: Arc<dyn EmbeddingProvider>,
    summarizer: Summarizer,
    generator: Box<dyn ResponseGenerator>,
}

impl DialogueSystem {
    pub fn new(
        config: MemoryConfig,
        llm: Arc<dyn LlmClient>,
        embeddings: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self> {
        config.validate()?;

        let llm = Arc::new(TrackedLlm::new(llm));
        let shared: Arc<dyn LlmClient> = llm.clone();
        let summarizer = match config.strategy {
            StrategyKind::Recursive => Summarizer::Recursive(
                RecursiveSummarizer::new(shared.clone()).with_bound(config.summary_bound),
            ),
            StrategyKind::MemoryBank => Summarizer::SessionIndexed(
                SessionSummarizer::new(shared.clone())
                    .with_max_fragments(config.max_session_fragments),
            ),
        };
        let generator = Box::new(LlmResponseGenerator::new(shared));

        Ok(Self {
            config,
            llm,
            embeddings,
            summarizer,
            generator,
        })
    }

    /// Replace the response generator.
    pub fn with_response_generator(mut self, generator: impl ResponseGenerator + 'static) -> Self {
        self.generator = Box::new(generator);
        self
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    /// Fresh, empty memory matching this system's configuration.
    pub fn new_memory(&self) -> DialogueMemory {
        DialogueMemory::new(self.embeddings.clone(), &self.config)
    }

    /// Fold `sessions` into `memory` and answer `query`.
    pub async fn process_dialogue(
        &self,
        memory: &mut DialogueMemory,
        sessions: Vec<Session>,
        query: impl Into<String>,
    ) -> Result<DialogueState> {
        self.run(memory, sessions, query.into(), None).await
    }

    /// Like [`process_dialogue`](Self::process_dialogue), stopping before the
    /// next session once `cancel` fires.
    pub async fn process_dialogue_with_cancel(
        &self,
        memory: &mut DialogueMemory,
        sessions: Vec<Session>,
        query: impl Into<String>,
        cancel: &CancellationToken,
    ) -> Result<DialogueState> {
        self.run(memory, sessions, query.into(), Some(cancel)).await
    }

    /// Token usage of every completion made through this system.
    pub fn usage(&self) -> UsageTotals {
        self.llm.totals()
    }

    async fn run(
        &self,
        memory: &mut DialogueMemory,
        sessions: Vec<Session>,
        query: String,
        cancel: Option<&CancellationToken>,
    ) -> Result<DialogueState> {
        let strategy = match self.summarizer {
            Summarizer::Recursive(_) => StrategyState::Recursive(RecursiveMemory::new()),
            Summarizer::SessionIndexed(_) => StrategyState::SessionIndexed,
        };
        info!(
            strategy = self.config.strategy.as_str(),
            sessions = sessions.len(),
            "Processing dialogue"
        );

        let state = DialogueState::new(sessions, query, strategy);
        let workflow = DialogueWorkflow::new(
            &self.summarizer,
            self.generator.as_ref(),
            self.config.final_session,
            self.config.top_k,
        );
        workflow.run(memory, state, cancel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recall_ai::{HashEmbedding, MockLlmClient};

    #[test]
    fn test_memory_follows_config() {
        let embeddings: Arc<dyn EmbeddingProvider> = Arc::new(HashEmbedding::new(16));

        let memory = DialogueMemory::new(embeddings.clone(), &MemoryConfig::default());
        assert!(memory.text_store().is_some());
        assert!(memory.code_store().is_none());
        assert!(memory.tool_store().is_none());

        let config = MemoryConfig::default()
            .with_strategy(StrategyKind::Recursive)
            .with_code_memory(true)
            .with_tool_memory(true);
        let memory = DialogueMemory::new(embeddings, &config);
        assert!(memory.text_store().is_none());
        assert_eq!(memory.code_store().map(MemoryStore::max_session_id), Some(3));
        assert!(memory.tool_store().is_some());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = MemoryConfig {
            top_k: 0,
            ..Default::default()
        };
        let result = DialogueSystem::new(
            config,
            Arc::new(MockLlmClient::new("mock")),
            Arc::new(HashEmbedding::new(16)),
        );
        assert!(result.is_err());
    }
}
