use recall_ai::LlmClient;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use super::request_summary;
use crate::block::Block;
use crate::error::Result;
use crate::store::SessionId;
use crate::template::render;

pub const SESSION_SUMMARY_PROMPT: &str = include_str!("../templates/session_summary.md");

/// Default cap on fragments extracted from one session.
pub const DEFAULT_MAX_FRAGMENTS: usize = 12;

/// Extracts standalone memory fragments from a single session.
pub struct SessionSummarizer {
    llm: Arc<dyn LlmClient>,
    max_fragments: usize,
}

impl SessionSummarizer {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            llm,
            max_fragments: DEFAULT_MAX_FRAGMENTS,
        }
    }

    pub fn with_max_fragments(mut self, max_fragments: usize) -> Self {
        self.max_fragments = max_fragments.max(1);
        self
    }

    pub fn max_fragments(&self) -> usize {
        self.max_fragments
    }

    /// Fragments for `session_id`, each retrievable on its own.
    pub async fn summarize(
        &self,
        session_messages: &str,
        session_id: SessionId,
    ) -> Result<Vec<Block>> {
        let session_id_text = session_id.to_string();
        let max_fragments_text = self.max_fragments.to_string();
        let fields = HashMap::from([
            ("session_messages", session_messages),
            ("session_id", session_id_text.as_str()),
            ("max_fragments", max_fragments_text.as_str()),
        ]);
        let prompt = render(SESSION_SUMMARY_PROMPT, &fields);

        let payload = request_summary(self.llm.as_ref(), prompt).await?;
        let mut fragments = payload.into_blocks();
        if fragments.len() > self.max_fragments {
            debug!(
                session_id,
                returned = fragments.len(),
                kept = self.max_fragments,
                "Dropping fragments past the cap"
            );
            fragments.truncate(self.max_fragments);
        }
        Ok(fragments)
    }
}
