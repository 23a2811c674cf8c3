use recall_ai::LlmClient;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use super::request_summary;
use crate::config::SummaryBound;
use crate::error::Result;
use crate::template::render;

pub const MEMORY_UPDATE_PROMPT: &str = include_str!("../templates/recursive_update.md");

/// Folds each new session into the previous summary.
///
/// The previous summary passed in is always the entire prior fold. Without a
/// [`SummaryBound`] the fold grows with the dialogue.
pub struct RecursiveSummarizer {
    llm: Arc<dyn LlmClient>,
    bound: SummaryBound,
}

impl RecursiveSummarizer {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            llm,
            bound: SummaryBound::Unbounded,
        }
    }

    pub fn with_bound(mut self, bound: SummaryBound) -> Self {
        self.bound = bound;
        self
    }

    pub fn bound(&self) -> SummaryBound {
        self.bound
    }

    pub async fn summarize(
        &self,
        previous_memory: &str,
        dialogue_context: &str,
    ) -> Result<Vec<String>> {
        let fields = HashMap::from([
            ("previous_memory", previous_memory),
            ("dialogue_context", dialogue_context),
        ]);
        let prompt = render(MEMORY_UPDATE_PROMPT, &fields);

        let payload = request_summary(self.llm.as_ref(), prompt).await?;
        let fragments: Vec<String> = payload
            .into_blocks()
            .into_iter()
            .map(|block| block.content().to_string())
            .collect();
        let fragments = self.bound.apply(fragments);

        debug!(
            fragments = fragments.len(),
            previous_len = previous_memory.len(),
            "Folded session into summary"
        );
        Ok(fragments)
    }
}
