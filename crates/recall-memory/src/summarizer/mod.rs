//! Summarizers that turn session transcripts into memory.
//!
//! Both strategies ask the model for the same JSON shape:
//! `{"summary_messages": [{"role": "...", "content": "..."}]}`.

mod recursive;
mod session;

pub use recursive::RecursiveSummarizer;
pub use session::SessionSummarizer;

use recall_ai::llm::structured::complete_json;
use recall_ai::{CompletionRequest, LlmClient, Message};
use serde::Deserialize;

use crate::block::Block;
use crate::error::Result;

/// Role assigned to entries the model returned without one.
const DEFAULT_ROLE: &str = "assistant";

#[derive(Debug, Deserialize)]
pub(crate) struct SummaryPayload {
    #[serde(default)]
    pub summary_messages: Vec<SummaryMessage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SummaryMessage {
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default)]
    pub content: String,
}

fn default_role() -> String {
    DEFAULT_ROLE.to_string()
}

impl SummaryPayload {
    /// Entries with non-blank content, in model order.
    pub fn into_blocks(self) -> Vec<Block> {
        self.summary_messages
            .into_iter()
            .filter(|m| !m.content.trim().is_empty())
            .map(|m| Block::text(m.role, m.content.trim()))
            .collect()
    }
}

/// Send a rendered prompt in JSON mode and decode the summary payload.
pub(crate) async fn request_summary(
    llm: &dyn LlmClient,
    prompt: String,
) -> Result<SummaryPayload> {
    let request = CompletionRequest::new(vec![Message::user(prompt)]);
    Ok(complete_json(llm, request).await?)
}

/// The summarizer driving a dialogue's text memory.
pub enum Summarizer {
    Recursive(RecursiveSummarizer),
    SessionIndexed(SessionSummarizer),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_drops_blank_entries_and_defaults_role() {
        let payload: SummaryPayload = serde_json::from_str(
            r#"{"summary_messages": [
                {"role": "user", "content": " The user lives in Oslo. "},
                {"content": "The assistant is patient."},
                {"role": "user", "content": "   "}
            ]}"#,
        )
        .unwrap();

        let blocks = payload.into_blocks();
        assert_eq!(
            blocks,
            vec![
                Block::text("user", "The user lives in Oslo."),
                Block::text("assistant", "The assistant is patient."),
            ]
        );
    }

    #[test]
    fn test_missing_list_is_empty() {
        let payload: SummaryPayload = serde_json::from_str("{}").unwrap();
        assert!(payload.into_blocks().is_empty());
    }
}
