//! Response generation contract.

use async_trait::async_trait;
use recall_ai::{CompletionRequest, LlmClient, Message};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{MemoryError, Result};
use crate::template::render;

pub const RESPONSE_PROMPT: &str = include_str!("templates/response.md");

pub const MISSING_CODE_MEMORY: &str = "Code Memory is missing";
pub const MISSING_TOOL_MEMORY: &str = "Tool Memory is missing";
const MISSING_CURRENT_CONTEXT: &str = "No current dialogue context";

/// Everything handed to the generator at the end of a dialogue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryContext {
    pub dialogue_memory: String,
    /// `None` when no code store is configured.
    pub code_memory: Option<String>,
    /// `None` when no tool store is configured.
    pub tool_memory: Option<String>,
    /// Transcript of a session kept out of memory, if any.
    pub current_context: Option<String>,
    pub query: String,
}

impl MemoryContext {
    pub fn new(dialogue_memory: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            dialogue_memory: dialogue_memory.into(),
            code_memory: None,
            tool_memory: None,
            current_context: None,
            query: query.into(),
        }
    }

    pub fn code_memory_text(&self) -> &str {
        self.code_memory.as_deref().unwrap_or(MISSING_CODE_MEMORY)
    }

    pub fn tool_memory_text(&self) -> &str {
        self.tool_memory.as_deref().unwrap_or(MISSING_TOOL_MEMORY)
    }
}

/// Produces the final answer from assembled memory.
#[async_trait]
pub trait ResponseGenerator: Send + Sync {
    async fn generate_response(&self, context: &MemoryContext) -> Result<String>;
}

/// Generator that renders [`RESPONSE_PROMPT`] and returns the model's text.
pub struct LlmResponseGenerator {
    llm: Arc<dyn LlmClient>,
    template: String,
}

impl LlmResponseGenerator {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            llm,
            template: RESPONSE_PROMPT.to_string(),
        }
    }

    /// Use a custom template with the same placeholders.
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    pub fn render_prompt(&self, context: &MemoryContext) -> String {
        let fields = HashMap::from([
            ("dialogue_memory", context.dialogue_memory.as_str()),
            ("code_memory", context.code_memory_text()),
            ("tool_memory", context.tool_memory_text()),
            (
                "current_context",
                context
                    .current_context
                    .as_deref()
                    .unwrap_or(MISSING_CURRENT_CONTEXT),
            ),
            ("query", context.query.as_str()),
        ]);
        render(&self.template, &fields)
    }
}

#[async_trait]
impl ResponseGenerator for LlmResponseGenerator {
    async fn generate_response(&self, context: &MemoryContext) -> Result<String> {
        let request = CompletionRequest::new(vec![Message::user(self.render_prompt(context))]);
        let response = self.llm.complete(request).await?;
        response.content.ok_or_else(|| {
            MemoryError::Provider(recall_ai::AiError::Llm(
                "completion returned no content".to_string(),
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recall_ai::{MockLlmClient, MockStep};

    #[tokio::test]
    async fn test_missing_kinds_use_labels() {
        let llm = Arc::new(MockLlmClient::from_steps(
            "mock",
            vec![MockStep::text("You live in Lisbon.")],
        ));
        let generator = LlmResponseGenerator::new(llm.clone());
        let context = MemoryContext::new("The user lives in Lisbon.", "Where do I live?");

        let response = generator.generate_response(&context).await.unwrap();
        assert_eq!(response, "You live in Lisbon.");

        let prompt = &llm.requests()[0].messages[0].content;
        assert!(prompt.contains("Dialogue Memory:\nThe user lives in Lisbon."));
        assert!(prompt.contains("Code Memory:\nCode Memory is missing"));
        assert!(prompt.contains("Tool Memory:\nTool Memory is missing"));
        assert!(prompt.contains("User Query:\nWhere do I live?"));
    }

    #[test]
    fn test_present_kinds_are_rendered() {
        let generator = LlmResponseGenerator::new(Arc::new(MockLlmClient::new("mock")));
        let context = MemoryContext {
            code_memory: Some("fn main() {}".to_string()),
            tool_memory: Some(String::new()),
            current_context: Some("user: hello".to_string()),
            ..MemoryContext::new("", "q")
        };

        let prompt = generator.render_prompt(&context);
        assert!(prompt.contains("Code Memory:\nfn main() {}"));
        assert!(!prompt.contains(MISSING_TOOL_MEMORY));
        assert!(prompt.contains("Current Dialogue Context:\nuser: hello"));
    }

    #[tokio::test]
    async fn test_failure_is_provider_error() {
        let llm = Arc::new(MockLlmClient::from_steps("mock", vec![MockStep::error("boom")]));
        let err = LlmResponseGenerator::new(llm)
            .generate_response(&MemoryContext::new("", "q"))
            .await
            .unwrap_err();
        assert!(err.is_provider_failure());
    }
}
