//! Deterministic local LLM used by `--offline`.
//!
//! It never calls a model. Summary requests are answered extractively from
//! the transcript sections of the prompt; response requests echo the
//! retrieved memory back.

use async_trait::async_trait;
use recall_ai::llm::ResponseFormat;
use recall_ai::{CompletionRequest, CompletionResponse, FinishReason, LlmClient, Role, TokenUsage};
use serde_json::json;

const PREVIOUS_MEMORY: &str = "Previous Memory:\n";
const DIALOGUE_CONTEXT: &str = "Dialogue Context:\n";
const SESSION_MESSAGES: &str = "Session Messages:\n";
const DIALOGUE_MEMORY: &str = "Dialogue Memory:\n";
const USER_QUERY: &str = "User Query:\n";

#[derive(Debug, Default, Clone)]
pub struct OfflineLlm;

impl OfflineLlm {
    fn summarize(prompt: &str) -> String {
        // Session summaries keep one fragment per transcript line; folds
        // carry every previous line forward verbatim.
        let entries: Vec<(&str, &str)> = match section(prompt, SESSION_MESSAGES) {
            Some(transcript) => transcript.lines().map(split_role).collect(),
            None => [PREVIOUS_MEMORY, DIALOGUE_CONTEXT]
                .into_iter()
                .filter_map(|marker| section(prompt, marker))
                .flat_map(str::lines)
                .map(|line| (split_role(line).0, line))
                .collect(),
        };

        let messages: Vec<_> = entries
            .into_iter()
            .filter(|(_, content)| !content.trim().is_empty())
            .map(|(role, content)| json!({"role": role, "content": content.trim()}))
            .collect();
        json!({ "summary_messages": messages }).to_string()
    }

    fn respond(prompt: &str) -> String {
        let query = section(prompt, USER_QUERY).unwrap_or_default();
        let memory = section(prompt, DIALOGUE_MEMORY).unwrap_or_default();
        if memory.trim().is_empty() {
            format!("[offline] No memory relevant to \"{query}\".")
        } else {
            format!("[offline] Memory relevant to \"{query}\":\n{memory}")
        }
    }
}

/// `("user", "hi")` for `"user: hi"`; unknown speakers count as the assistant.
fn split_role(line: &str) -> (&str, &str) {
    match line.trim().split_once(": ") {
        Some((role @ ("user" | "assistant"), content)) => (role, content),
        _ => ("assistant", line.trim()),
    }
}

/// Text after the last `marker`, up to the next blank line.
fn section<'a>(prompt: &'a str, marker: &str) -> Option<&'a str> {
    let start = prompt.rfind(marker)? + marker.len();
    let rest = &prompt[start..];
    let end = rest.find("\n\n").unwrap_or(rest.len());
    Some(rest[..end].trim_end())
}

#[async_trait]
impl LlmClient for OfflineLlm {
    fn provider(&self) -> &str {
        "offline"
    }

    fn model(&self) -> &str {
        "extractive"
    }

    async fn complete(&self, request: CompletionRequest) -> recall_ai::Result<CompletionResponse> {
        let prompt = request
            .messages
            .iter()
            .rev()
            .find(|message| message.role == Role::User)
            .map(|message| message.content.as_str())
            .unwrap_or_default();

        let content = match request.response_format {
            ResponseFormat::JsonObject => Self::summarize(prompt),
            ResponseFormat::Text => Self::respond(prompt),
        };

        Ok(CompletionResponse {
            content: Some(content),
            finish_reason: FinishReason::Stop,
            usage: Some(TokenUsage::default()),
        })
    }
}
