//! Structured (JSON) completions.

use serde::de::DeserializeOwned;

use crate::error::{AiError, Result};
use crate::llm::client::{CompletionRequest, LlmClient};

/// Run a completion in JSON mode and deserialize the content into `T`.
pub async fn complete_json<T: DeserializeOwned>(
    llm: &dyn LlmClient,
    request: CompletionRequest,
) -> Result<T> {
    let response = llm.complete(request.with_json_output()).await?;
    let content = response.content.unwrap_or_default();
    parse_json_content(&content)
}

/// Parse model output as JSON, tolerating markdown fences and surrounding prose.
pub fn parse_json_content<T: DeserializeOwned>(content: &str) -> Result<T> {
    let trimmed = strip_code_fence(content.trim());
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Ok(value);
    }

    let object = match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => {
            return Err(AiError::InvalidFormat(format!(
                "expected a JSON object, got: {}",
                preview(trimmed)
            )));
        }
    };

    serde_json::from_str(object)
        .map_err(|e| AiError::InvalidFormat(format!("{e}: {}", preview(object))))
}

fn strip_code_fence(content: &str) -> &str {
    let Some(rest) = content.strip_prefix("```") else {
        return content;
    };
    // Drop the optional language tag on the opening fence.
    let rest = rest.split_once('\n').map(|(_, body)| body).unwrap_or(rest);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

fn preview(text: &str) -> String {
    const MAX: usize = 120;
    if text.chars().count() <= MAX {
        text.to_string()
    } else {
        format!("{}...", text.chars().take(MAX).collect::<String>())
    }
}
