//! OpenAI-compatible chat completions provider

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{AiError, Result};
use crate::http_client::build_http_client;
use crate::llm::client::{
    CompletionRequest, CompletionResponse, FinishReason, LlmClient, ResponseFormat, TokenUsage,
};
use crate::llm::pricing::calculate_cost;
use crate::llm::retry::{LlmRetryConfig, response_to_error};

pub const DEFAULT_CHAT_MODEL: &str = "gpt-4.1-mini";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI client
pub struct OpenAIClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    temperature: Option<f32>,
    retry_config: LlmRetryConfig,
}

impl OpenAIClient {
    /// Create a new OpenAI client
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: build_http_client(None),
            api_key: api_key.into(),
            model: DEFAULT_CHAT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: Some(0.0),
            retry_config: LlmRetryConfig::default(),
        }
    }

    /// Set the model to use
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set custom base URL (for API-compatible services)
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Temperature applied when a request does not set its own
    pub fn with_default_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_retry_config(mut self, config: LlmRetryConfig) -> Self {
        self.retry_config = config;
        self
    }
}

#[derive(Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<OpenAIResponseFormat>,
}

#[derive(Serialize)]
struct OpenAIMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct OpenAIResponseFormat {
    r#type: &'static str,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize, Debug)]
struct OpenAIUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[async_trait]
impl LlmClient for OpenAIClient {
    fn provider(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let body = OpenAIRequest {
            model: self.model.clone(),
            messages: request
                .messages
                .into_iter()
                .map(|m| OpenAIMessage {
                    role: m.role.as_str(),
                    content: m.content,
                })
                .collect(),
            temperature: request.temperature.or(self.temperature),
            max_tokens: request.max_tokens,
            response_format: match request.response_format {
                ResponseFormat::Text => None,
                ResponseFormat::JsonObject => Some(OpenAIResponseFormat {
                    r#type: "json_object",
                }),
            },
        };

        let mut last_error = None;

        for attempt in 0..=self.retry_config.max_retries {
            let response = match self
                .client
                .post(format!("{}/chat/completions", self.base_url))
                .header("Authorization", format!("Bearer {}", self.api_key))
                .header("Content-Type", "application/json")
                .json(&body)
                .send()
                .await
            {
                Ok(resp) => resp,
                Err(e) => {
                    let error = AiError::Http(e);
                    if !error.is_retryable() || attempt == self.retry_config.max_retries {
                        return Err(error);
                    }
                    let delay = self.retry_config.delay_for(attempt + 1, None);
                    tracing::warn!(
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis(),
                        "Retrying OpenAI request after connection error"
                    );
                    tokio::time::sleep(delay).await;
                    last_error = Some(error);
                    continue;
                }
            };

            if response.status().is_success() {
                let data: OpenAIResponse = response.json().await?;
                let choice = data
                    .choices
                    .into_iter()
                    .next()
                    .ok_or_else(|| AiError::Llm("No response from OpenAI".to_string()))?;

                let finish_reason = match choice.finish_reason.as_deref() {
                    Some("stop") | None => FinishReason::Stop,
                    Some("length") => FinishReason::MaxTokens,
                    _ => FinishReason::Error,
                };

                let usage = data.usage.map(|u| TokenUsage {
                    prompt_tokens: u.prompt_tokens,
                    completion_tokens: u.completion_tokens,
                    total_tokens: u.total_tokens,
                    cost_usd: calculate_cost(&self.model, u.prompt_tokens, u.completion_tokens),
                });

                return Ok(CompletionResponse {
                    content: choice.message.content,
                    finish_reason,
                    usage,
                });
            }

            let error = response_to_error(response, "OpenAI").await;
            if !error.is_retryable() || attempt == self.retry_config.max_retries {
                return Err(error);
            }

            let delay = self
                .retry_config
                .delay_for(attempt + 1, error.retry_after());
            tracing::warn!(
                attempt = attempt + 1,
                delay_ms = delay.as_millis(),
                "Retrying OpenAI request"
            );
            tokio::time::sleep(delay).await;
            last_error = Some(error);
        }

        Err(last_error
            .unwrap_or_else(|| AiError::Llm("OpenAI request failed after retries".to_string())))
    }
}
