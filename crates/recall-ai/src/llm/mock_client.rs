//! Deterministic mock LLM client for tests and offline runs.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{AiError, Result};

use super::{CompletionRequest, CompletionResponse, FinishReason, LlmClient, Role, TokenUsage};

/// What a scripted step answers with.
#[derive(Debug, Clone)]
pub enum MockStepKind {
    Text(String),
    Error(String),
}

/// Scripted completion step.
#[derive(Debug, Clone)]
pub struct MockStep {
    pub kind: MockStepKind,
}

impl MockStep {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            kind: MockStepKind::Text(content.into()),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: MockStepKind::Error(message.into()),
        }
    }
}

/// Replays scripted answers in order, then echoes the last user message.
///
/// Every request is recorded so tests can assert on the rendered prompts.
#[derive(Debug, Clone, Default)]
pub struct MockLlmClient {
    model: String,
    script: Arc<Mutex<VecDeque<MockStep>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockLlmClient {
    pub fn new(model: impl Into<String>) -> Self {
        Self::from_steps(model, Vec::new())
    }

    pub fn from_steps(model: impl Into<String>, steps: Vec<MockStep>) -> Self {
        Self {
            model: model.into(),
            script: Arc::new(Mutex::new(VecDeque::from(steps))),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn push_step(&self, step: MockStep) {
        self.script.lock().push_back(step);
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().clone()
    }

    /// Number of scripted steps not yet consumed.
    pub fn remaining_steps(&self) -> usize {
        self.script.lock().len()
    }

    /// One token per byte of output and a single prompt token.
    fn answer(content: String) -> CompletionResponse {
        let completion_tokens = content.len() as u32;
        CompletionResponse {
            usage: Some(TokenUsage {
                prompt_tokens: 1,
                completion_tokens,
                total_tokens: completion_tokens + 1,
                cost_usd: Some(0.0),
            }),
            content: Some(content),
            finish_reason: FinishReason::Stop,
        }
    }

    fn echo(request: &CompletionRequest) -> CompletionResponse {
        let last_user = request.messages.iter().rev().find(|m| m.role == Role::User);
        Self::answer(match last_user {
            Some(message) => format!("echo: {}", message.content),
            None => "echo".to_string(),
        })
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    fn provider(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        self.requests.lock().push(request.clone());

        let next = self.script.lock().pop_front();
        match next.map(|step| step.kind) {
            Some(MockStepKind::Text(content)) => Ok(Self::answer(content)),
            Some(MockStepKind::Error(message)) => Err(AiError::Llm(message)),
            None => Ok(Self::echo(&request)),
        }
    }
}
