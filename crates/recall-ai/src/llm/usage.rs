//! Token usage accounting wrapper

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;

use crate::error::Result;
use crate::llm::client::{CompletionRequest, CompletionResponse, LlmClient, TokenUsage};

/// Accumulated usage across every call made through a [`TrackedLlm`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UsageTotals {
    pub requests: u64,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_cost_usd: f64,
}

impl UsageTotals {
    fn record(&mut self, usage: Option<&TokenUsage>) {
        self.requests += 1;
        if let Some(usage) = usage {
            self.prompt_tokens += u64::from(usage.prompt_tokens);
            self.completion_tokens += u64::from(usage.completion_tokens);
            self.total_cost_usd += usage.cost_usd.unwrap_or(0.0);
        }
    }

    pub fn total_tokens(&self) -> u64 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// LLM wrapper that records token usage of successful completions.
pub struct TrackedLlm {
    inner: Arc<dyn LlmClient>,
    totals: Mutex<UsageTotals>,
}

impl TrackedLlm {
    pub fn new(inner: Arc<dyn LlmClient>) -> Self {
        Self {
            inner,
            totals: Mutex::new(UsageTotals::default()),
        }
    }

    /// Snapshot of the totals so far.
    pub fn totals(&self) -> UsageTotals {
        self.totals.lock().clone()
    }

    /// Reset the totals, returning the previous values.
    pub fn reset(&self) -> UsageTotals {
        std::mem::take(&mut *self.totals.lock())
    }
}

#[async_trait]
impl LlmClient for TrackedLlm {
    fn provider(&self) -> &str {
        self.inner.provider()
    }

    fn model(&self) -> &str {
        self.inner.model()
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let response = self.inner.complete(request).await?;
        self.totals.lock().record(response.usage.as_ref());
        Ok(response)
    }
}
