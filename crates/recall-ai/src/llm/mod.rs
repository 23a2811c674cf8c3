//! LLM module - provider-agnostic chat completion abstraction

mod client;
pub mod judge;
mod mock_client;
mod openai;
pub mod pricing;
pub(crate) mod retry;
pub mod structured;
mod usage;

pub use client::{
    CompletionRequest, CompletionResponse, FinishReason, LlmClient, Message, ResponseFormat,
    Role, TokenUsage,
};
pub use mock_client::{MockLlmClient, MockStep, MockStepKind};
pub use openai::{DEFAULT_BASE_URL, DEFAULT_CHAT_MODEL, OpenAIClient};
pub use retry::LlmRetryConfig;
pub use usage::{TrackedLlm, UsageTotals};
