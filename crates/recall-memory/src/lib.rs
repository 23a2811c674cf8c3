//! Recall Memory - working memory for multi-session dialogues
//!
//! This crate provides:
//! - Block and session model for conversational history
//! - Vector-indexed memory store with recency-weighted retrieval
//! - Recursive (single evolving summary) and session-indexed summarizers
//! - Incremental update/response workflow and the `DialogueSystem` facade

pub mod block;
pub mod config;
pub mod error;
pub mod response;
pub mod session;
pub mod store;
pub mod summarizer;
pub mod system;
mod template;
pub mod workflow;

// Re-export commonly used types
pub use block::{Block, BlockKind, CodeBlock, TextBlock, ToolCallBlock};
pub use config::{FinalSessionPolicy, MemoryConfig, StrategyKind, SummaryBound};
pub use error::{MemoryError, Result};
pub use response::{LlmResponseGenerator, MemoryContext, ResponseGenerator};
pub use session::Session;
pub use store::{
    FlatIndex, IndexSnapshot, MemoryFragment, MemoryStore, ScoredFragment, SessionId,
    StoreSnapshot,
};
pub use summarizer::{RecursiveSummarizer, SessionSummarizer, Summarizer};
pub use system::{DialogueMemory, DialogueSystem, MemorySnapshot};
pub use workflow::{
    DialogueState, DialogueWorkflow, RecursiveMemory, StrategyState, UpdateDecision,
    WorkflowNode,
};
