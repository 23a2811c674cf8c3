//! Dialogue memory configuration.

use serde::{Deserialize, Serialize};

use crate::error::{MemoryError, Result};
use crate::store::{DEFAULT_TOP_K, SessionId};

// Default configuration constants
const DEFAULT_MAX_SESSION_ID: SessionId = 3;
const DEFAULT_MAX_SESSION_FRAGMENTS: usize = 12;

/// Which summarizer drives the text memory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    /// Fold every session into a single evolving summary.
    Recursive,
    /// Extract standalone fragments per session into a vector store.
    #[default]
    MemoryBank,
}

impl StrategyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StrategyKind::Recursive => "recursive",
            StrategyKind::MemoryBank => "memory-bank",
        }
    }
}

/// Whether the last session is folded into memory or only shown to the
/// response generator as current context.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalSessionPolicy {
    #[default]
    FoldAll,
    ReserveLast,
}

/// Truncation applied to each recursive summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryBound {
    /// Keep the whole fold; it grows with the dialogue.
    #[default]
    Unbounded,
    /// Keep only the last `n` non-empty lines.
    LastLines(usize),
}

impl SummaryBound {
    pub fn apply(self, fragments: Vec<String>) -> Vec<String> {
        match self {
            SummaryBound::Unbounded => fragments,
            SummaryBound::LastLines(n) => {
                let lines: Vec<String> = fragments
                    .iter()
                    .flat_map(|fragment| fragment.lines())
                    .map(str::trim_end)
                    .filter(|line| !line.trim().is_empty())
                    .map(str::to_string)
                    .collect();
                let skip = lines.len().saturating_sub(n);
                lines.into_iter().skip(skip).collect()
            }
        }
    }
}

/// Memory system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    pub strategy: StrategyKind,
    /// Keep code blocks in a dedicated store.
    pub embed_code: bool,
    /// Keep tool calls in a dedicated store.
    pub embed_tool: bool,
    /// Session id ceiling used for recency weights and session lookups.
    pub max_session_id: SessionId,
    pub top_k: usize,
    pub final_session: FinalSessionPolicy,
    pub summary_bound: SummaryBound,
    /// Cap on fragments extracted from one session.
    pub max_session_fragments: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::default(),
            embed_code: false,
            embed_tool: false,
            max_session_id: DEFAULT_MAX_SESSION_ID,
            top_k: DEFAULT_TOP_K,
            final_session: FinalSessionPolicy::default(),
            summary_bound: SummaryBound::default(),
            max_session_fragments: DEFAULT_MAX_SESSION_FRAGMENTS,
        }
    }
}

impl MemoryConfig {
    pub fn with_strategy(mut self, strategy: StrategyKind) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_code_memory(mut self, enabled: bool) -> Self {
        self.embed_code = enabled;
        self
    }

    pub fn with_tool_memory(mut self, enabled: bool) -> Self {
        self.embed_tool = enabled;
        self
    }

    pub fn with_final_session(mut self, policy: FinalSessionPolicy) -> Self {
        self.final_session = policy;
        self
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.max_session_id < 1 {
            return Err(MemoryError::InvalidConfig(format!(
                "max_session_id must be at least 1, got {}",
                self.max_session_id
            )));
        }

        if self.top_k == 0 {
            return Err(MemoryError::InvalidConfig(
                "top_k must be at least 1".to_string(),
            ));
        }

        if self.max_session_fragments == 0 {
            return Err(MemoryError::InvalidConfig(
                "max_session_fragments must be at least 1".to_string(),
            ));
        }

        if self.summary_bound == SummaryBound::LastLines(0) {
            return Err(MemoryError::InvalidConfig(
                "summary_bound must keep at least one line".to_string(),
            ));
        }

        Ok(())
    }
}
