//! Dialogue state threaded through the workflow

use serde::Serialize;

use crate::error::{MemoryError, Result};
use crate::response::MemoryContext;
use crate::session::Session;

/// Folded summaries of the recursive strategy, one entry per processed session.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecursiveMemory {
    summaries: Vec<Vec<String>>,
}

impl RecursiveMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, summary: Vec<String>) {
        self.summaries.push(summary);
    }

    /// Every summary so far, oldest first.
    pub fn summaries(&self) -> &[Vec<String>] {
        &self.summaries
    }

    /// The newest summary joined by newlines, empty before the first fold.
    pub fn latest_memory(&self) -> String {
        self.summaries
            .last()
            .map(|summary| summary.join("\n"))
            .unwrap_or_default()
    }
}

/// Strategy-specific accumulator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrategyState {
    Recursive(RecursiveMemory),
    /// Text memory lives in the caller's text store.
    SessionIndexed,
}

/// State of one `process_dialogue` call.
#[derive(Debug, Clone, Serialize)]
pub struct DialogueState {
    pub(super) sessions: Vec<Session>,
    pub(super) current_session_index: usize,
    pub(super) query: String,
    pub(super) strategy: StrategyState,
    response: Option<String>,
    context: Option<MemoryContext>,
}

impl DialogueState {
    pub fn new(sessions: Vec<Session>, query: impl Into<String>, strategy: StrategyState) -> Self {
        Self {
            sessions,
            current_session_index: 0,
            query: query.into(),
            strategy,
            response: None,
            context: None,
        }
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    /// Number of sessions folded into memory so far.
    pub fn current_session_index(&self) -> usize {
        self.current_session_index
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn strategy(&self) -> &StrategyState {
        &self.strategy
    }

    /// The generated response. Fails before the terminal step has run.
    pub fn response(&self) -> Result<&str> {
        self.response.as_deref().ok_or(MemoryError::ResponseNotReady)
    }

    pub fn is_complete(&self) -> bool {
        self.response.is_some()
    }

    /// Newest folded summary; `None` for the session-indexed strategy.
    pub fn latest_memory(&self) -> Option<String> {
        match &self.strategy {
            StrategyState::Recursive(memory) => Some(memory.latest_memory()),
            StrategyState::SessionIndexed => None,
        }
    }

    /// The last session of the dialogue.
    pub fn current_context(&self) -> Option<&Session> {
        self.sessions.last()
    }

    /// Memory handed to the response generator, once it has run.
    pub fn memory_context(&self) -> Option<&MemoryContext> {
        self.context.as_ref()
    }

    pub(super) fn advance(&mut self) {
        debug_assert!(self.current_session_index < self.sessions.len());
        self.current_session_index += 1;
    }

    pub(super) fn finish(&mut self, context: MemoryContext, response: String) {
        debug_assert!(self.response.is_none());
        self.context = Some(context);
        self.response = Some(response);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::Block;

    #[test]
    fn test_response_not_ready_before_finish() {
        let mut state = DialogueState::new(vec![], "q", StrategyState::SessionIndexed);
        assert!(matches!(state.response(), Err(MemoryError::ResponseNotReady)));
        assert!(!state.is_complete());

        state.finish(MemoryContext::new("", "q"), "answer".to_string());
        assert_eq!(state.response().unwrap(), "answer");
        assert!(state.memory_context().is_some());
    }

    #[test]
    fn test_latest_memory_tracks_last_fold() {
        let mut memory = RecursiveMemory::new();
        assert_eq!(memory.latest_memory(), "");
        memory.push(vec!["User:".to_string(), "- likes tea".to_string()]);
        memory.push(vec!["User:".to_string(), "- likes coffee".to_string()]);
        assert_eq!(memory.latest_memory(), "User:\n- likes coffee");
        assert_eq!(memory.summaries().len(), 2);

        let state = DialogueState::new(vec![], "q", StrategyState::Recursive(memory));
        assert_eq!(state.latest_memory().as_deref(), Some("User:\n- likes coffee"));
    }

    #[test]
    fn test_current_context_is_last_session() {
        let sessions = vec![
            Session::new(vec![Block::text("user", "one")]),
            Session::new(vec![Block::text("user", "two")]),
        ];
        let state = DialogueState::new(sessions, "q", StrategyState::SessionIndexed);
        assert_eq!(state.current_context().map(|s| s.to_string()).as_deref(), Some("user: two"));
        assert_eq!(state.latest_memory(), None);
    }
}
