//! Incremental dialogue workflow.
//!
//! A two-node loop: `UpdateMemory` folds one session per step until the
//! sessions are consumed, then `GenerateResponse` runs exactly once.
//! Steps run strictly in session order and provider failures abort the run
//! without retry. Memory written by earlier steps stays in the caller's
//! [`DialogueMemory`].

mod state;

pub use state::{DialogueState, RecursiveMemory, StrategyState};

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::FinalSessionPolicy;
use crate::error::{MemoryError, Result};
use crate::response::{MemoryContext, ResponseGenerator};
use crate::store::{MemoryStore, SessionId};
use crate::summarizer::Summarizer;
use crate::system::DialogueMemory;

/// Workflow nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowNode {
    UpdateMemory,
    GenerateResponse,
}

/// Outcome of the routing check after each `UpdateMemory` step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateDecision {
    Continue,
    Finish,
}

impl UpdateDecision {
    pub fn next_node(self) -> WorkflowNode {
        match self {
            UpdateDecision::Continue => WorkflowNode::UpdateMemory,
            UpdateDecision::Finish => WorkflowNode::GenerateResponse,
        }
    }
}

/// Number of sessions folded into memory under `policy`.
pub fn fold_limit(policy: FinalSessionPolicy, session_count: usize) -> usize {
    match policy {
        FinalSessionPolicy::FoldAll => session_count,
        FinalSessionPolicy::ReserveLast => session_count.saturating_sub(1),
    }
}

/// Routing rule evaluated after each `UpdateMemory` step.
pub fn should_continue(state: &DialogueState, policy: FinalSessionPolicy) -> UpdateDecision {
    if state.current_session_index() < fold_limit(policy, state.sessions().len()) {
        UpdateDecision::Continue
    } else {
        UpdateDecision::Finish
    }
}

/// Drives one dialogue through the update/response loop.
pub struct DialogueWorkflow<'a> {
    summarizer: &'a Summarizer,
    generator: &'a dyn ResponseGenerator,
    final_session: FinalSessionPolicy,
    top_k: usize,
}

impl<'a> DialogueWorkflow<'a> {
    pub fn new(
        summarizer: &'a Summarizer,
        generator: &'a dyn ResponseGenerator,
        final_session: FinalSessionPolicy,
        top_k: usize,
    ) -> Self {
        Self {
            summarizer,
            generator,
            final_session,
            top_k,
        }
    }

    /// Run to completion.
    ///
    /// `cancel` is checked only before an `UpdateMemory` step starts; an
    /// in-flight provider call is never interrupted.
    pub async fn run(
        &self,
        memory: &mut DialogueMemory,
        mut state: DialogueState,
        cancel: Option<&CancellationToken>,
    ) -> Result<DialogueState> {
        self.check_pairing(memory, &state)?;

        let mut node = if fold_limit(self.final_session, state.sessions().len()) > 0 {
            WorkflowNode::UpdateMemory
        } else {
            WorkflowNode::GenerateResponse
        };

        loop {
            match node {
                WorkflowNode::UpdateMemory => {
                    if cancel.is_some_and(CancellationToken::is_cancelled) {
                        info!(
                            next_session = state.current_session_index(),
                            "Dialogue processing cancelled"
                        );
                        return Err(MemoryError::Cancelled {
                            next_session: state.current_session_index(),
                        });
                    }

                    self.update_memory(memory, &mut state).await?;

                    let decision = should_continue(&state, self.final_session);
                    node = decision.next_node();
                    debug!(
                        processed = state.current_session_index(),
                        sessions = state.sessions().len(),
                        ?decision,
                        "Memory update step finished"
                    );
                }
                WorkflowNode::GenerateResponse => {
                    self.generate_response(memory, &mut state).await?;
                    info!(
                        sessions = state.sessions().len(),
                        folded = state.current_session_index(),
                        "Dialogue processed"
                    );
                    return Ok(state);
                }
            }
        }
    }

    /// Rejects a summarizer, state and memory that do not belong together
    /// before any store is written.
    fn check_pairing(&self, memory: &DialogueMemory, state: &DialogueState) -> Result<()> {
        match (self.summarizer, state.strategy()) {
            (Summarizer::Recursive(_), StrategyState::Recursive(_)) => Ok(()),
            (Summarizer::SessionIndexed(_), StrategyState::SessionIndexed) => memory
                .text
                .as_ref()
                .map(|_| ())
                .ok_or_else(missing_text_store),
            _ => Err(strategy_mismatch()),
        }
    }

    async fn update_memory(
        &self,
        memory: &mut DialogueMemory,
        state: &mut DialogueState,
    ) -> Result<()> {
        let index = state.current_session_index;
        let session_id = index as SessionId;
        let session = &state.sessions[index];

        if let Some(store) = memory.code.as_mut() {
            let code_blocks = session.code_blocks();
            if !code_blocks.is_empty() {
                store.add_memory(code_blocks, session_id).await?;
            }
        }
        if let Some(store) = memory.tool.as_mut() {
            let tool_calls = session.tool_calls();
            if !tool_calls.is_empty() {
                store.add_memory(tool_calls, session_id).await?;
            }
        }

        let text = session.text_transcript();
        match (self.summarizer, &mut state.strategy) {
            (Summarizer::Recursive(summarizer), StrategyState::Recursive(folds)) => {
                let summary = summarizer.summarize(&folds.latest_memory(), &text).await?;
                folds.push(summary);
            }
            (Summarizer::SessionIndexed(summarizer), StrategyState::SessionIndexed) => {
                let store = text_store(memory)?;
                let fragments = summarizer.summarize(&text, session_id).await?;
                store.add_memory(&fragments, session_id).await?;
            }
            _ => return Err(strategy_mismatch()),
        }

        state.advance();
        Ok(())
    }

    async fn generate_response(
        &self,
        memory: &DialogueMemory,
        state: &mut DialogueState,
    ) -> Result<()> {
        let query = state.query().to_string();

        let dialogue_memory = match state.strategy() {
            StrategyState::Recursive(folds) => folds.latest_memory(),
            StrategyState::SessionIndexed => {
                let store = memory.text.as_ref().ok_or_else(missing_text_store)?;
                retrieve(store, &query, self.top_k).await?
            }
        };
        let code_memory = match memory.code.as_ref() {
            Some(store) => Some(retrieve(store, &query, self.top_k).await?),
            None => None,
        };
        let tool_memory = match memory.tool.as_ref() {
            Some(store) => Some(retrieve(store, &query, self.top_k).await?),
            None => None,
        };
        let current_context = match self.final_session {
            FinalSessionPolicy::FoldAll => None,
            FinalSessionPolicy::ReserveLast => state.current_context().map(ToString::to_string),
        };

        let context = MemoryContext {
            dialogue_memory,
            code_memory,
            tool_memory,
            current_context,
            query,
        };
        let response = self.generator.generate_response(&context).await?;
        state.finish(context, response);
        Ok(())
    }
}

async fn retrieve(store: &MemoryStore, query: &str, top_k: usize) -> Result<String> {
    Ok(store.find_similar(query, top_k).await?.join("\n"))
}

fn text_store(memory: &mut DialogueMemory) -> Result<&mut MemoryStore> {
    memory.text.as_mut().ok_or_else(missing_text_store)
}

fn strategy_mismatch() -> MemoryError {
    MemoryError::InvalidConfig("summarizer does not match the dialogue state strategy".to_string())
}

fn missing_text_store() -> MemoryError {
    MemoryError::InvalidConfig("session-indexed strategy needs a text memory store".to_string())
}
