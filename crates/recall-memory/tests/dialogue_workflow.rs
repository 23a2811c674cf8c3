use std::sync::Arc;

use recall_ai::{HashEmbedding, MockLlmClient, MockStep};
use recall_memory::{
    Block, DialogueMemory, DialogueSystem, FinalSessionPolicy, MemoryConfig, MemoryError, Session,
    StrategyKind, StrategyState,
};
use serde_json::json;
use tokio_util::sync::CancellationToken;

fn summary(entries: &[(&str, &str)]) -> MockStep {
    let messages: Vec<_> = entries
        .iter()
        .map(|(role, content)| json!({"role": role, "content": content}))
        .collect();
    MockStep::text(json!({ "summary_messages": messages }).to_string())
}

fn dialogue() -> Vec<Session> {
    vec![
        Session::new(vec![
            Block::text("user", "Hi, I just moved to Lisbon."),
            Block::text("assistant", "Welcome to Lisbon!"),
        ]),
        Session::new(vec![
            Block::text("user", "Can you dedupe a vector for me?"),
            Block::code("assistant", "Sort then dedup", "v.sort(); v.dedup();"),
            Block::tool_call("assistant", "call-1", "cargo_test", "--lib", "ok"),
        ]),
        Session::new(vec![
            Block::text("user", "I adopted a dog called Pepper."),
            Block::text("assistant", "Pepper is a great name."),
        ]),
    ]
}

fn system(config: MemoryConfig, llm: &Arc<MockLlmClient>) -> DialogueSystem {
    DialogueSystem::new(config, llm.clone(), Arc::new(HashEmbedding::new(128))).unwrap()
}

#[tokio::test]
async fn test_memory_bank_dialogue_end_to_end() {
    let llm = Arc::new(MockLlmClient::from_steps(
        "mock",
        vec![
            summary(&[("user", "The user lives in Lisbon.")]),
            summary(&[("user", "The user writes Rust.")]),
            summary(&[
                ("user", "The user has a dog called Pepper."),
                ("assistant", "The assistant likes dog names."),
            ]),
            MockStep::text("Your dog is called Pepper."),
        ],
    ));
    let system = system(
        MemoryConfig::default()
            .with_code_memory(true)
            .with_tool_memory(true),
        &llm,
    );
    let mut memory = system.new_memory();

    let state = system
        .process_dialogue(&mut memory, dialogue(), "What is my dog called?")
        .await
        .unwrap();

    assert_eq!(state.current_session_index(), 3);
    assert_eq!(state.response().unwrap(), "Your dog is called Pepper.");
    assert_eq!(state.strategy(), &StrategyState::SessionIndexed);

    let text = memory.text_store().unwrap();
    assert_eq!(text.len(), 4);
    assert_eq!(
        text.get_session_memory(2).unwrap(),
        vec![
            "user: The user has a dog called Pepper.",
            "assistant: The assistant likes dog names."
        ]
    );
    assert!(text.get_session_memory(3).is_err());

    let code = memory.code_store().unwrap();
    assert_eq!(code.get_session_memory(1).unwrap(), vec!["v.sort(); v.dedup();"]);
    assert_eq!(memory.tool_store().unwrap().len(), 1);

    let requests = llm.requests();
    assert_eq!(requests.len(), 4);
    // Summaries only see the text blocks of their session.
    assert!(requests[1].messages[0].content.contains("user: Can you dedupe a vector for me?"));
    assert!(!requests[1].messages[0].content.contains("v.dedup()"));

    let prompt = &requests[3].messages[0].content;
    assert!(prompt.contains("user: The user has a dog called Pepper."));
    assert!(prompt.contains("v.sort(); v.dedup();"));
    assert!(prompt.contains("Tool Call [call-1]: cargo_test - --lib -> ok"));

    let context = state.memory_context().unwrap();
    assert_eq!(context.query, "What is my dog called?");
    assert_eq!(context.current_context, None);

    let usage = system.usage();
    assert_eq!(usage.requests, 4);
    assert_eq!(usage.prompt_tokens, 4);
}

#[tokio::test]
async fn test_recursive_dialogue_folds_previous_summary() {
    let llm = Arc::new(MockLlmClient::from_steps(
        "mock",
        vec![
            summary(&[("user", "User:\n- Lives in Lisbon")]),
            summary(&[("user", "User:\n- Lives in Lisbon\n- Writes Rust")]),
            summary(&[("user", "User:\n- Lives in Lisbon\n- Writes Rust\n- Owns Pepper")]),
            MockStep::text("Pepper!"),
        ],
    ));
    let system = system(
        MemoryConfig::default().with_strategy(StrategyKind::Recursive),
        &llm,
    );
    let mut memory = system.new_memory();
    assert!(memory.text_store().is_none());

    let state = system
        .process_dialogue(&mut memory, dialogue(), "What is my dog called?")
        .await
        .unwrap();

    assert_eq!(state.current_session_index(), 3);
    assert_eq!(
        state.latest_memory().as_deref(),
        Some("User:\n- Lives in Lisbon\n- Writes Rust\n- Owns Pepper")
    );
    match state.strategy() {
        StrategyState::Recursive(folds) => assert_eq!(folds.summaries().len(), 3),
        StrategyState::SessionIndexed => panic!("expected recursive state"),
    }

    let requests = llm.requests();
    assert!(requests[0].messages[0].content.contains("Previous Memory:\n\n"));
    assert!(
        requests[2].messages[0]
            .content
            .contains("Previous Memory:\nUser:\n- Lives in Lisbon\n- Writes Rust\n")
    );
    let prompt = &requests[3].messages[0].content;
    assert!(
        prompt.contains("Dialogue Memory:\nUser:\n- Lives in Lisbon\n- Writes Rust\n- Owns Pepper")
    );
    assert!(prompt.contains("Code Memory is missing"));
    assert!(prompt.contains("Tool Memory is missing"));
}

#[tokio::test]
async fn test_reserve_last_keeps_final_session_as_context() {
    let llm = Arc::new(MockLlmClient::from_steps(
        "mock",
        vec![
            summary(&[("user", "User:\n- Lives in Lisbon")]),
            summary(&[("user", "User:\n- Lives in Lisbon\n- Writes Rust")]),
            MockStep::text("Pepper is lovely."),
        ],
    ));
    let system = system(
        MemoryConfig::default()
            .with_strategy(StrategyKind::Recursive)
            .with_final_session(FinalSessionPolicy::ReserveLast),
        &llm,
    );
    let mut memory = system.new_memory();

    let state = system
        .process_dialogue(&mut memory, dialogue(), "Say something about my dog")
        .await
        .unwrap();

    assert_eq!(state.current_session_index(), 2);
    assert_eq!(llm.requests().len(), 3);
    let context = state.memory_context().unwrap();
    assert_eq!(
        context.current_context.as_deref(),
        Some("user: I adopted a dog called Pepper.\nassistant: Pepper is a great name.")
    );
    assert!(
        llm.requests()[2].messages[0]
            .content
            .contains("Current Dialogue Context:\nuser: I adopted a dog called Pepper.")
    );
}

#[tokio::test]
async fn test_nothing_to_fold_goes_straight_to_response() {
    let llm = Arc::new(MockLlmClient::from_steps("mock", vec![MockStep::text("Hello!")]));
    let system = system(MemoryConfig::default(), &llm);
    let mut memory = system.new_memory();

    let state = system
        .process_dialogue(&mut memory, Vec::new(), "hi")
        .await
        .unwrap();
    assert_eq!(state.current_session_index(), 0);
    assert_eq!(state.response().unwrap(), "Hello!");
    assert_eq!(llm.requests().len(), 1);

    let reserve = system_with_reserve(&llm);
    let mut memory = reserve.new_memory();
    let single = vec![dialogue().remove(0)];
    let state = reserve
        .process_dialogue(&mut memory, single, "hi")
        .await
        .unwrap();
    assert_eq!(state.current_session_index(), 0);
    assert!(state.response().is_ok());
    assert!(memory.text_store().unwrap().is_empty());
}

fn system_with_reserve(llm: &Arc<MockLlmClient>) -> DialogueSystem {
    system(
        MemoryConfig::default().with_final_session(FinalSessionPolicy::ReserveLast),
        llm,
    )
}

#[tokio::test]
async fn test_provider_failure_aborts_and_keeps_partial_memory() {
    let llm = Arc::new(MockLlmClient::from_steps(
        "mock",
        vec![
            summary(&[("user", "The user lives in Lisbon.")]),
            MockStep::error("upstream timed out"),
        ],
    ));
    let system = system(MemoryConfig::default(), &llm);
    let mut memory = system.new_memory();

    let err = system
        .process_dialogue(&mut memory, dialogue(), "Where do I live?")
        .await
        .unwrap_err();
    assert!(err.is_provider_failure());
    assert!(err.to_string().contains("upstream timed out"));

    let text = memory.text_store().unwrap();
    assert_eq!(text.len(), 1);
    assert_eq!(
        text.get_session_memory(0).unwrap(),
        vec!["user: The user lives in Lisbon."]
    );
    // No step after the failure was attempted.
    assert_eq!(llm.requests().len(), 2);
}

#[tokio::test]
async fn test_mismatched_memory_is_rejected_before_any_store_write() {
    let llm = Arc::new(MockLlmClient::new("mock"));
    let system = system(MemoryConfig::default(), &llm);
    // Memory built for the recursive strategy has no text store.
    let mut memory = DialogueMemory::new(
        Arc::new(HashEmbedding::new(128)),
        &MemoryConfig::default()
            .with_strategy(StrategyKind::Recursive)
            .with_code_memory(true)
            .with_tool_memory(true),
    );
    let sessions = dialogue()[1..].to_vec();

    let err = system
        .process_dialogue(&mut memory, sessions, "How do I dedupe?")
        .await
        .unwrap_err();
    assert!(matches!(err, MemoryError::InvalidConfig(_)));
    assert!(memory.code_store().unwrap().is_empty());
    assert!(memory.tool_store().unwrap().is_empty());
    assert!(llm.requests().is_empty());
}

#[tokio::test]
async fn test_memory_accumulates_across_calls() {
    let llm = Arc::new(MockLlmClient::from_steps(
        "mock",
        vec![
            summary(&[("user", "The user lives in Lisbon.")]),
            MockStep::text("Noted."),
            summary(&[("user", "The user has a dog called Pepper.")]),
            MockStep::text("Your dog is Pepper and you live in Lisbon."),
        ],
    ));
    let system = system(MemoryConfig::default(), &llm);
    let mut memory = system.new_memory();
    let sessions = dialogue();

    system
        .process_dialogue(&mut memory, vec![sessions[0].clone()], "hello")
        .await
        .unwrap();
    system
        .process_dialogue(&mut memory, vec![sessions[2].clone()], "Tell me about me")
        .await
        .unwrap();

    let text = memory.text_store().unwrap();
    assert_eq!(text.len(), 2);
    let prompt = &llm.requests()[3].messages[0].content;
    assert!(prompt.contains("user: The user lives in Lisbon."));
    assert!(prompt.contains("user: The user has a dog called Pepper."));
    assert_eq!(system.usage().requests, 4);
}

#[tokio::test]
async fn test_cancelled_token_stops_before_next_session() {
    let llm = Arc::new(MockLlmClient::new("mock"));
    let system = system(MemoryConfig::default(), &llm);
    let mut memory = system.new_memory();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = system
        .process_dialogue_with_cancel(&mut memory, dialogue(), "q", &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, MemoryError::Cancelled { next_session: 0 }));
    assert!(llm.requests().is_empty());
    assert!(memory.text_store().unwrap().is_empty());
}

#[tokio::test]
async fn test_memory_snapshot_lists_populated_stores() {
    let llm = Arc::new(MockLlmClient::from_steps(
        "mock",
        vec![
            summary(&[("user", "The user lives in Lisbon.")]),
            MockStep::text("ok"),
        ],
    ));
    let system = system(MemoryConfig::default().with_code_memory(true), &llm);
    let mut memory = system.new_memory();
    system
        .process_dialogue(&mut memory, vec![dialogue().remove(0)], "q")
        .await
        .unwrap();

    let snapshot = serde_json::to_value(memory.snapshot()).unwrap();
    assert_eq!(snapshot["text"]["fragment_count"], 1);
    assert_eq!(snapshot["text"]["index"]["row_count"], 1);
    assert_eq!(snapshot["code"]["initialized"], false);
    assert!(snapshot.get("tool").is_none());
}
