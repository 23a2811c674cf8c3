use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use comfy_table::{Cell, Table};
use recall_ai::{
    CachedEmbedding, EmbeddingProvider, HashEmbedding, LlmClient, OpenAIClient, OpenAIEmbedding,
    UsageTotals,
};
use recall_memory::{
    DialogueMemory, DialogueSystem, MemoryConfig, MemoryContext, MemorySnapshot, Session,
    StoreSnapshot,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::config::CliConfig;
use crate::offline::OfflineLlm;
use crate::output::{OutputFormat, json::print_json};

const EMBEDDING_CACHE_ENTRIES: usize = 10_000;

/// Dialogue file layout.
#[derive(Debug, Deserialize)]
pub struct DialogueFile {
    pub sessions: Vec<Session>,
    #[serde(default)]
    pub query: Option<String>,
}

impl DialogueFile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read dialogue file {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid dialogue file {}", path.display()))
    }
}

#[derive(Debug, Serialize)]
struct RunReport<'a> {
    strategy: &'static str,
    query: &'a str,
    response: &'a str,
    sessions: usize,
    folded_sessions: usize,
    memory: Option<&'a MemoryContext>,
    usage: UsageTotals,
    #[serde(skip_serializing_if = "Option::is_none")]
    stores: Option<MemorySnapshot>,
    generated_at: DateTime<Utc>,
}

pub async fn run(args: RunArgs, config: CliConfig, format: OutputFormat) -> Result<()> {
    let dialogue = DialogueFile::load(&args.dialogue)?;
    let Some(query) = args.query.clone().or(dialogue.query) else {
        bail!("No query given: pass --query or add \"query\" to the dialogue file");
    };

    let memory_config = memory_config(&args, config.memory.clone());
    let (llm, embeddings) = providers(&args, &config)?;

    let system = DialogueSystem::new(memory_config, llm, embeddings)?;
    let mut memory = system.new_memory();

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted; stopping after the current session");
            on_interrupt.cancel();
        }
    });

    let session_count = dialogue.sessions.len();
    let state = system
        .process_dialogue_with_cancel(&mut memory, dialogue.sessions, query.as_str(), &cancel)
        .await?;
    info!(sessions = session_count, "Dialogue run finished");

    let report = RunReport {
        strategy: system.config().strategy.as_str(),
        query: &query,
        response: state.response()?,
        sessions: session_count,
        folded_sessions: state.current_session_index(),
        memory: state.memory_context(),
        usage: system.usage(),
        stores: args.dump_memory.then(|| memory.snapshot()),
        generated_at: Utc::now(),
    };

    if format.is_json() {
        return print_json(&report);
    }
    print_report(&report, &memory);
    if let Some(stores) = &report.stores {
        println!("\nSnapshot:");
        print_json(stores)?;
    }
    Ok(())
}

fn memory_config(args: &RunArgs, mut config: MemoryConfig) -> MemoryConfig {
    if let Some(strategy) = args.strategy {
        config.strategy = strategy.into();
    }
    if let Some(top_k) = args.top_k {
        config.top_k = top_k;
    }
    config.embed_code |= args.embed_code;
    config.embed_tool |= args.embed_tool;
    config
}

fn providers(
    args: &RunArgs,
    config: &CliConfig,
) -> Result<(Arc<dyn LlmClient>, Arc<dyn EmbeddingProvider>)> {
    if args.offline {
        let embeddings = CachedEmbedding::new(
            HashEmbedding::new(config.provider.offline_dimension),
            EMBEDDING_CACHE_ENTRIES,
        );
        return Ok((Arc::new(OfflineLlm), Arc::new(embeddings)));
    }

    let Some(api_key) = args
        .api_key
        .clone()
        .or_else(|| config.provider.api_key.clone())
    else {
        bail!("No API key: pass --api-key, set OPENAI_API_KEY, or use --offline");
    };

    let provider = &config.provider;
    let llm = OpenAIClient::new(api_key.clone())
        .with_model(provider.model.clone())
        .with_base_url(provider.base_url.clone())
        .with_retry_config(provider.retry.clone());
    let embeddings = OpenAIEmbedding::with_config(api_key, provider.embedding.clone())
        .with_base_url(provider.base_url.clone());
    let embeddings = CachedEmbedding::new(embeddings, EMBEDDING_CACHE_ENTRIES);

    Ok((Arc::new(llm), Arc::new(embeddings)))
}

fn print_report(report: &RunReport<'_>, memory: &DialogueMemory) {
    println!("Query: {}", report.query);
    println!(
        "Strategy: {} ({} of {} sessions folded)",
        report.strategy, report.folded_sessions, report.sessions
    );

    if let Some(context) = report.memory {
        println!("\nDialogue memory:\n{}", context.dialogue_memory);
        if let Some(code) = &context.code_memory {
            println!("\nCode memory:\n{code}");
        }
        if let Some(tool) = &context.tool_memory {
            println!("\nTool memory:\n{tool}");
        }
    }

    println!("\nResponse:\n{}", report.response);
    println!(
        "\nUsage: {} requests, {} prompt tokens, {} completion tokens, ${:.4}",
        report.usage.requests,
        report.usage.prompt_tokens,
        report.usage.completion_tokens,
        report.usage.total_cost_usd
    );

    if report.stores.is_some() {
        let stores = [
            ("text", memory.text_store()),
            ("code", memory.code_store()),
            ("tool", memory.tool_store()),
        ];
        for (name, store) in stores {
            if let Some(store) = store {
                println!("\n{name} store:");
                println!("{}", fragment_table(&store.snapshot()));
            }
        }
    }
}

fn fragment_table(snapshot: &StoreSnapshot) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["#", "Session", "Content"]);
    for (index, fragment) in snapshot.fragments.iter().enumerate() {
        table.add_row(vec![
            Cell::new(index),
            Cell::new(fragment.session_id),
            Cell::new(&fragment.content),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::StrategyArg;
    use recall_memory::StrategyKind;
    use std::io::Write;

    fn args() -> RunArgs {
        RunArgs {
            dialogue: "dialogue.json".into(),
            query: None,
            strategy: None,
            embed_code: false,
            embed_tool: false,
            top_k: None,
            offline: true,
            dump_memory: false,
            api_key: None,
        }
    }

    #[test]
    fn test_flags_override_config() {
        let mut args = args();
        args.strategy = Some(StrategyArg::Recursive);
        args.embed_tool = true;
        args.top_k = Some(2);

        let config = memory_config(&args, MemoryConfig::default().with_code_memory(true));
        assert_eq!(config.strategy, StrategyKind::Recursive);
        assert!(config.embed_code);
        assert!(config.embed_tool);
        assert_eq!(config.top_k, 2);
    }

    #[test]
    fn test_dialogue_file_parses() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"sessions": [[{{"type": "text", "role": "user", "content": "hi"}}], []],
                "query": "hello?"}}"#
        )
        .unwrap();

        let dialogue = DialogueFile::load(file.path()).unwrap();
        assert_eq!(dialogue.sessions.len(), 2);
        assert!(dialogue.sessions[1].is_empty());
        assert_eq!(dialogue.query.as_deref(), Some("hello?"));
    }

    #[test]
    fn test_online_requires_api_key() {
        let mut args = args();
        args.offline = false;
        assert!(providers(&args, &CliConfig::default()).is_err());

        args.api_key = Some("sk-test".to_string());
        assert!(providers(&args, &CliConfig::default()).is_ok());
    }

    #[tokio::test]
    async fn test_invalid_flag_override_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"sessions": [], "query": "anything?"}}"#).unwrap();

        let mut args = args();
        args.dialogue = file.path().to_path_buf();
        args.top_k = Some(0);

        let err = run(args, CliConfig::default(), OutputFormat::Json)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("top_k"));
    }

    #[tokio::test]
    async fn test_offline_run_end_to_end() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"sessions": [
                [{{"type": "text", "role": "user", "content": "I play the cello"}}],
                [{{"type": "code", "role": "assistant", "content": "tuning helper", "code": "tune(a4)"}}]
            ], "query": "What instrument do I play?"}}"#
        )
        .unwrap();

        let mut args = args();
        args.dialogue = file.path().to_path_buf();
        args.embed_code = true;
        args.dump_memory = true;

        run(args, CliConfig::default(), OutputFormat::Json).await.unwrap();
    }
}
