use clap::{Args, Parser, Subcommand, ValueEnum};
use recall_memory::StrategyKind;
use std::path::PathBuf;

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "recall")]
#[command(version, about = "Recall - working memory for long dialogues")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (defaults to ~/.config/recall/config.toml)
    #[arg(long, global = true, env = "RECALL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fold a dialogue into memory and answer a query
    Run(RunArgs),
}

/// Strategy names accepted on the command line
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum StrategyArg {
    Recursive,
    MemoryBank,
}

impl From<StrategyArg> for StrategyKind {
    fn from(value: StrategyArg) -> Self {
        match value {
            StrategyArg::Recursive => StrategyKind::Recursive,
            StrategyArg::MemoryBank => StrategyKind::MemoryBank,
        }
    }
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Dialogue file: {"sessions": [[block, ...], ...], "query": "..."}
    pub dialogue: PathBuf,

    /// Query to answer (overrides the one in the dialogue file)
    #[arg(short, long)]
    pub query: Option<String>,

    /// Memory strategy
    #[arg(long, value_enum)]
    pub strategy: Option<StrategyArg>,

    /// Keep code blocks in their own store
    #[arg(long)]
    pub embed_code: bool,

    /// Keep tool calls in their own store
    #[arg(long)]
    pub embed_tool: bool,

    /// Number of fragments retrieved per store
    #[arg(long)]
    pub top_k: Option<usize>,

    /// Use deterministic local providers instead of the API
    #[arg(long)]
    pub offline: bool,

    /// Print every populated memory store
    #[arg(long)]
    pub dump_memory: bool,

    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
}
