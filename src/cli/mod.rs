//! CLI module for deepest
//!
//! Provides command-line interface parsing for the `deepest` binary.
//! Uses clap for argument parsing and owo-colors for colored terminal output.

pub mod output;

use crate::utils::config::{ConfigOverrides, LlmProviderKind, SearchApiProvider};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// deepest - iterative web research agent
///
/// Generates search queries for a topic, researches them in parallel,
/// reflects on the evidence and writes a cited answer.
#[derive(Parser, Debug)]
#[command(
    name = "deepest",
    author = "Dirmacs <build@dirmacs.com>",
    version,
    about = "deepest - iterative web research agent",
    after_help = "EXAMPLES:\n    \
                  deepest ask \"What is the capital of France?\"\n    \
                  deepest ask --queries 5 --loops 3 \"State of Rust async runtimes\"\n    \
                  deepest ask --search-provider searxng \"Latest Gemini models\"\n    \
                  deepest serve --port 2024"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "deepest.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Research a topic and print a cited answer
    Ask {
        /// The research question
        topic: String,

        /// Number of initial search queries
        #[arg(short, long)]
        queries: Option<usize>,

        /// Maximum number of reflection loops
        #[arg(short, long)]
        loops: Option<u32>,

        /// Web research backend (google, brave, searxng)
        #[arg(long)]
        search_provider: Option<SearchApiProvider>,

        /// LLM provider (google, openai, custom)
        #[arg(long)]
        llm_provider: Option<LlmProviderKind>,

        /// Model for reflection and the answer (Google provider)
        #[arg(long)]
        reasoning_model: Option<String>,
    },

    /// Serve the research HTTP API
    Serve {
        /// Host address to bind (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },
}

impl Commands {
    /// Per-run overrides carried by `ask`
    pub fn overrides(&self) -> ConfigOverrides {
        match self {
            Commands::Ask {
                queries,
                loops,
                search_provider,
                llm_provider,
                reasoning_model,
                ..
            } => ConfigOverrides {
                number_of_initial_queries: *queries,
                max_research_loops: *loops,
                search_api_provider: *search_provider,
                llm_provider: *llm_provider,
                reasoning_model: reasoning_model.clone(),
                ..Default::default()
            },
            Commands::Serve { .. } => ConfigOverrides::default(),
        }
    }
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
