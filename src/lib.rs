//! # deepest - Iterative Web Research Agent
//!
//! Given a research topic, deepest generates search queries, researches them
//! in parallel on the web, reflects on whether the evidence answers the
//! question, and either searches again with follow-up queries or writes a
//! final answer with resolved citations.
//!
//! ## Overview
//!
//! deepest can be used in two ways:
//!
//! 1. **As a CLI and server** - Run the `deepest` binary (`deepest ask`, `deepest serve`)
//! 2. **As a library** - Drive a [`ResearchCoordinator`] from your own code
//!
//! ## Quick Start (Library Usage)
//!
//! ```rust,ignore
//! use deepest::{ResearchConfig, ResearchCoordinator, ResearchPorts};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> deepest::Result<()> {
//!     let config = Arc::new(ResearchConfig::load(None)?);
//!     let coordinator = ResearchCoordinator::new(config, ResearchPorts::http());
//!
//!     let outcome = coordinator.research("What is the capital of France?").await?;
//!     println!("{}", outcome.answer);
//!     Ok(())
//! }
//! ```
//!
//! ### Testing with Mock Providers
//!
//! Every external capability sits behind a port
//! ([`llm::LLMClientFactoryTrait`], [`search::SearchProviderFactory`]), so a
//! run can be driven entirely by in-memory implementations:
//!
//! ```rust,ignore
//! let ports = ResearchPorts::new(Arc::new(MockLLMFactory::new(..)), Arc::new(MockSearchFactory::new(..)));
//! let coordinator = ResearchCoordinator::new(Arc::new(config), ports);
//! ```
//!
//! ## Modules
//!
//! - [`api`] - REST API handlers and routes
//! - [`cli`] - Command-line parsing and output
//! - [`llm`] - LLM client implementations (Gemini, OpenAI-compatible)
//! - [`research`] - The research loop state machine
//! - [`search`] - Web search providers (Brave, SearXNG)
//! - [`types`] - Common types and error handling
//! - [`utils`] - Layered configuration

#![warn(rustdoc::missing_crate_level_docs)]

/// HTTP API handlers and routes.
pub mod api;
/// Command-line interface.
pub mod cli;
/// LLM provider clients and abstractions.
pub mod llm;
/// Iterative research loop.
pub mod research;
/// Web search providers.
pub mod search;
/// Core types (requests, responses, errors).
pub mod types;
/// Configuration utilities.
pub mod utils;

// Re-export commonly used types
pub use llm::{LLMClient, LLMClientFactory, LLMClientFactoryTrait, Provider};
pub use research::{ResearchCoordinator, ResearchOutcome, ResearchPorts};
pub use types::{AppError, Result};
pub use utils::config::{ConfigOverrides, ResearchConfig};

use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Process-wide configuration, read-only after startup
    pub config: Arc<ResearchConfig>,
    pub coordinator: Arc<ResearchCoordinator>,
}

impl AppState {
    pub fn new(config: Arc<ResearchConfig>, ports: ResearchPorts) -> Self {
        let coordinator = Arc::new(ResearchCoordinator::new(config.clone(), ports));
        Self {
            config,
            coordinator,
        }
    }
}
