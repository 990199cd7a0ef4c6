//! Iterative Web Research
//!
//! This module implements the research loop: it turns a conversation into
//! search queries, researches them in parallel, reflects on whether the
//! evidence answers the question, and either searches again or writes a
//! cited answer.
//!
//! # Architecture
//!
//! ```text
//! Generating -> Researching -> Reflecting -> Researching ... -> Finalizing -> Done
//! ```
//!
//! - [`coordinator::ResearchCoordinator`] - owns the [`state::ResearchState`]
//!   and drives the state machine; [`coordinator::decide_next`] is the pure
//!   transition after each reflection
//! - [`dispatch::fan_out`] - numbers a query batch into independent tasks
//! - [`web::WebResearcher`] - runs one task against the configured backend
//! - [`reflection`] and [`finalize`] - the two judging steps
//!
//! The loop always terminates: it stops when reflection reports sufficient
//! evidence, when `max_research_loops` reflections have run, or when a batch
//! has no usable query.
//!
//! # Usage
//!
//! ```ignore
//! use deepest::research::coordinator::{ResearchCoordinator, ResearchPorts};
//!
//! let coordinator = ResearchCoordinator::new(config, ResearchPorts::http());
//! let outcome = coordinator.research("What is the capital of France?").await?;
//!
//! println!("{}", outcome.answer);
//! for source in outcome.sources {
//!     println!("- {} ({})", source.title, source.url);
//! }
//! ```

/// Short references and inline citation markers for grounded results.
pub mod citations;
/// Research loop state machine and parallel batch execution.
pub mod coordinator;
/// Query batch fan-out.
pub mod dispatch;
/// Answer synthesis and citation resolution.
pub mod finalize;
/// Prompt templates.
pub mod prompts;
/// Initial query generation.
pub mod query;
/// Sufficiency verdicts and follow-up queries.
pub mod reflection;
/// Research state and merge rules.
pub mod state;
/// Single-task web research.
pub mod web;

pub use coordinator::{ResearchCoordinator, ResearchOutcome, ResearchPorts};
pub use state::{Query, ResearchState, WebResearchOutput};
