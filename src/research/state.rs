//! Research state and its merge rules
//!
//! [`ResearchState`] is owned by the loop controller and threaded through
//! every step. Web research tasks never touch it directly: each returns a
//! [`WebResearchOutput`] and the controller folds those in with
//! [`ResearchState::absorb`]. Both folds are plain concatenation of the
//! append-only lists, so any completion order yields the same multiset.

use crate::types::{AppError, Message, MessageRole, Result, Source};
use crate::utils::config::ConfigOverrides;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A search query waiting to be dispatched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Query {
    /// The search query text
    pub query: String,
    /// Why this query helps answer the topic
    pub rationale: String,
}

/// Contribution of one (or several merged) web research tasks
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WebResearchOutput {
    pub sources_gathered: Vec<Source>,
    pub search_queries_run: Vec<String>,
    pub research_results: Vec<String>,
}

impl WebResearchOutput {
    /// Concatenate `other` onto `self`
    pub fn merge(mut self, other: WebResearchOutput) -> WebResearchOutput {
        self.sources_gathered.extend(other.sources_gathered);
        self.search_queries_run.extend(other.search_queries_run);
        self.research_results.extend(other.research_results);
        self
    }
}

/// Mutable record of one research request
#[derive(Debug, Clone, Default)]
pub struct ResearchState {
    pub messages: Vec<Message>,
    /// Derived from `messages` once, at creation
    pub topic: String,
    pub overrides: ConfigOverrides,

    /// Next batch to fan out; replaced wholesale by query generation and reflection
    pub pending_queries: Vec<Query>,
    /// Number of initial queries the generation step asked for
    pub initial_query_count: Option<usize>,

    pub search_queries_run: Vec<String>,
    pub research_results: Vec<String>,
    /// Not deduplicated until finalization
    pub sources_gathered: Vec<Source>,

    /// Reflections performed so far
    pub loop_count: u32,
    /// `None` until the first reflection
    pub is_sufficient: Option<bool>,
    pub knowledge_gap: Option<String>,
    /// Queries executed when the last reflection ran; offsets the next batch's sequence ids
    pub queries_run_count: usize,
}

impl ResearchState {
    pub fn new(messages: Vec<Message>, overrides: ConfigOverrides) -> Result<Self> {
        let topic = research_topic(&messages)?;
        Ok(Self {
            messages,
            topic,
            overrides,
            ..Default::default()
        })
    }

    /// Fold a web research contribution into the append-only lists
    pub fn absorb(&mut self, output: WebResearchOutput) {
        self.sources_gathered.extend(output.sources_gathered);
        self.search_queries_run.extend(output.search_queries_run);
        self.research_results.extend(output.research_results);
    }
}

/// The research topic: text of the most recent user message
pub fn research_topic(messages: &[Message]) -> Result<String> {
    let message = messages
        .iter()
        .rev()
        .find(|m| m.role == MessageRole::User)
        .ok_or_else(|| AppError::InvalidInput("Conversation has no user message".to_string()))?;

    let topic = message.content.text();
    if topic.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "The latest user message is empty".to_string(),
        ));
    }
    Ok(topic)
}
