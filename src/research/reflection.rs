//! Reflection over gathered research and follow-up planning

use crate::llm::{generate_structured, LLMClient};
use crate::research::prompts;
use crate::research::state::{Query, ResearchState};
use crate::types::Result;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::info;

pub const FOLLOW_UP_RATIONALE: &str = "Follow-up query from reflection.";

/// Verdict on the evidence gathered so far
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Reflection {
    /// Whether the provided summaries are sufficient to answer the user's question
    pub is_sufficient: bool,
    /// A description of what information is missing or needs clarification
    #[serde(default)]
    pub knowledge_gap: String,
    /// Questions that would close the knowledge gap
    #[serde(default)]
    pub follow_up_queries: Vec<String>,
}

/// Ask the model whether `summaries` answer `topic`
pub async fn reflect(llm: &dyn LLMClient, topic: &str, summaries: &[String]) -> Result<Reflection> {
    let prompt = prompts::reflection(topic, summaries, &prompts::current_date());
    let reflection: Reflection = generate_structured(llm, &prompt).await?;

    info!(
        "Reflection: sufficient={}, {} follow-up queries",
        reflection.is_sufficient,
        reflection.follow_up_queries.len()
    );
    Ok(reflection)
}

/// Record a reflection in the state
///
/// Follow-ups replace the pending batch outright and blank ones are dropped.
/// The loop counter moves by exactly one.
pub fn apply_reflection(state: &mut ResearchState, reflection: Reflection) {
    state.is_sufficient = Some(reflection.is_sufficient);
    state.knowledge_gap = Some(reflection.knowledge_gap);
    state.pending_queries = reflection
        .follow_up_queries
        .into_iter()
        .filter(|q| !q.trim().is_empty())
        .map(|query| Query {
            query,
            rationale: FOLLOW_UP_RATIONALE.to_string(),
        })
        .collect();
    state.loop_count += 1;
    state.queries_run_count = state.search_queries_run.len();
}
