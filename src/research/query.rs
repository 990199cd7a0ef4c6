//! Initial query generation

use crate::llm::{generate_structured, LLMClient};
use crate::research::prompts;
use crate::research::state::Query;
use crate::types::{AppError, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Structured output of the query writer
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchQueryList {
    /// A list of search queries to be used for web research
    pub queries: Vec<Query>,
}

/// Ask the model for up to `count` search queries about `topic`
///
/// An empty list is an error: a run cannot proceed without queries.
pub async fn generate_queries(llm: &dyn LLMClient, topic: &str, count: usize) -> Result<Vec<Query>> {
    let prompt = prompts::query_writer(topic, count, &prompts::current_date());
    let list: SearchQueryList = generate_structured(llm, &prompt).await?;

    if list.queries.is_empty() {
        return Err(AppError::LLM(format!(
            "{} returned no search queries",
            llm.model_name()
        )));
    }

    info!(
        "Generated {} search queries (requested {})",
        list.queries.len(),
        count
    );
    Ok(list.queries)
}
