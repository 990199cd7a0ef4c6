use crate::{
    types::{ResearchRequest, ResearchResponse, Result},
    AppState,
};
use axum::{extract::State, Json};
use std::time::Instant;
use tracing::info;

/// Run the research loop for a conversation or topic
///
/// Configuration errors map to 400 and model failures to 502, see
/// [`crate::types::AppError`].
pub async fn deep_research(
    State(state): State<AppState>,
    Json(payload): Json<ResearchRequest>,
) -> Result<Json<ResearchResponse>> {
    let start = Instant::now();

    let messages = payload.conversation();
    let outcome = state.coordinator.run(messages, payload.overrides).await?;

    let duration = start.elapsed();
    info!(
        "Research request finished in {} ms ({} loops, {} sources)",
        duration.as_millis(),
        outcome.research_loops,
        outcome.sources.len()
    );

    Ok(Json(ResearchResponse {
        answer: outcome.answer,
        sources: outcome.sources,
        research_loops: outcome.research_loops,
        queries_run: outcome.queries_run,
        duration_ms: duration.as_millis() as u64,
    }))
}
