//! Web research for one search task

use crate::llm::GroundedSearchClient;
use crate::research::citations::{
    get_citations, insert_citation_markers, sources_from_citations, ShortRefRegistry,
};
use crate::research::coordinator::ResearchPorts;
use crate::research::dispatch::SearchTask;
use crate::research::prompts;
use crate::research::state::WebResearchOutput;
use crate::search::{SearchBackend, SearchProvider, SearchResults};
use crate::types::{AppError, Result, Segment, Source};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Separator between numbered snippet blocks
pub const SNIPPET_SEPARATOR: &str = "\n\n---\n\n";

enum Backend {
    Grounded(Arc<dyn GroundedSearchClient>),
    Search(Arc<dyn SearchProvider>),
}

/// Executes search tasks against one configured backend
///
/// Built once per batch; cloning is cheap and every clone shares the run's
/// [`ShortRefRegistry`].
#[derive(Clone)]
pub struct WebResearcher {
    backend: Arc<Backend>,
    short_refs: ShortRefRegistry,
}

impl WebResearcher {
    /// Build the client for `backend`
    ///
    /// Missing credentials were already rejected when the backend was
    /// selected, so this never touches the network.
    pub fn connect(
        backend: &SearchBackend,
        ports: &ResearchPorts,
        short_refs: ShortRefRegistry,
    ) -> Result<Self> {
        let backend = match backend {
            SearchBackend::Google(provider) => Backend::Grounded(ports.llm.create_grounded(provider)?),
            other => Backend::Search(ports.search.create_provider(other)?),
        };
        Ok(Self {
            backend: Arc::new(backend),
            short_refs,
        })
    }

    /// Research one task
    ///
    /// Provider failures degrade into a single "no results" entry. Only
    /// configuration errors are returned.
    pub async fn run(&self, task: &SearchTask) -> Result<WebResearchOutput> {
        info!("Web research [{}]: {}", task.sequence_id, task.query);

        let (text, sources) = match self.backend.as_ref() {
            Backend::Grounded(client) => self.grounded(client.as_ref(), task).await?,
            Backend::Search(provider) => {
                let results = provider.search(&task.query).await;
                match results {
                    Some(results) if !results.results.is_empty() => (
                        format_results(&results),
                        sources_from_results(&results, &task.sequence_id),
                    ),
                    _ => (
                        format!("No results found or error in search for: {}", task.query),
                        Vec::new(),
                    ),
                }
            }
        };

        debug!(
            "Web research [{}] produced {} chars and {} sources",
            task.sequence_id,
            text.len(),
            sources.len()
        );

        Ok(WebResearchOutput {
            sources_gathered: sources,
            search_queries_run: vec![task.query.clone()],
            research_results: vec![text],
        })
    }

    async fn grounded(
        &self,
        client: &dyn GroundedSearchClient,
        task: &SearchTask,
    ) -> Result<(String, Vec<Source>)> {
        let no_results = || {
            (
                format!(
                    "No results or grounding metadata from Google Search for: {}",
                    task.query
                ),
                Vec::new(),
            )
        };

        let prompt = prompts::web_searcher(&task.query, &prompts::current_date());
        let response = match client.generate_grounded(&prompt).await {
            Ok(response) => response,
            Err(e @ AppError::Configuration(_)) => return Err(e),
            Err(e) => {
                warn!("Grounded search failed for '{}': {}", task.query, e);
                return Ok(no_results());
            }
        };

        if response.chunks.is_empty() {
            return Ok(no_results());
        }

        let citations = get_citations(&response, &self.short_refs, &task.sequence_id);
        let text = insert_citation_markers(&response.text, &citations);
        Ok((text, sources_from_citations(&citations, &task.sequence_id)))
    }
}

/// Numbered snippet blocks: `"[i] title\nsnippet\nURL: url"`, starting at 1
pub fn format_results(results: &SearchResults) -> String {
    results
        .results
        .iter()
        .enumerate()
        .map(|(i, item)| {
            format!(
                "[{}] {}\n{}\nURL: {}",
                i + 1,
                item.title,
                item.snippet.as_deref().unwrap_or_default(),
                item.url
            )
        })
        .collect::<Vec<_>>()
        .join(SNIPPET_SEPARATOR)
}

/// One source per hit; the hit's own URL doubles as its short reference
pub fn sources_from_results(results: &SearchResults, sequence_id: &str) -> Vec<Source> {
    results
        .results
        .iter()
        .enumerate()
        .map(|(i, item)| Source {
            id: format!("{}_{}", sequence_id, i),
            title: item.title.clone(),
            url: item.url.clone(),
            short_ref: item.url.clone(),
            segments: vec![Segment {
                text: item.snippet.clone().unwrap_or_default(),
                url: item.url.clone(),
                title: item.title.clone(),
            }],
        })
        .collect()
}
