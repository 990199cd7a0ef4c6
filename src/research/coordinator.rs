use crate::{
    llm::{LLMClient, LLMClientFactory, LLMClientFactoryTrait},
    research::{
        citations::ShortRefRegistry,
        dispatch::{fan_out, SearchTask},
        finalize::{finalize_answer, FinalAnswer},
        query::generate_queries,
        reflection::{apply_reflection, reflect},
        state::{ResearchState, WebResearchOutput},
        web::WebResearcher,
    },
    search::{HttpSearchFactory, SearchProviderFactory},
    types::{AppError, Message, Result, Source},
    utils::config::{ConfigOverrides, ModelRole, ResearchConfig},
};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

/// Capability ports injected into every run
#[derive(Clone)]
pub struct ResearchPorts {
    pub llm: Arc<dyn LLMClientFactoryTrait>,
    pub search: Arc<dyn SearchProviderFactory>,
}

impl ResearchPorts {
    pub fn new(llm: Arc<dyn LLMClientFactoryTrait>, search: Arc<dyn SearchProviderFactory>) -> Self {
        Self { llm, search }
    }

    /// HTTP-backed ports sharing one connection pool
    pub fn http() -> Self {
        let http = reqwest::Client::new();
        Self {
            llm: Arc::new(LLMClientFactory::with_http_client(http.clone())),
            search: Arc::new(HttpSearchFactory::with_http_client(http)),
        }
    }
}

/// Why the loop stopped researching
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalizeReason {
    /// Reflection judged the evidence sufficient
    Sufficient,
    /// `max_research_loops` reflections have run
    LoopLimit,
    /// The pending batch had no usable query
    NothingToResearch,
}

/// Outcome of the transition after a reflection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopDecision {
    Continue(Vec<SearchTask>),
    Finalize(FinalizeReason),
}

/// Research loop states
#[derive(Debug)]
pub enum Phase {
    Generating,
    Researching(Vec<SearchTask>),
    Reflecting,
    Finalizing(FinalizeReason),
    Done(FinalAnswer),
}

/// Decide what follows a reflection
///
/// Depends only on the sufficiency verdict, the loop counter, the loop limit
/// and the pending queries.
pub fn decide_next(state: &ResearchState, max_loops: u32) -> LoopDecision {
    if state.is_sufficient == Some(true) {
        return LoopDecision::Finalize(FinalizeReason::Sufficient);
    }
    if state.loop_count >= max_loops {
        return LoopDecision::Finalize(FinalizeReason::LoopLimit);
    }

    let tasks = fan_out(&state.pending_queries, state.queries_run_count);
    if tasks.is_empty() {
        LoopDecision::Finalize(FinalizeReason::NothingToResearch)
    } else {
        LoopDecision::Continue(tasks)
    }
}

/// Result of one research run
#[derive(Debug, Clone, PartialEq)]
pub struct ResearchOutcome {
    pub answer: String,
    pub sources: Vec<Source>,
    /// Reflections performed
    pub research_loops: u32,
    pub queries_run: Vec<String>,
}

pub struct ResearchCoordinator {
    config: Arc<ResearchConfig>,
    ports: ResearchPorts,
}

impl ResearchCoordinator {
    pub fn new(config: Arc<ResearchConfig>, ports: ResearchPorts) -> Self {
        Self { config, ports }
    }

    /// Research a single topic with the default configuration
    pub async fn research(&self, topic: &str) -> Result<ResearchOutcome> {
        self.run(vec![Message::user(topic)], ConfigOverrides::default())
            .await
    }

    /// Execute a research run for a conversation
    ///
    /// The topic is the latest user message. `overrides` take precedence over
    /// the process configuration for this run only.
    pub async fn run(
        &self,
        messages: Vec<Message>,
        overrides: ConfigOverrides,
    ) -> Result<ResearchOutcome> {
        let run_id = Uuid::new_v4();
        self.drive(messages, overrides)
            .instrument(info_span!("research", %run_id))
            .await
    }

    async fn drive(
        &self,
        messages: Vec<Message>,
        overrides: ConfigOverrides,
    ) -> Result<ResearchOutcome> {
        let mut state = ResearchState::new(messages, overrides)?;
        let config = self.config.resolve(&state.overrides)?;
        let short_refs = ShortRefRegistry::new();

        info!(
            "Researching '{}' (llm: {}, search: {}, max loops: {})",
            state.topic, config.llm_provider, config.search_api_provider, config.max_research_loops
        );

        let mut phase = Phase::Generating;
        let answer = loop {
            phase = match phase {
                Phase::Generating => {
                    let llm = self.client_for(&config, ModelRole::QueryGeneration)?;
                    let count = config.number_of_initial_queries;
                    state.initial_query_count = Some(count);
                    state.pending_queries = generate_queries(llm.as_ref(), &state.topic, count).await?;

                    let tasks = fan_out(&state.pending_queries, 0);
                    if tasks.is_empty() {
                        Phase::Finalizing(FinalizeReason::NothingToResearch)
                    } else {
                        Phase::Researching(tasks)
                    }
                }
                Phase::Researching(tasks) => {
                    let researcher = WebResearcher::connect(
                        &config.search_backend()?,
                        &self.ports,
                        short_refs.clone(),
                    )?;
                    let output = parallel_research(researcher, tasks).await?;
                    state.absorb(output);
                    Phase::Reflecting
                }
                Phase::Reflecting => {
                    let llm = self.client_for(&config, ModelRole::Reflection)?;
                    let reflection = reflect(llm.as_ref(), &state.topic, &state.research_results).await?;
                    apply_reflection(&mut state, reflection);

                    match decide_next(&state, config.max_research_loops) {
                        LoopDecision::Continue(tasks) => {
                            info!(
                                "Research loop {}: {} follow-up searches",
                                state.loop_count,
                                tasks.len()
                            );
                            Phase::Researching(tasks)
                        }
                        LoopDecision::Finalize(reason) => Phase::Finalizing(reason),
                    }
                }
                Phase::Finalizing(reason) => {
                    info!(
                        "Finalizing after {} loops ({:?}), {} sources gathered",
                        state.loop_count,
                        reason,
                        state.sources_gathered.len()
                    );
                    let llm = self.client_for(&config, ModelRole::Answer)?;
                    Phase::Done(
                        finalize_answer(
                            llm.as_ref(),
                            &state.topic,
                            &state.research_results,
                            &state.sources_gathered,
                        )
                        .await?,
                    )
                }
                Phase::Done(answer) => break answer,
            };
        };

        Ok(ResearchOutcome {
            answer: answer.text,
            sources: answer.sources,
            research_loops: state.loop_count,
            queries_run: state.search_queries_run,
        })
    }

    fn client_for(&self, config: &ResearchConfig, role: ModelRole) -> Result<Arc<dyn LLMClient>> {
        let provider = config.llm_provider_for(role)?;
        self.ports.llm.create_client(&provider)
    }
}

/// Run a batch concurrently and merge the contributions as they complete
///
/// A fatal error in any task aborts the rest of the batch.
async fn parallel_research(
    researcher: WebResearcher,
    tasks: Vec<SearchTask>,
) -> Result<WebResearchOutput> {
    let mut set = JoinSet::new();

    for task in tasks {
        let researcher = researcher.clone();
        set.spawn(async move { researcher.run(&task).await }.in_current_span());
    }

    let mut merged = WebResearchOutput::default();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(Ok(output)) => merged = merged.merge(output),
            Ok(Err(e)) => {
                set.abort_all();
                return Err(e);
            }
            Err(e) => {
                set.abort_all();
                return Err(AppError::Internal(format!("Web research task failed: {}", e)));
            }
        }
    }

    Ok(merged)
}
