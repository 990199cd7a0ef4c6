//! Mock implementations for testing.
//!
//! Scripted LLM, grounded search and search provider doubles plus the
//! factories that hand them to a [`ResearchCoordinator`] run, so research
//! flows can be exercised without any network access.

#![allow(dead_code)]

use async_trait::async_trait;
use deepest::llm::{
    GroundedResponse, GroundedSearchClient, LLMClient, LLMClientFactoryTrait, Provider,
};
use deepest::search::{
    SearchBackend, SearchProvider, SearchProviderFactory, SearchResultItem, SearchResults,
};
use deepest::types::{AppError, Result};
use deepest::utils::config::{ResearchConfig, SearchApiProvider};
use deepest::{ResearchCoordinator, ResearchPorts};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

/// Which step a scripted failure should hit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailAt {
    QueryGeneration,
    Reflection,
    Answer,
}

/// How the mock writes the final answer
#[derive(Debug, Clone)]
pub enum AnswerScript {
    Fixed(String),
    /// Cite every URL that appears in the answer prompt
    CiteEverything,
}

/// Mock LLM client with scripted structured responses.
///
/// Structured calls are routed by the requested schema: a schema with a
/// `queries` property gets the query list, anything else gets the next
/// scripted reflection. Once the reflections run out every further
/// reflection reports sufficient evidence.
pub struct MockLLMClient {
    queries: Value,
    reflections: Mutex<VecDeque<Value>>,
    answer: AnswerScript,
    fail_at: Option<FailAt>,
    prompts: Mutex<Vec<String>>,
}

impl MockLLMClient {
    /// Client that proposes `queries` and writes `answer`
    pub fn new(queries: &[&str], answer: AnswerScript) -> Self {
        let queries: Vec<Value> = queries
            .iter()
            .map(|q| json!({"query": q, "rationale": "mock rationale"}))
            .collect();
        Self {
            queries: json!({ "queries": queries }),
            reflections: Mutex::new(VecDeque::new()),
            answer,
            fail_at: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Queue a reflection verdict
    pub fn reflect(self, is_sufficient: bool, follow_ups: &[&str]) -> Self {
        let gap = if is_sufficient { "" } else { "needs more detail" };
        self.reflections.lock().push_back(json!({
            "is_sufficient": is_sufficient,
            "knowledge_gap": gap,
            "follow_up_queries": follow_ups,
        }));
        self
    }

    pub fn failing_at(mut self, step: FailAt) -> Self {
        self.fail_at = Some(step);
        self
    }

    /// Prompts received so far, in call order
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    /// Prompts of the reflection calls
    pub fn reflection_prompts(&self) -> Vec<String> {
        self.prompts()
            .into_iter()
            .filter(|p| p.starts_with("You are an expert research assistant"))
            .collect()
    }

    fn fail(&self, step: FailAt) -> Result<()> {
        if self.fail_at == Some(step) {
            return Err(AppError::LLM(format!("Mock LLM failure at {:?}", step)));
        }
        Ok(())
    }
}

#[async_trait]
impl LLMClient for MockLLMClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().push(prompt.to_string());
        self.fail(FailAt::Answer)?;

        match &self.answer {
            AnswerScript::Fixed(text) => Ok(text.clone()),
            AnswerScript::CiteEverything => {
                let urls = urls_in(prompt);
                Ok(format!("Here is what I found: {}", urls.join(" ; ")))
            }
        }
    }

    async fn generate_json(&self, prompt: &str, schema: &Value) -> Result<Value> {
        self.prompts.lock().push(prompt.to_string());

        if schema["properties"].get("queries").is_some() {
            self.fail(FailAt::QueryGeneration)?;
            return Ok(self.queries.clone());
        }

        self.fail(FailAt::Reflection)?;
        Ok(self.reflections.lock().pop_front().unwrap_or_else(|| {
            json!({"is_sufficient": true, "knowledge_gap": "", "follow_up_queries": []})
        }))
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}

/// Every `http...` token in `text`, trimmed of surrounding punctuation
pub fn urls_in(text: &str) -> Vec<String> {
    text.split_whitespace()
        .filter_map(|word| word.find("http").map(|at| &word[at..]))
        .map(|url| url.trim_end_matches(|c: char| matches!(c, ')' | ']' | ',' | ';')))
        .map(str::to_string)
        .collect()
}

/// Grounded search double returning canned responses keyed by query text.
#[derive(Default)]
pub struct MockGrounded {
    responses: Vec<(String, GroundedResponse)>,
    fail: bool,
}

impl MockGrounded {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer prompts mentioning `query` with `response`
    pub fn on(mut self, query: &str, response: GroundedResponse) -> Self {
        self.responses.push((query.to_string(), response));
        self
    }

    pub fn failing() -> Self {
        Self {
            responses: Vec::new(),
            fail: true,
        }
    }
}

#[async_trait]
impl GroundedSearchClient for MockGrounded {
    async fn generate_grounded(&self, prompt: &str) -> Result<GroundedResponse> {
        if self.fail {
            return Err(AppError::LLM("grounded search unavailable".to_string()));
        }
        Ok(self
            .responses
            .iter()
            .find(|(query, _)| prompt.contains(&format!("\"{}\"", query)))
            .map(|(_, response)| response.clone())
            .unwrap_or_default())
    }
}

/// Mock LLM factory sharing one scripted client across every step.
///
/// Records the model requested for each client so tests can check model
/// selection.
pub struct MockLLMFactory {
    client: Arc<MockLLMClient>,
    grounded: Option<Arc<MockGrounded>>,
    models: Mutex<Vec<String>>,
}

impl MockLLMFactory {
    pub fn new(client: Arc<MockLLMClient>) -> Self {
        Self {
            client,
            grounded: None,
            models: Mutex::new(Vec::new()),
        }
    }

    pub fn with_grounded(mut self, grounded: MockGrounded) -> Self {
        self.grounded = Some(Arc::new(grounded));
        self
    }

    /// Models requested so far, in call order
    pub fn models(&self) -> Vec<String> {
        self.models.lock().clone()
    }
}

impl LLMClientFactoryTrait for MockLLMFactory {
    fn create_client(&self, provider: &Provider) -> Result<Arc<dyn LLMClient>> {
        self.models.lock().push(provider.model().to_string());
        let client: Arc<dyn LLMClient> = self.client.clone();
        Ok(client)
    }

    fn create_grounded(&self, provider: &Provider) -> Result<Arc<dyn GroundedSearchClient>> {
        match (provider, &self.grounded) {
            (Provider::Gemini { .. }, Some(grounded)) => {
                let grounded: Arc<dyn GroundedSearchClient> = grounded.clone();
                Ok(grounded)
            }
            _ => Err(AppError::Configuration(
                "no grounded search configured".to_string(),
            )),
        }
    }
}

/// Mock search provider.
///
/// Unscripted queries return one hit at `https://example.com/<query-slug>`.
#[derive(Default)]
pub struct MockSearchProvider {
    scripted: HashMap<String, Option<SearchResults>>,
    delays: HashMap<String, Duration>,
    calls: Mutex<Vec<String>>,
}

impl MockSearchProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, query: &str, results: Vec<SearchResultItem>) -> Self {
        self.scripted
            .insert(query.to_string(), Some(SearchResults { results }));
        self
    }

    /// Simulate a failed request for `query`
    pub fn failing_on(mut self, query: &str) -> Self {
        self.scripted.insert(query.to_string(), None);
        self
    }

    pub fn delay(mut self, query: &str, millis: u64) -> Self {
        self.delays
            .insert(query.to_string(), Duration::from_millis(millis));
        self
    }

    /// Queries searched so far, in completion order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl SearchProvider for MockSearchProvider {
    async fn search(&self, query: &str) -> Option<SearchResults> {
        if let Some(delay) = self.delays.get(query) {
            tokio::time::sleep(*delay).await;
        }
        self.calls.lock().push(query.to_string());

        match self.scripted.get(query) {
            Some(results) => results.clone(),
            None => Some(SearchResults {
                results: vec![item(
                    &format!("https://example.com/{}", slug(query)),
                    query,
                    &format!("Notes about {}", query),
                )],
            }),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Mock search factory handing out one shared provider
pub struct MockSearchFactory {
    provider: Arc<MockSearchProvider>,
    backends: Mutex<Vec<String>>,
}

impl MockSearchFactory {
    pub fn new(provider: Arc<MockSearchProvider>) -> Self {
        Self {
            provider,
            backends: Mutex::new(Vec::new()),
        }
    }

    pub fn backends(&self) -> Vec<String> {
        self.backends.lock().clone()
    }
}

impl SearchProviderFactory for MockSearchFactory {
    fn create_provider(&self, backend: &SearchBackend) -> Result<Arc<dyn SearchProvider>> {
        self.backends.lock().push(backend.name().to_string());
        let provider: Arc<dyn SearchProvider> = self.provider.clone();
        Ok(provider)
    }
}

// ============= Helpers =============

pub fn item(url: &str, title: &str, snippet: &str) -> SearchResultItem {
    SearchResultItem {
        url: url.to_string(),
        title: title.to_string(),
        snippet: Some(snippet.to_string()),
    }
}

pub fn slug(query: &str) -> String {
    query.to_lowercase().replace(' ', "-")
}

/// Config with credentials for the Google LLM and Brave search
pub fn test_config() -> ResearchConfig {
    ResearchConfig {
        gemini_api_key: Some("test-gemini-key".to_string()),
        search_api_provider: SearchApiProvider::Brave,
        search_api_key: Some("test-brave-key".to_string()),
        ..ResearchConfig::default()
    }
}

/// Everything a test needs to drive and inspect one coordinator
pub struct Harness {
    pub llm: Arc<MockLLMClient>,
    pub llm_factory: Arc<MockLLMFactory>,
    pub search: Arc<MockSearchProvider>,
    pub search_factory: Arc<MockSearchFactory>,
    pub coordinator: ResearchCoordinator,
}

impl Harness {
    pub fn new(config: ResearchConfig, llm: MockLLMClient, search: MockSearchProvider) -> Self {
        Self::build(config, llm, search, None)
    }

    pub fn grounded(config: ResearchConfig, llm: MockLLMClient, grounded: MockGrounded) -> Self {
        Self::build(config, llm, MockSearchProvider::new(), Some(grounded))
    }

    fn build(
        config: ResearchConfig,
        llm: MockLLMClient,
        search: MockSearchProvider,
        grounded: Option<MockGrounded>,
    ) -> Self {
        let llm = Arc::new(llm);
        let mut factory = MockLLMFactory::new(llm.clone());
        if let Some(grounded) = grounded {
            factory = factory.with_grounded(grounded);
        }
        let llm_factory = Arc::new(factory);
        let search = Arc::new(search);
        let search_factory = Arc::new(MockSearchFactory::new(search.clone()));

        let ports = ResearchPorts::new(llm_factory.clone(), search_factory.clone());
        let coordinator = ResearchCoordinator::new(Arc::new(config), ports);

        Self {
            llm,
            llm_factory,
            search,
            search_factory,
            coordinator,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_in_strips_markdown() {
        let text = "See [wiki](https://a.example/x) and https://b.example/y, then http://c.";
        assert_eq!(
            urls_in(text),
            vec!["https://a.example/x", "https://b.example/y", "http://c."]
        );
    }

    #[tokio::test]
    async fn test_mock_search_defaults() {
        let provider = MockSearchProvider::new().failing_on("broken");
        assert!(provider.search("broken").await.is_none());

        let results = provider.search("Rust Async").await.unwrap();
        assert_eq!(results.results[0].url, "https://example.com/rust-async");
        assert_eq!(provider.calls(), vec!["broken", "Rust Async"]);
    }
}
