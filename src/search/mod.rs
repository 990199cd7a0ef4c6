//! Web Search Providers
//!
//! The web research step reaches the web through one of three backends:
//!
//! - [`SearchBackend::Google`] - Gemini with search grounding (see
//!   [`crate::llm::GroundedSearchClient`])
//! - [`SearchBackend::Brave`] - [`brave::BraveSearch`]
//! - [`SearchBackend::Searxng`] - [`searxng::SearxngSearch`]
//!
//! Brave and SearXNG sit behind the [`SearchProvider`] port, which never
//! fails: request errors are logged and reported as `None`.

/// Brave Search API client.
pub mod brave;
/// SearXNG instance client.
pub mod searxng;

use crate::llm::Provider;
use crate::types::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

pub use brave::BraveSearch;
pub use searxng::SearxngSearch;

/// A single search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResultItem {
    pub url: String,
    pub title: String,
    pub snippet: Option<String>,
}

/// Ordered hits for one query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    pub results: Vec<SearchResultItem>,
}

/// Search provider port
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Run `query`; `None` means the request failed and callers treat it as empty
    async fn search(&self, query: &str) -> Option<SearchResults>;

    fn name(&self) -> &str;
}

/// Web research backend, selected once per step from configuration
#[derive(Debug, Clone, PartialEq)]
pub enum SearchBackend {
    Google(Provider),
    Brave {
        api_key: String,
        endpoint: String,
        timeout: Duration,
    },
    Searxng {
        base_url: String,
        timeout: Duration,
    },
}

impl SearchBackend {
    pub fn name(&self) -> &'static str {
        match self {
            SearchBackend::Google(_) => "google",
            SearchBackend::Brave { .. } => "brave",
            SearchBackend::Searxng { .. } => "searxng",
        }
    }
}

/// Factory seam for search providers
pub trait SearchProviderFactory: Send + Sync {
    fn create_provider(&self, backend: &SearchBackend) -> Result<Arc<dyn SearchProvider>>;
}

/// Factory producing HTTP-backed search providers
#[derive(Clone, Default)]
pub struct HttpSearchFactory {
    http: reqwest::Client,
}

impl HttpSearchFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_http_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl SearchProviderFactory for HttpSearchFactory {
    fn create_provider(&self, backend: &SearchBackend) -> Result<Arc<dyn SearchProvider>> {
        match backend {
            SearchBackend::Brave {
                api_key,
                endpoint,
                timeout,
            } => Ok(Arc::new(BraveSearch::new(
                self.http.clone(),
                api_key.clone(),
                endpoint.clone(),
                *timeout,
            ))),
            SearchBackend::Searxng { base_url, timeout } => Ok(Arc::new(SearxngSearch::new(
                self.http.clone(),
                base_url.clone(),
                *timeout,
            ))),
            SearchBackend::Google(_) => Err(AppError::Internal(
                "Google search runs through the grounded LLM client".to_string(),
            )),
        }
    }
}
