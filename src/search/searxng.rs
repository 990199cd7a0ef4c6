use crate::search::{SearchProvider, SearchResultItem, SearchResults};
use crate::types::{AppError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{error, info, warn};

/// Client for a self-hosted SearXNG instance (JSON output must be enabled)
pub struct SearxngSearch {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl SearxngSearch {
    pub fn new(http: reqwest::Client, base_url: String, timeout: Duration) -> Self {
        Self {
            http,
            base_url,
            timeout,
        }
    }

    fn search_url(&self) -> String {
        format!("{}/search", self.base_url.trim_end_matches('/'))
    }

    pub async fn fetch(&self, query: &str) -> Result<SearchResults> {
        info!(
            "Performing SearxNG search for query: {} on instance: {}",
            query, self.base_url
        );

        let response = self
            .http
            .get(self.search_url())
            .query(&[("q", query), ("format", "json")])
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                AppError::ProviderRequest(format!("SearxNG search request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::ProviderRequest(format!(
                "SearxNG search returned {}",
                status
            )));
        }

        let body: SearxngResponse = response.json().await.map_err(|e| {
            AppError::ProviderRequest(format!("Error decoding SearxNG search JSON response: {}", e))
        })?;

        let Some(results) = body.results else {
            warn!("SearxNG search response did not contain 'results'");
            return Ok(SearchResults::default());
        };

        Ok(SearchResults {
            results: results
                .into_iter()
                .map(|item| SearchResultItem {
                    url: item.url,
                    title: item.title,
                    snippet: item.content,
                })
                .collect(),
        })
    }
}

#[async_trait]
impl SearchProvider for SearxngSearch {
    async fn search(&self, query: &str) -> Option<SearchResults> {
        match self.fetch(query).await {
            Ok(results) => Some(results),
            Err(e) => {
                error!("{}", e);
                None
            }
        }
    }

    fn name(&self) -> &str {
        "searxng"
    }
}

#[derive(Debug, Deserialize)]
struct SearxngResponse {
    #[serde(default)]
    results: Option<Vec<SearxngResult>>,
}

#[derive(Debug, Deserialize)]
struct SearxngResult {
    #[serde(default)]
    url: String,
    #[serde(default)]
    title: String,
    /// SearXNG puts the snippet in `content`
    #[serde(default)]
    content: Option<String>,
}
