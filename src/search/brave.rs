use crate::search::{SearchProvider, SearchResultItem, SearchResults};
use crate::types::{AppError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{error, info, warn};

pub struct BraveSearch {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
    timeout: Duration,
}

impl BraveSearch {
    pub fn new(http: reqwest::Client, api_key: String, endpoint: String, timeout: Duration) -> Self {
        Self {
            http,
            api_key,
            endpoint,
            timeout,
        }
    }

    /// Query the Brave web search endpoint
    pub async fn fetch(&self, query: &str) -> Result<SearchResults> {
        info!("Performing Brave search for query: {}", query);

        let response = self
            .http
            .get(&self.endpoint)
            .query(&[("q", query)])
            .header("Accept", "application/json")
            .header("X-Subscription-Token", &self.api_key)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| AppError::ProviderRequest(format!("Brave search request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::ProviderRequest(format!(
                "Brave search returned {}",
                status
            )));
        }

        let body: BraveResponse = response.json().await.map_err(|e| {
            AppError::ProviderRequest(format!("Error decoding Brave search JSON response: {}", e))
        })?;

        let Some(web) = body.web else {
            warn!("Brave search response did not contain 'web.results'");
            if let Some(warnings) = body.warnings {
                warn!("Brave API warnings: {}", warnings);
            }
            if let Some(errors) = body.errors {
                error!("Brave API errors: {}", errors);
            }
            return Ok(SearchResults::default());
        };

        Ok(SearchResults {
            results: web
                .results
                .into_iter()
                .map(|item| SearchResultItem {
                    url: item.url,
                    title: item.title,
                    snippet: item.description,
                })
                .collect(),
        })
    }
}

#[async_trait]
impl SearchProvider for BraveSearch {
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
        "brave"
    }
}

#[derive(Debug, Deserialize)]
struct BraveResponse {
    #[serde(default)]
    web: Option<BraveWeb>,
    #[serde(default)]
    warnings: Option<serde_json::Value>,
    #[serde(default)]
    errors: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct BraveWeb {
    #[serde(default)]
    results: Vec<BraveResult>,
}

#[derive(Debug, Deserialize)]
struct BraveResult {
    #[serde(default)]
    url: String,
    #[serde(default)]
    title: String,
    #[serde(default, alias = "snippet")]
    description: Option<String>,
}
