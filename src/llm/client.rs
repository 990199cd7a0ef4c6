//! LLM client abstractions and provider selection
//!
//! Three capabilities are exposed to the research loop:
//! - **free text**: [`LLMClient::generate`]
//! - **structured**: [`LLMClient::generate_json`], wrapped by [`generate_structured`]
//!   for typed results
//! - **grounded search**: [`GroundedSearchClient::generate_grounded`], Gemini only
//!
//! Clients are built through an [`LLMClientFactoryTrait`] so the research loop
//! never constructs credentialed clients itself and tests can inject mocks.

use crate::types::{AppError, Result};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Generic LLM client trait for provider abstraction
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Generate a free-text completion from a prompt
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Generate a JSON value constrained to `schema` (a JSON Schema document)
    async fn generate_json(
        &self,
        prompt: &str,
        schema: &serde_json::Value,
    ) -> Result<serde_json::Value>;

    /// Get the model name/identifier
    fn model_name(&self) -> &str;
}

/// A model that can answer with search grounding enabled
#[async_trait]
pub trait GroundedSearchClient: Send + Sync {
    async fn generate_grounded(&self, prompt: &str) -> Result<GroundedResponse>;
}

/// Generated text plus the grounding metadata that ties spans to web pages
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroundedResponse {
    pub text: String,
    /// Cited pages; `GroundingSupport::chunk_indices` index into this list
    pub chunks: Vec<GroundingChunk>,
    pub supports: Vec<GroundingSupport>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroundingChunk {
    /// Raw (redirect) URL of the cited page
    pub uri: String,
    pub title: String,
}

/// A span of the generated text backed by one or more chunks
///
/// Offsets are byte offsets into [`GroundedResponse::text`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroundingSupport {
    pub start_index: usize,
    pub end_index: usize,
    pub text: String,
    pub chunk_indices: Vec<usize>,
}

/// Inference parameters shared by every provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelParams {
    pub temperature: f32,
    /// Extra attempts after a failed transport call
    pub max_retries: u32,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            temperature: 1.0,
            max_retries: 2,
        }
    }
}

/// Provider enum for runtime selection
///
/// Built by [`crate::utils::config::ResearchConfig::llm_provider_for`] once
/// per step; OpenAI and custom OpenAI-compatible endpoints share a variant.
#[derive(Debug, Clone, PartialEq)]
pub enum Provider {
    /// Google Gemini (`generativelanguage.googleapis.com`)
    Gemini {
        api_key: String,
        api_base: String,
        model: String,
        params: ModelParams,
    },

    /// OpenAI API or any endpoint speaking `/chat/completions`
    OpenAI {
        api_key: Option<String>,
        api_base: String,
        model: String,
        params: ModelParams,
    },
}

impl Provider {
    /// Create a client instance for this provider
    pub fn create_client(&self, http: &reqwest::Client) -> Arc<dyn LLMClient> {
        match self {
            Provider::Gemini {
                api_key,
                api_base,
                model,
                params,
            } => Arc::new(super::gemini::GeminiClient::new(
                http.clone(),
                api_key.clone(),
                api_base.clone(),
                model.clone(),
                *params,
            )),
            Provider::OpenAI {
                api_key,
                api_base,
                model,
                params,
            } => Arc::new(super::openai::OpenAIClient::new(
                http.clone(),
                api_key.clone(),
                api_base.clone(),
                model.clone(),
                *params,
            )),
        }
    }

    /// Create a grounded search client; only Gemini supports grounding
    pub fn create_grounded(&self, http: &reqwest::Client) -> Result<Arc<dyn GroundedSearchClient>> {
        match self {
            Provider::Gemini {
                api_key,
                api_base,
                model,
                params,
            } => Ok(Arc::new(super::gemini::GeminiClient::new(
                http.clone(),
                api_key.clone(),
                api_base.clone(),
                model.clone(),
                *params,
            ))),
            other => Err(AppError::Configuration(format!(
                "{} does not support grounded search",
                other.name()
            ))),
        }
    }

    /// Get a human-readable name for this provider
    pub fn name(&self) -> &'static str {
        match self {
            Provider::Gemini { .. } => "Gemini",
            Provider::OpenAI { .. } => "OpenAI",
        }
    }

    pub fn model(&self) -> &str {
        match self {
            Provider::Gemini { model, .. } | Provider::OpenAI { model, .. } => model,
        }
    }
}

/// Factory seam between the research loop and concrete providers
pub trait LLMClientFactoryTrait: Send + Sync {
    fn create_client(&self, provider: &Provider) -> Result<Arc<dyn LLMClient>>;

    fn create_grounded(&self, provider: &Provider) -> Result<Arc<dyn GroundedSearchClient>>;
}

/// Factory producing HTTP-backed clients that share one connection pool
#[derive(Clone, Default)]
pub struct LLMClientFactory {
    http: reqwest::Client,
}

impl LLMClientFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_http_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl LLMClientFactoryTrait for LLMClientFactory {
    fn create_client(&self, provider: &Provider) -> Result<Arc<dyn LLMClient>> {
        Ok(provider.create_client(&self.http))
    }

    fn create_grounded(&self, provider: &Provider) -> Result<Arc<dyn GroundedSearchClient>> {
        provider.create_grounded(&self.http)
    }
}

// ============= Structured Output =============

/// JSON Schema for `T` with every subschema inlined
pub fn schema_value<T: JsonSchema>() -> serde_json::Value {
    let schema = schemars::generate::SchemaSettings::draft2020_12()
        .with(|s| s.inline_subschemas = true)
        .into_generator()
        .into_root_schema_for::<T>();

    let mut value = serde_json::to_value(&schema).unwrap_or_default();
    if let Some(obj) = value.as_object_mut() {
        obj.remove("$schema");
    }
    value
}

/// Ask `client` for an instance of `T`
pub async fn generate_structured<T>(client: &dyn LLMClient, prompt: &str) -> Result<T>
where
    T: DeserializeOwned + JsonSchema,
{
    let schema = schema_value::<T>();
    let value = client.generate_json(prompt, &schema).await?;

    serde_json::from_value(value).map_err(|e| {
        AppError::LLM(format!(
            "{} returned output that does not match the expected schema: {}",
            client.model_name(),
            e
        ))
    })
}

/// Strip a Markdown code fence around a JSON payload, if present
pub fn extract_json(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Parse model text as JSON
pub fn parse_json_text(model: &str, text: &str) -> Result<serde_json::Value> {
    serde_json::from_str(extract_json(text))
        .map_err(|e| AppError::LLM(format!("{} returned invalid JSON: {}", model, e)))
}

/// Longest pause between two attempts
const MAX_BACKOFF: Duration = Duration::from_secs(8);

/// Delay before retry number `attempt` (1-based): 250ms doubling, capped
fn backoff_delay(attempt: u32) -> Duration {
    let millis = 2u64
        .saturating_pow(attempt.saturating_sub(1))
        .saturating_mul(250);
    Duration::from_millis(millis).min(MAX_BACKOFF)
}

/// Run `op` with exponential backoff, giving up after `max_retries` extra attempts
pub(crate) async fn with_retries<T, F, Fut>(max_retries: u32, label: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < max_retries => {
                attempt += 1;
                let delay = backoff_delay(attempt);
                tracing::warn!(
                    "{} call failed (attempt {}/{}), retrying in {:?}: {}",
                    label,
                    attempt,
                    max_retries + 1,
                    delay,
                    e
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}
