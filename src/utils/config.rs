//! Research configuration
//!
//! Values are layered, lowest precedence first:
//!
//! 1. built-in defaults
//! 2. an optional TOML file (`deepest.toml`)
//! 3. environment variables (upper-cased field names, `.env` honoured)
//! 4. per-run [`ConfigOverrides`] supplied with a research request
//!
//! Credentials are only checked when a step selects its provider through
//! [`ResearchConfig::llm_provider_for`] or [`ResearchConfig::search_backend`],
//! so a config with missing keys still loads and can be used with mocks.

use crate::llm::{ModelParams, Provider};
use crate::search::SearchBackend;
use crate::types::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

// ============= Provider Names =============

/// LLM backend used for query generation, reflection and the final answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProviderKind {
    #[default]
    Google,
    #[serde(rename = "openai")]
    OpenAI,
    /// Any OpenAI-compatible endpoint reached through `llm_api_base_url`
    Custom,
}

impl LlmProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmProviderKind::Google => "google",
            LlmProviderKind::OpenAI => "openai",
            LlmProviderKind::Custom => "custom",
        }
    }
}

impl fmt::Display for LlmProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LlmProviderKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "google" => Ok(LlmProviderKind::Google),
            "openai" => Ok(LlmProviderKind::OpenAI),
            "custom" => Ok(LlmProviderKind::Custom),
            other => Err(AppError::Configuration(format!(
                "Unsupported LLM provider: {}",
                other
            ))),
        }
    }
}

/// Backend used by the web research step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchApiProvider {
    /// Gemini with the `google_search` grounding tool
    #[default]
    Google,
    Brave,
    Searxng,
}

impl SearchApiProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchApiProvider::Google => "google",
            SearchApiProvider::Brave => "brave",
            SearchApiProvider::Searxng => "searxng",
        }
    }
}

impl fmt::Display for SearchApiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchApiProvider {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "google" => Ok(SearchApiProvider::Google),
            "brave" => Ok(SearchApiProvider::Brave),
            "searxng" => Ok(SearchApiProvider::Searxng),
            other => Err(AppError::Configuration(format!(
                "Unsupported search API provider: {}",
                other
            ))),
        }
    }
}

/// Which step a model is being selected for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelRole {
    QueryGeneration,
    Reflection,
    Answer,
}

impl ModelRole {
    fn temperature(&self) -> f32 {
        match self {
            ModelRole::QueryGeneration | ModelRole::Reflection => 1.0,
            ModelRole::Answer => 0.0,
        }
    }
}

// ============= Research Configuration =============

/// Process-wide research configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchConfig {
    #[serde(default = "default_query_generator_model")]
    pub query_generator_model: String,

    #[serde(default = "default_reflection_model")]
    pub reflection_model: String,

    #[serde(default = "default_answer_model")]
    pub answer_model: String,

    /// Reasoning model requested by the caller; replaces the reflection and
    /// answer models when the Google provider is active
    #[serde(default)]
    pub reasoning_model: Option<String>,

    #[serde(default)]
    pub llm_provider: LlmProviderKind,

    #[serde(default)]
    pub llm_api_base_url: Option<String>,

    #[serde(default)]
    pub llm_api_key: Option<String>,

    #[serde(default)]
    pub llm_model_name: Option<String>,

    #[serde(default)]
    pub search_api_provider: SearchApiProvider,

    #[serde(default)]
    pub search_api_key: Option<String>,

    #[serde(default)]
    pub searxng_base_url: Option<String>,

    #[serde(default = "default_number_of_initial_queries")]
    pub number_of_initial_queries: usize,

    #[serde(default = "default_max_research_loops")]
    pub max_research_loops: u32,

    #[serde(default)]
    pub gemini_api_key: Option<String>,

    #[serde(default)]
    pub openai_api_key: Option<String>,

    #[serde(default = "default_gemini_api_base")]
    pub gemini_api_base: String,

    #[serde(default = "default_openai_api_base")]
    pub openai_api_base: String,

    #[serde(default = "default_brave_api_url")]
    pub brave_api_url: String,

    /// Timeout applied to every Brave / SearXNG request
    #[serde(default = "default_search_timeout_secs")]
    pub search_timeout_secs: u64,

    /// Extra attempts after a failed LLM transport call
    #[serde(default = "default_llm_max_retries")]
    pub llm_max_retries: u32,

    #[serde(default)]
    pub server: ServerConfig,
}

fn default_query_generator_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_reflection_model() -> String {
    "gemini-2.5-flash-preview-04-17".to_string()
}

fn default_answer_model() -> String {
    "gemini-2.5-pro-preview-05-06".to_string()
}

fn default_number_of_initial_queries() -> usize {
    3
}

fn default_max_research_loops() -> u32 {
    2
}

fn default_gemini_api_base() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_openai_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_brave_api_url() -> String {
    "https://api.search.brave.com/res/v1/web/search".to_string()
}

fn default_search_timeout_secs() -> u64 {
    10
}

fn default_llm_max_retries() -> u32 {
    2
}

/// Model used for query generation on OpenAI-compatible providers when no
/// `llm_model_name` is configured
const FALLBACK_OPENAI_MODEL: &str = "gpt-3.5-turbo";

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            query_generator_model: default_query_generator_model(),
            reflection_model: default_reflection_model(),
            answer_model: default_answer_model(),
            reasoning_model: None,
            llm_provider: LlmProviderKind::default(),
            llm_api_base_url: None,
            llm_api_key: None,
            llm_model_name: None,
            search_api_provider: SearchApiProvider::default(),
            search_api_key: None,
            searxng_base_url: None,
            number_of_initial_queries: default_number_of_initial_queries(),
            max_research_loops: default_max_research_loops(),
            gemini_api_key: None,
            openai_api_key: None,
            gemini_api_base: default_gemini_api_base(),
            openai_api_base: default_openai_api_base(),
            brave_api_url: default_brave_api_url(),
            search_timeout_secs: default_search_timeout_secs(),
            llm_max_retries: default_llm_max_retries(),
            server: ServerConfig::default(),
        }
    }
}

// ============= Server Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    2024
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

// ============= Per-run Overrides =============

/// Values a single research request may override
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_provider: Option<LlmProviderKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_api_base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_model_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_api_provider: Option<SearchApiProvider>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub searxng_base_url: Option<String>,
    #[serde(
        default,
        alias = "initial_search_query_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub number_of_initial_queries: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_research_loops: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_model: Option<String>,
}

// ============= Loading & Resolution =============

impl ResearchConfig {
    /// Load configuration from an optional TOML file and the process environment
    ///
    /// A missing file is not an error; the defaults are used instead.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let base = match path {
            Some(path) if path.exists() => {
                info!("Loading configuration from {}", path.display());
                Self::from_toml_file(path)?
            }
            Some(path) => {
                debug!("No configuration file at {}, using defaults", path.display());
                Self::default()
            }
            None => Self::default(),
        };

        base.apply_env(|name| std::env::var(name).ok())
    }

    /// Parse a TOML configuration file
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::Configuration(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw)
            .map_err(|e| AppError::Configuration(format!("Invalid configuration file: {}", e)))
    }

    /// Layer environment values on top of this configuration
    ///
    /// `lookup` maps an upper-case variable name to its value; blank values
    /// count as unset.
    pub fn apply_env<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(v) = var("QUERY_GENERATOR_MODEL") {
            self.query_generator_model = v;
        }
        if let Some(v) = var("REFLECTION_MODEL") {
            self.reflection_model = v;
        }
        if let Some(v) = var("ANSWER_MODEL") {
            self.answer_model = v;
        }
        if let Some(v) = var("REASONING_MODEL") {
            self.reasoning_model = Some(v);
        }
        if let Some(v) = var("LLM_PROVIDER") {
            self.llm_provider = v.parse()?;
        }
        if let Some(v) = var("LLM_API_BASE_URL") {
            self.llm_api_base_url = Some(v);
        }
        if let Some(v) = var("LLM_API_KEY") {
            self.llm_api_key = Some(v);
        }
        if let Some(v) = var("LLM_MODEL_NAME") {
            self.llm_model_name = Some(v);
        }
        if let Some(v) = var("SEARCH_API_PROVIDER") {
            self.search_api_provider = v.parse()?;
        }
        if let Some(v) = var("SEARCH_API_KEY") {
            self.search_api_key = Some(v);
        }
        if let Some(v) = var("SEARXNG_BASE_URL") {
            self.searxng_base_url = Some(v);
        }
        if let Some(v) = var("NUMBER_OF_INITIAL_QUERIES") {
            self.number_of_initial_queries = parse_number("NUMBER_OF_INITIAL_QUERIES", &v)?;
        }
        if let Some(v) = var("MAX_RESEARCH_LOOPS") {
            self.max_research_loops = parse_number("MAX_RESEARCH_LOOPS", &v)?;
        }
        if let Some(v) = var("GEMINI_API_KEY") {
            self.gemini_api_key = Some(v);
        }
        if let Some(v) = var("OPENAI_API_KEY") {
            self.openai_api_key = Some(v);
        }
        if let Some(v) = var("GEMINI_API_BASE") {
            self.gemini_api_base = v;
        }
        if let Some(v) = var("OPENAI_API_BASE") {
            self.openai_api_base = v;
        }
        if let Some(v) = var("BRAVE_API_URL") {
            self.brave_api_url = v;
        }
        if let Some(v) = var("SEARCH_TIMEOUT_SECS") {
            self.search_timeout_secs = parse_number("SEARCH_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = var("LLM_MAX_RETRIES") {
            self.llm_max_retries = parse_number("LLM_MAX_RETRIES", &v)?;
        }
        if let Some(v) = var("HOST") {
            self.server.host = v;
        }
        if let Some(v) = var("PORT") {
            self.server.port = parse_number("PORT", &v)?;
        }
        if let Some(v) = var("LOG_LEVEL") {
            self.server.log_level = v;
        }

        Ok(self)
    }

    /// Effective configuration for one run: per-run overrides win over
    /// everything already loaded. Blank strings count as unset.
    pub fn resolve(&self, overrides: &ConfigOverrides) -> Result<Self> {
        let mut resolved = self.clone();

        if let Some(provider) = overrides.llm_provider {
            resolved.llm_provider = provider;
        }
        if let Some(url) = non_blank(&overrides.llm_api_base_url) {
            resolved.llm_api_base_url = Some(url);
        }
        if let Some(key) = non_blank(&overrides.llm_api_key) {
            resolved.llm_api_key = Some(key);
        }
        if let Some(model) = non_blank(&overrides.llm_model_name) {
            resolved.llm_model_name = Some(model);
        }
        if let Some(provider) = overrides.search_api_provider {
            resolved.search_api_provider = provider;
        }
        if let Some(key) = non_blank(&overrides.search_api_key) {
            resolved.search_api_key = Some(key);
        }
        if let Some(url) = non_blank(&overrides.searxng_base_url) {
            resolved.searxng_base_url = Some(url);
        }
        if let Some(count) = overrides.number_of_initial_queries {
            resolved.number_of_initial_queries = count;
        }
        if let Some(loops) = overrides.max_research_loops {
            resolved.max_research_loops = loops;
        }
        if let Some(model) = non_blank(&overrides.reasoning_model) {
            resolved.reasoning_model = Some(model);
        }

        resolved.validate()?;
        Ok(resolved)
    }

    /// Reject values no run can work with
    pub fn validate(&self) -> Result<()> {
        if self.number_of_initial_queries == 0 {
            return Err(AppError::Configuration(
                "number_of_initial_queries must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Model name for a step
    ///
    /// OpenAI-compatible providers prefer `llm_model_name`. The Google
    /// provider lets a per-run reasoning model replace the reflection and
    /// answer models.
    pub fn model_for(&self, role: ModelRole) -> String {
        let configured = match role {
            ModelRole::QueryGeneration => &self.query_generator_model,
            ModelRole::Reflection => &self.reflection_model,
            ModelRole::Answer => &self.answer_model,
        };

        match (self.llm_provider, role) {
            (LlmProviderKind::OpenAI | LlmProviderKind::Custom, ModelRole::QueryGeneration) => self
                .llm_model_name
                .clone()
                .unwrap_or_else(|| FALLBACK_OPENAI_MODEL.to_string()),
            (LlmProviderKind::OpenAI | LlmProviderKind::Custom, _) => self
                .llm_model_name
                .clone()
                .unwrap_or_else(|| configured.clone()),
            (LlmProviderKind::Google, ModelRole::QueryGeneration) => configured.clone(),
            (LlmProviderKind::Google, _) => self
                .reasoning_model
                .clone()
                .unwrap_or_else(|| configured.clone()),
        }
    }

    /// Select and validate the LLM provider for a step
    pub fn llm_provider_for(&self, role: ModelRole) -> Result<Provider> {
        let model = self.model_for(role);
        let params = ModelParams {
            temperature: role.temperature(),
            max_retries: self.llm_max_retries,
        };

        match self.llm_provider {
            LlmProviderKind::Google => {
                let api_key = self
                    .gemini_api_key
                    .clone()
                    .or_else(|| self.llm_api_key.clone())
                    .ok_or_else(|| {
                        AppError::Configuration(
                            "GEMINI_API_KEY is not set, but Google is the configured LLM provider"
                                .to_string(),
                        )
                    })?;
                Ok(Provider::Gemini {
                    api_key,
                    api_base: self.gemini_api_base.clone(),
                    model,
                    params,
                })
            }
            LlmProviderKind::OpenAI => {
                let api_key = self
                    .llm_api_key
                    .clone()
                    .or_else(|| self.openai_api_key.clone())
                    .ok_or_else(|| {
                        AppError::Configuration(
                            "LLM_API_KEY or OPENAI_API_KEY must be set for the OpenAI LLM provider"
                                .to_string(),
                        )
                    })?;
                Ok(Provider::OpenAI {
                    api_key: Some(api_key),
                    api_base: self.openai_api_base.clone(),
                    model,
                    params,
                })
            }
            LlmProviderKind::Custom => {
                let api_base = self.llm_api_base_url.clone().ok_or_else(|| {
                    AppError::Configuration(
                        "LLM_API_BASE_URL must be set for custom LLM provider".to_string(),
                    )
                })?;
                Ok(Provider::OpenAI {
                    api_key: self.llm_api_key.clone(),
                    api_base,
                    model,
                    params,
                })
            }
        }
    }

    /// Select and validate the web research backend
    pub fn search_backend(&self) -> Result<SearchBackend> {
        let timeout = Duration::from_secs(self.search_timeout_secs);

        match self.search_api_provider {
            SearchApiProvider::Google => {
                let api_key = self.gemini_api_key.clone().ok_or_else(|| {
                    AppError::Configuration(
                        "GEMINI_API_KEY must be set for Google Search".to_string(),
                    )
                })?;
                // Grounded search always runs on Gemini, whatever the LLM provider
                Ok(SearchBackend::Google(Provider::Gemini {
                    api_key,
                    api_base: self.gemini_api_base.clone(),
                    model: self.query_generator_model.clone(),
                    params: ModelParams {
                        temperature: 0.0,
                        max_retries: self.llm_max_retries,
                    },
                }))
            }
            SearchApiProvider::Brave => {
                let api_key = self.search_api_key.clone().ok_or_else(|| {
                    AppError::Configuration("SEARCH_API_KEY must be set for Brave Search".to_string())
                })?;
                Ok(SearchBackend::Brave {
                    api_key,
                    endpoint: self.brave_api_url.clone(),
                    timeout,
                })
            }
            SearchApiProvider::Searxng => {
                let base_url = self.searxng_base_url.clone().ok_or_else(|| {
                    AppError::Configuration("SEARXNG_BASE_URL must be set for SearxNG".to_string())
                })?;
                Ok(SearchBackend::Searxng { base_url, timeout })
            }
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.trim().is_empty()).cloned()
}

fn parse_number<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        AppError::Configuration(format!("{} must be a non-negative integer, got '{}'", name, value))
    })
}
