//! Integration tests for configuration loading
//!
//! Covers the full precedence chain: per-run override > environment >
//! TOML file > built-in default, plus provider selection on the result.

use deepest::llm::Provider;
use deepest::search::SearchBackend;
use deepest::types::AppError;
use deepest::utils::config::{
    ConfigOverrides, LlmProviderKind, ModelRole, ResearchConfig, SearchApiProvider,
};
use rstest::rstest;
use std::collections::HashMap;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

const SAMPLE_TOML: &str = r#"
query_generator_model = "gemini-file-query"
reflection_model = "gemini-file-reflect"
llm_provider = "google"
gemini_api_key = "file-gemini-key"
search_api_provider = "searxng"
searxng_base_url = "http://searx.local:8080/"
number_of_initial_queries = 5
max_research_loops = 4
search_timeout_secs = 3

[server]
host = "0.0.0.0"
port = 9000
"#;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    file.write_all(contents.as_bytes()).expect("write config");
    file
}

fn no_env(_: &str) -> Option<String> {
    None
}

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name| map.get(name).cloned()
}

#[test]
fn test_load_from_toml_file() {
    let file = write_config(SAMPLE_TOML);
    let config = ResearchConfig::from_toml_file(file.path()).unwrap();

    assert_eq!(config.query_generator_model, "gemini-file-query");
    assert_eq!(config.reflection_model, "gemini-file-reflect");
    assert_eq!(config.search_api_provider, SearchApiProvider::Searxng);
    assert_eq!(config.number_of_initial_queries, 5);
    assert_eq!(config.max_research_loops, 4);
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 9000);
    // Unset keys keep their defaults
    assert_eq!(config.answer_model, ResearchConfig::default().answer_model);
    assert_eq!(config.server.log_level, "info");
}

#[test]
fn test_partial_file_uses_defaults() {
    let file = write_config("max_research_loops = 0\n");
    let config = ResearchConfig::from_toml_file(file.path()).unwrap();

    assert_eq!(config.max_research_loops, 0);
    assert_eq!(config.number_of_initial_queries, 3);
    assert_eq!(config.llm_provider, LlmProviderKind::Google);
    assert_eq!(config.search_api_provider, SearchApiProvider::Google);
}

#[test]
fn test_invalid_toml_is_configuration_error() {
    let file = write_config("number_of_initial_queries = \"many\"\n");
    let err = ResearchConfig::from_toml_file(file.path()).unwrap_err();
    assert!(matches!(err, AppError::Configuration(_)));
}

#[test]
fn test_unreadable_file_is_configuration_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ResearchConfig::from_toml_file(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, AppError::Configuration(ref msg) if msg.contains("absent.toml")));
}

#[test]
fn test_env_beats_file() {
    let file = write_config(SAMPLE_TOML);
    let config = ResearchConfig::from_toml_file(file.path())
        .unwrap()
        .apply_env(env(&[
            ("MAX_RESEARCH_LOOPS", "1"),
            ("SEARCH_API_PROVIDER", "brave"),
            ("SEARCH_API_KEY", "env-brave-key"),
            ("PORT", "7000"),
        ]))
        .unwrap();

    assert_eq!(config.max_research_loops, 1);
    assert_eq!(config.search_api_provider, SearchApiProvider::Brave);
    assert_eq!(config.server.port, 7000);
    // Untouched by the environment
    assert_eq!(config.number_of_initial_queries, 5);
}

#[test]
fn test_override_beats_env_and_file() {
    let file = write_config(SAMPLE_TOML);
    let config = ResearchConfig::from_toml_file(file.path())
        .unwrap()
        .apply_env(env(&[("NUMBER_OF_INITIAL_QUERIES", "2")]))
        .unwrap();

    let resolved = config
        .resolve(&ConfigOverrides {
            number_of_initial_queries: Some(7),
            reasoning_model: Some("gemini-deep".to_string()),
            ..Default::default()
        })
        .unwrap();

    assert_eq!(resolved.number_of_initial_queries, 7);
    assert_eq!(resolved.model_for(ModelRole::Answer), "gemini-deep");
    // The loaded configuration is not mutated
    assert_eq!(config.number_of_initial_queries, 2);
    assert_eq!(config.reasoning_model, None);
}

#[test]
fn test_searxng_backend_from_file() {
    let file = write_config(SAMPLE_TOML);
    let config = ResearchConfig::from_toml_file(file.path())
        .unwrap()
        .apply_env(no_env)
        .unwrap();

    assert_eq!(
        config.search_backend().unwrap(),
        SearchBackend::Searxng {
            base_url: "http://searx.local:8080/".to_string(),
            timeout: Duration::from_secs(3),
        }
    );
}

#[test]
fn test_google_llm_from_file() {
    let file = write_config(SAMPLE_TOML);
    let config = ResearchConfig::from_toml_file(file.path()).unwrap();

    match config.llm_provider_for(ModelRole::QueryGeneration).unwrap() {
        Provider::Gemini { api_key, model, .. } => {
            assert_eq!(api_key, "file-gemini-key");
            assert_eq!(model, "gemini-file-query");
        }
        other => panic!("expected Gemini provider, got {:?}", other),
    }
}

#[rstest]
#[case::google_llm(
    ConfigOverrides { llm_provider: Some(LlmProviderKind::Google), ..Default::default() },
    "GEMINI_API_KEY"
)]
#[case::openai_llm(
    ConfigOverrides { llm_provider: Some(LlmProviderKind::OpenAI), ..Default::default() },
    "OPENAI_API_KEY"
)]
#[case::custom_llm(
    ConfigOverrides { llm_provider: Some(LlmProviderKind::Custom), ..Default::default() },
    "LLM_API_BASE_URL"
)]
fn test_missing_llm_credentials(#[case] overrides: ConfigOverrides, #[case] needle: &str) {
    let resolved = ResearchConfig::default().resolve(&overrides).unwrap();
    let err = resolved
        .llm_provider_for(ModelRole::Reflection)
        .unwrap_err();

    match err {
        AppError::Configuration(msg) => assert!(msg.contains(needle), "{}", msg),
        other => panic!("expected configuration error, got {:?}", other),
    }
}

#[rstest]
#[case::google(SearchApiProvider::Google, "GEMINI_API_KEY")]
#[case::brave(SearchApiProvider::Brave, "SEARCH_API_KEY")]
#[case::searxng(SearchApiProvider::Searxng, "SEARXNG_BASE_URL")]
fn test_missing_search_credentials(#[case] provider: SearchApiProvider, #[case] needle: &str) {
    let resolved = ResearchConfig::default()
        .resolve(&ConfigOverrides {
            search_api_provider: Some(provider),
            ..Default::default()
        })
        .unwrap();

    match resolved.search_backend().unwrap_err() {
        AppError::Configuration(msg) => assert!(msg.contains(needle), "{}", msg),
        other => panic!("expected configuration error, got {:?}", other),
    }
}

#[test]
fn test_overrides_deserialize_from_request_json() {
    let overrides: ConfigOverrides = serde_json::from_value(serde_json::json!({
        "llm_provider": "custom",
        "llm_api_base_url": "http://localhost:1234/v1",
        "search_api_provider": "searxng",
        "initial_search_query_count": 1
    }))
    .unwrap();

    assert_eq!(overrides.llm_provider, Some(LlmProviderKind::Custom));
    assert_eq!(overrides.search_api_provider, Some(SearchApiProvider::Searxng));
    assert_eq!(overrides.number_of_initial_queries, Some(1));

    let resolved = ResearchConfig::default().resolve(&overrides).unwrap();
    match resolved.llm_provider_for(ModelRole::QueryGeneration).unwrap() {
        Provider::OpenAI { api_key, api_base, .. } => {
            assert_eq!(api_key, None);
            assert_eq!(api_base, "http://localhost:1234/v1");
        }
        other => panic!("expected OpenAI-compatible provider, got {:?}", other),
    }
}
