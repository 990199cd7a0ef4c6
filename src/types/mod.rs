use serde::{Deserialize, Serialize};

use crate::utils::config::ConfigOverrides;

// ============= API Request/Response Types =============

/// Body of `POST /api/research`.
///
/// Either a full conversation (`messages`) or a bare `topic` must be present.
/// All remaining fields are per-run configuration overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchRequest {
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(flatten)]
    pub overrides: ConfigOverrides,
}

impl ResearchRequest {
    /// Conversation to research, synthesizing a single user turn from `topic`
    /// when no messages were supplied.
    pub fn conversation(&self) -> Vec<Message> {
        match (&self.topic, self.messages.is_empty()) {
            (Some(topic), true) => vec![Message::user(topic.clone())],
            _ => self.messages.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchResponse {
    pub answer: String,
    pub sources: Vec<Source>,
    pub research_loops: u32,
    pub queries_run: Vec<String>,
    pub duration_ms: u64,
}

// ============= Conversation Types =============

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: MessageRole,
    pub content: MessageContent,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: MessageContent::Text(text.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// Message body: plain text or a list of typed parts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl MessageContent {
    /// Textual content; structured content concatenates its text parts.
    pub fn text(&self) -> String {
        match self {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Parts(parts) => parts
                .iter()
                .filter_map(|part| match part {
                    ContentPart::Text { text } => Some(text.as_str()),
                    ContentPart::ImageUrl { .. } => None,
                })
                .collect::<Vec<_>>()
                .join(""),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: serde_json::Value },
}

// ============= Source Types =============

/// A cited source gathered during web research.
///
/// `short_ref` is the compact token the model sees in research summaries;
/// finalization rewrites it back to `url`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Source {
    pub id: String,
    pub title: String,
    pub url: String,
    pub short_ref: String,
    pub segments: Vec<Segment>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Segment {
    pub text: String,
    pub url: String,
    pub title: String,
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Missing or invalid configuration for the selected provider
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A single search request failed; recovered locally by callers
    #[error("Provider request error: {0}")]
    ProviderRequest(String),

    #[error("LLM error: {0}")]
    LLM(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::Configuration(msg) => (axum::http::StatusCode::BAD_REQUEST, msg),
            AppError::ProviderRequest(msg) => (axum::http::StatusCode::BAD_GATEWAY, msg),
            AppError::LLM(msg) => (axum::http::StatusCode::BAD_GATEWAY, msg),
            AppError::InvalidInput(msg) => (axum::http::StatusCode::BAD_REQUEST, msg),
            AppError::Internal(msg) => (axum::http::StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_content_concatenates_text_parts() {
        let content: MessageContent = serde_json::from_value(serde_json::json!([
            {"type": "text", "text": "capital of "},
            {"type": "image_url", "image_url": {"url": "http://img"}},
            {"type": "text", "text": "France"}
        ]))
        .unwrap();

        assert_eq!(content.text(), "capital of France");
    }

    #[test]
    fn test_request_topic_becomes_user_message() {
        let request: ResearchRequest = serde_json::from_value(serde_json::json!({
            "topic": "rust async runtimes",
            "max_research_loops": 1
        }))
        .unwrap();

        let conversation = request.conversation();
        assert_eq!(conversation, vec![Message::user("rust async runtimes")]);
        assert_eq!(request.overrides.max_research_loops, Some(1));
    }
}
