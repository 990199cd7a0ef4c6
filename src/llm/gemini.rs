//! Google Gemini client
//!
//! Talks to the `generateContent` REST endpoint directly. Structured calls use
//! `responseMimeType: application/json` with a JSON schema; grounded calls
//! enable the `google_search` tool and return the grounding metadata.

use crate::llm::client::{
    parse_json_text, with_retries, GroundedResponse, GroundedSearchClient, GroundingChunk,
    GroundingSupport, LLMClient, ModelParams,
};
use crate::types::{AppError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    api_base: String,
    model: String,
    params: ModelParams,
}

impl GeminiClient {
    pub fn new(
        http: reqwest::Client,
        api_key: String,
        api_base: String,
        model: String,
        params: ModelParams,
    ) -> Self {
        Self {
            http,
            api_key,
            api_base,
            model,
            params,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.api_base.trim_end_matches('/'),
            self.model
        )
    }

    fn request_body(&self, prompt: &str, generation_config: Value) -> Value {
        json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }]
            }],
            "generationConfig": generation_config
        })
    }

    async fn send(&self, body: &Value) -> Result<GenerateContentResponse> {
        with_retries(self.params.max_retries, "Gemini", || async move {
            let response = self
                .http
                .post(self.endpoint())
                .header("x-goog-api-key", &self.api_key)
                .json(body)
                .send()
                .await
                .map_err(|e| AppError::LLM(format!("Gemini request failed: {}", e)))?;

            if !response.status().is_success() {
                let status = response.status();
                let text = response.text().await.unwrap_or_default();
                return Err(AppError::LLM(format!(
                    "Gemini API error ({}) for model {}: {}",
                    status, self.model, text
                )));
            }

            response
                .json::<GenerateContentResponse>()
                .await
                .map_err(|e| AppError::LLM(format!("Failed to parse Gemini response: {}", e)))
        })
        .await
    }
}

#[async_trait]
impl LLMClient for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let body = self.request_body(prompt, json!({ "temperature": self.params.temperature }));
        let response = self.send(&body).await?;

        response
            .text()
            .ok_or_else(|| AppError::LLM(format!("No response from Gemini model {}", self.model)))
    }

    async fn generate_json(&self, prompt: &str, schema: &Value) -> Result<Value> {
        let body = self.request_body(
            prompt,
            json!({
                "temperature": self.params.temperature,
                "responseMimeType": "application/json",
                "responseJsonSchema": schema
            }),
        );
        let response = self.send(&body).await?;

        let text = response
            .text()
            .ok_or_else(|| AppError::LLM(format!("No response from Gemini model {}", self.model)))?;
        parse_json_text(&self.model, &text)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl GroundedSearchClient for GeminiClient {
    async fn generate_grounded(&self, prompt: &str) -> Result<GroundedResponse> {
        let mut body = self.request_body(prompt, json!({ "temperature": self.params.temperature }));
        body["tools"] = json!([{ "google_search": {} }]);

        let response = self.send(&body).await?;
        Ok(response.into_grounded())
    }
}

// ============= Wire Types =============

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Default, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Default, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<ChunkWire>,
    #[serde(default)]
    grounding_supports: Vec<SupportWire>,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkWire {
    #[serde(default)]
    web: Option<WebChunk>,
}

#[derive(Debug, Default, Deserialize)]
struct WebChunk {
    #[serde(default)]
    uri: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SupportWire {
    #[serde(default)]
    segment: Option<SegmentWire>,
    #[serde(default)]
    grounding_chunk_indices: Vec<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SegmentWire {
    #[serde(default)]
    start_index: Option<usize>,
    #[serde(default)]
    end_index: Option<usize>,
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        Some(text)
    }

    fn into_grounded(self) -> GroundedResponse {
        let text = self.text().unwrap_or_default();
        let metadata = self
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.grounding_metadata)
            .unwrap_or_default();

        // Keep positions aligned with groundingChunkIndices, even for non-web chunks
        let chunks = metadata
            .grounding_chunks
            .into_iter()
            .map(|chunk| {
                let web = chunk.web.unwrap_or_default();
                GroundingChunk {
                    uri: web.uri.unwrap_or_default(),
                    title: web.title.unwrap_or_default(),
                }
            })
            .collect();

        let supports = metadata
            .grounding_supports
            .into_iter()
            .filter_map(|support| {
                let segment = support.segment?;
                let end_index = segment.end_index?;
                Some(GroundingSupport {
                    start_index: segment.start_index.unwrap_or(0),
                    end_index,
                    text: segment.text.unwrap_or_default(),
                    chunk_indices: support.grounding_chunk_indices,
                })
            })
            .collect();

        GroundedResponse {
            text,
            chunks,
            supports,
        }
    }
}
