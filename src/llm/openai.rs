use crate::llm::client::{parse_json_text, with_retries, LLMClient, ModelParams};
use crate::types::{AppError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

/// Client for the OpenAI API and OpenAI-compatible `/chat/completions` servers
pub struct OpenAIClient {
    http: reqwest::Client,
    api_key: Option<String>,
    api_base: String,
    model: String,
    params: ModelParams,
}

impl OpenAIClient {
    pub fn new(
        http: reqwest::Client,
        api_key: Option<String>,
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
        format!("{}/chat/completions", self.api_base.trim_end_matches('/'))
    }

    fn request_body(&self, prompt: &str) -> Value {
        json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": self.params.temperature
        })
    }

    async fn chat(&self, body: &Value) -> Result<String> {
        with_retries(self.params.max_retries, "OpenAI", || async move {
            let mut request = self.http.post(self.endpoint()).json(body);
            if let Some(key) = &self.api_key {
                request = request.bearer_auth(key);
            }

            let response = request
                .send()
                .await
                .map_err(|e| AppError::LLM(format!("OpenAI request failed: {}", e)))?;

            if !response.status().is_success() {
                let status = response.status();
                let text = response.text().await.unwrap_or_default();
                return Err(AppError::LLM(format!(
                    "OpenAI API error ({}) for model {}: {}",
                    status, self.model, text
                )));
            }

            let completion: ChatCompletionResponse = response
                .json()
                .await
                .map_err(|e| AppError::LLM(format!("Failed to parse OpenAI response: {}", e)))?;

            completion
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.message.content)
                .ok_or_else(|| AppError::LLM("No response from OpenAI".to_string()))
        })
        .await
    }
}

#[async_trait]
impl LLMClient for OpenAIClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.chat(&self.request_body(prompt)).await
    }

    /// JSON mode: the schema travels in the prompt, `response_format` forces
    /// a JSON object back
    async fn generate_json(&self, prompt: &str, schema: &Value) -> Result<Value> {
        let prompt = format!(
            "{}\n\nRespond only with a JSON object that conforms to this JSON schema:\n{}",
            prompt, schema
        );
        let mut body = self.request_body(&prompt);
        body["response_format"] = json!({ "type": "json_object" });

        let text = self.chat(&body).await?;
        parse_json_text(&self.model, &text)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}
