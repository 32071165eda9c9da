//! Chat-completion HTTP client with a JSON-mode toggle.

use serde::{Deserialize, Serialize};

use engram_core::config::ExtractionConfig;
use engram_core::errors::{EngramError, EngramResult, ExtractionError};

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatContent,
}

#[derive(Deserialize)]
struct ChatContent {
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

/// Thin client over the chat-completion endpoint.
pub struct LlmClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    json_mode: bool,
}

impl LlmClient {
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            json_mode: config.json_mode,
        }
    }

    /// Run one completion and return the raw (unsanitized) text.
    pub async fn complete(&self, system: &str, user: &str) -> EngramResult<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            response_format: self
                .json_mode
                .then(|| serde_json::json!({"type": "json_object"})),
        };

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            EngramError::Extraction(ExtractionError::RequestFailed {
                message: e.to_string(),
            })
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EngramError::Extraction(ExtractionError::BadStatus {
                status: status.as_u16(),
                body,
            }));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            EngramError::Extraction(ExtractionError::UnparsableOutput {
                reason: e.to_string(),
            })
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| {
                EngramError::Extraction(ExtractionError::UnparsableOutput {
                    reason: "response contained no choices".to_string(),
                })
            })
    }
}
