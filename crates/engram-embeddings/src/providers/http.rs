//! HTTP embedding provider, shared by the local model server and the
//! remote hosted API. The wire shape is the same; endpoint, auth, and
//! dimension differ by configuration.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use engram_core::errors::{EmbeddingError, EngramError, EngramResult};
use engram_core::traits::IEmbeddingProvider;

#[derive(Serialize)]
struct EmbedRequest<'a> {
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

/// Provider that POSTs `{"input": text}` and expects `{"embedding": [..]}`.
pub struct HttpProvider {
    name: String,
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    dimensions: usize,
}

impl HttpProvider {
    pub fn new(name: &str, endpoint: &str, api_key: Option<String>, dimensions: usize) -> Self {
        Self {
            name: name.to_string(),
            client: reqwest::Client::new(),
            endpoint: endpoint.to_string(),
            api_key,
            dimensions,
        }
    }

    fn provider_err(&self, message: impl std::fmt::Display) -> EngramError {
        EngramError::Embedding(EmbeddingError::ProviderFailed {
            provider: self.name.clone(),
            message: message.to_string(),
        })
    }
}

#[async_trait]
impl IEmbeddingProvider for HttpProvider {
    async fn embed(&self, text: &str) -> EngramResult<Vec<f32>> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&EmbedRequest { input: text });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| self.provider_err(e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(self.provider_err(format!("status {status}")));
        }

        let body: EmbedResponse = response.json().await.map_err(|e| self.provider_err(e))?;
        if body.embedding.len() != self.dimensions {
            return Err(EngramError::Embedding(EmbeddingError::DimensionMismatch {
                expected: self.dimensions,
                actual: body.embedding.len(),
            }));
        }
        Ok(body.embedding)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        &self.name
    }
}
