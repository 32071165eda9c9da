use serde::{Deserialize, Serialize};

/// LLM collaborator configuration for entity extraction and summaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Chat-completion endpoint URL.
    pub endpoint: String,
    pub api_key: Option<String>,
    pub model: String,
    /// Request JSON-mode output from the endpoint.
    pub json_mode: bool,
    /// Synthesize an LLM summary for hybrid-search results.
    pub summarize_results: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8877/v1/chat/completions".to_string(),
            api_key: None,
            model: "extraction-small".to_string(),
            json_mode: true,
            summarize_results: false,
        }
    }
}
