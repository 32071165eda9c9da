//! # engram-extraction
//!
//! The LLM collaborator: chat-completion client, raw-output sanitization,
//! tolerant entity/relationship extraction, and result summarization.

pub mod client;
pub mod extractor;
pub mod sanitize;
pub mod summarizer;

pub use client::LlmClient;
pub use extractor::LlmEntityExtractor;
pub use summarizer::LlmSummarizer;
