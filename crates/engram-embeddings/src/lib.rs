//! # engram-embeddings
//!
//! Embedding generation behind a two-tier cache: an in-memory LRU in
//! front of a content-addressed disk store, in front of the configured
//! provider (local or remote HTTP; mock only when asked for explicitly).

pub mod cache;
pub mod engine;
pub mod providers;

pub use engine::EmbeddingEngine;
