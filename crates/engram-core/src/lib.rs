//! # engram-core
//!
//! Foundation crate for the Engram memory engine.
//! Defines all types, traits, errors, config, validation, and constants.
//! Every other crate in the workspace depends on this.

pub mod config;
pub mod constants;
pub mod errors;
pub mod models;
pub mod redact;
pub mod traits;
pub mod validate;

// Re-export the most commonly used types at the crate root.
pub use config::EngramConfig;
pub use errors::{EngramError, EngramResult};
pub use models::{GraphEdge, GraphNode, MemoryEvent, NodeStatus, VectorRecord};
