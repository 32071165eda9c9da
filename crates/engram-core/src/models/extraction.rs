use serde::{Deserialize, Serialize};

/// An entity pulled out of ingested text by the LLM collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedEntity {
    pub name: String,
    /// Defaults to `concept` when the model gives no type.
    #[serde(rename = "type", default)]
    pub entity_type: Option<String>,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// A directed relationship between two extracted entities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedRelationship {
    pub from: String,
    pub to: String,
    /// Verb; lowercased before it becomes an edge type.
    #[serde(rename = "type")]
    pub rel_type: String,
}

/// The full extraction for one memory. Empty on any extraction failure —
/// the memory is still usable without graph enrichment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Extraction {
    pub entities: Vec<ExtractedEntity>,
    pub relationships: Vec<ExtractedRelationship>,
}

impl Extraction {
    /// Whether the extraction found anything.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.relationships.is_empty()
    }
}
