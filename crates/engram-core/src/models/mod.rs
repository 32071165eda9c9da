mod edge;
mod extraction;
mod memory_event;
mod node;
mod search;
mod vector_record;

pub use edge::GraphEdge;
pub use extraction::{ExtractedEntity, ExtractedRelationship, Extraction};
pub use memory_event::{event_types, MemoryEvent};
pub use node::{GraphNode, NodeStatus};
pub use search::{GraphFragment, GraphPage, PathResult, SearchHit};
pub use vector_record::VectorRecord;
