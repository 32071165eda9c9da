use serde::{Deserialize, Serialize};

use super::{GraphEdge, GraphNode};

/// A connected piece of the graph: a deduplicated node set plus every edge
/// whose endpoints are both in the set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphFragment {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl GraphFragment {
    /// Whether the fragment contains nothing.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

/// One hybrid-search result: the stored memory text, its vector similarity,
/// and the graph context around its anchor.
///
/// `context` is `None` when the anchor node is not yet in the graph — the
/// background processor has not completed, or it failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub memory: String,
    pub similarity: f64,
    pub node_name: String,
    pub context: Option<GraphFragment>,
}

/// A shortest-path answer: the rendered path and its depth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathResult {
    /// `start -> a -> b -> end` rendering.
    pub path: String,
    pub depth: i64,
}

/// One page of a tenant's graph, edges restricted to the page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphPage {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub limit: i64,
    pub offset: i64,
}
