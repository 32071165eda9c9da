//! GraphQueryEngine — validated, tenant-scoped entry points over the
//! traversal and scan queries.

use std::sync::Arc;

use tracing::debug;

use engram_core::errors::{EngramError, EngramResult};
use engram_core::models::{GraphFragment, GraphPage, PathResult};
use engram_core::validate::{validate_name, validate_tenant};
use engram_storage::GraphStore;

use crate::{scan, traversal};

/// The graph query engine. Validates every externally supplied identifier
/// before it reaches a query, then routes reads through the store's read
/// path.
pub struct GraphQueryEngine {
    store: Arc<GraphStore>,
}

impl GraphQueryEngine {
    pub fn new(store: Arc<GraphStore>) -> Self {
        Self { store }
    }

    /// Bounded outgoing-edge expansion rooted at `start_name`.
    pub fn subgraph(
        &self,
        start_name: &str,
        tenant: &str,
        max_depth: i64,
    ) -> EngramResult<GraphFragment> {
        validate_name(start_name)?;
        validate_tenant(tenant)?;
        let depth = validated_depth(max_depth)?;
        debug!(start_name, tenant, depth, "subgraph expansion");
        self.store
            .with_reader(|conn| traversal::subgraph(conn, start_name, tenant, depth))
    }

    /// Bidirectional expansion rooted at `start_name`.
    pub fn deep_context(
        &self,
        start_name: &str,
        tenant: &str,
        max_depth: i64,
    ) -> EngramResult<GraphFragment> {
        validate_name(start_name)?;
        validate_tenant(tenant)?;
        let depth = validated_depth(max_depth)?;
        self.store
            .with_reader(|conn| traversal::deep_context(conn, start_name, tenant, depth))
    }

    /// Shortest outgoing-edge path from `start` to `end`.
    pub fn find_path(
        &self,
        start: &str,
        end: &str,
        tenant: &str,
        max_depth: i64,
    ) -> EngramResult<Option<PathResult>> {
        validate_name(start)?;
        validate_name(end)?;
        validate_tenant(tenant)?;
        let depth = validated_depth(max_depth)?;
        self.store
            .with_reader(|conn| traversal::find_path(conn, start, end, tenant, depth))
    }

    /// Keyword scan over names, content, and types.
    pub fn search_nodes(&self, query: &str, tenant: &str) -> EngramResult<GraphFragment> {
        validate_tenant(tenant)?;
        self.store
            .with_reader(|conn| scan::search_nodes(conn, query, tenant))
    }

    /// Paged dump of a tenant's graph.
    pub fn read_graph(&self, tenant: &str, limit: i64, offset: i64) -> EngramResult<GraphPage> {
        validate_tenant(tenant)?;
        if limit < 1 {
            return Err(EngramError::Validation {
                field: "limit".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if offset < 0 {
            return Err(EngramError::Validation {
                field: "offset".to_string(),
                reason: "must not be negative".to_string(),
            });
        }
        self.store
            .with_reader(|conn| scan::read_graph(conn, tenant, limit, offset))
    }
}

fn validated_depth(max_depth: i64) -> EngramResult<i64> {
    if max_depth < 0 {
        return Err(EngramError::Validation {
            field: "max_depth".to_string(),
            reason: "must not be negative".to_string(),
        });
    }
    Ok(max_depth)
}
