//! Tool-surface facade: the boundary the RPC layer calls.
//!
//! Enforces the per-call input limits and the per-tenant rate limiter,
//! then delegates. Transport framing and error rendering (via
//! `EngramError::to_user_friendly`) belong to the host.

use std::sync::Arc;

use engram_core::config::RateLimitConfig;
use engram_core::constants::{
    MAX_HYBRID_DEPTH, MAX_QUERY_LEN, MAX_READ_LIMIT, MAX_TENANT_LEN, MAX_TEXT_LEN,
};
use engram_core::errors::{EngramError, EngramResult};
use engram_core::models::{GraphFragment, GraphPage, SearchHit};
use engram_core::validate::validate_tenant;
use engram_graph::GraphQueryEngine;

use crate::manager::{HybridAnswer, MemoryManager};
use crate::rate_limit::RateLimiter;

/// The tool surface.
pub struct ToolSurface {
    manager: Arc<MemoryManager>,
    graph: Arc<GraphQueryEngine>,
    limiter: RateLimiter,
}

impl ToolSurface {
    pub fn new(
        manager: Arc<MemoryManager>,
        graph: Arc<GraphQueryEngine>,
        rate_limit: RateLimitConfig,
    ) -> Self {
        Self {
            manager,
            graph,
            limiter: RateLimiter::new(rate_limit),
        }
    }

    /// `add_memory(text, tenant, metadata_json)` → node name.
    pub async fn add_memory(
        &self,
        text: &str,
        tenant: &str,
        metadata_json: &str,
    ) -> EngramResult<String> {
        self.admit(tenant)?;
        bounded("text", text, MAX_TEXT_LEN)?;

        let metadata = if metadata_json.trim().is_empty() {
            serde_json::json!({})
        } else {
            serde_json::from_str(metadata_json)?
        };
        self.manager.add_memory(text, tenant, metadata).await
    }

    /// `search_memory(query, tenant)` → ranked hits with 1-hop context.
    pub async fn search_memory(&self, query: &str, tenant: &str) -> EngramResult<Vec<SearchHit>> {
        self.admit(tenant)?;
        bounded("query", query, MAX_QUERY_LEN)?;
        self.manager.search(query, tenant).await
    }

    /// `hybrid_search(query, tenant, depth)` → hits plus optional summary.
    pub async fn hybrid_search(
        &self,
        query: &str,
        tenant: &str,
        depth: i64,
    ) -> EngramResult<HybridAnswer> {
        self.admit(tenant)?;
        bounded("query", query, MAX_QUERY_LEN)?;
        if !(1..=MAX_HYBRID_DEPTH).contains(&depth) {
            return Err(EngramError::Validation {
                field: "depth".to_string(),
                reason: format!("must be between 1 and {MAX_HYBRID_DEPTH}"),
            });
        }
        self.manager.hybrid_search(query, tenant, depth).await
    }

    /// `search_nodes(query, tenant)` → keyword-scan fragment.
    pub async fn search_nodes(&self, query: &str, tenant: &str) -> EngramResult<GraphFragment> {
        self.admit(tenant)?;
        bounded("query", query, MAX_QUERY_LEN)?;
        self.graph.search_nodes(query, tenant)
    }

    /// `read_graph(tenant, limit, offset)` → one page of the graph.
    pub async fn read_graph(
        &self,
        tenant: &str,
        limit: i64,
        offset: i64,
    ) -> EngramResult<GraphPage> {
        self.admit(tenant)?;
        if !(1..=MAX_READ_LIMIT).contains(&limit) {
            return Err(EngramError::Validation {
                field: "limit".to_string(),
                reason: format!("must be between 1 and {MAX_READ_LIMIT}"),
            });
        }
        self.graph.read_graph(tenant, limit, offset)
    }

    fn admit(&self, tenant: &str) -> EngramResult<()> {
        validate_tenant(tenant)?;
        bounded("tenant", tenant, MAX_TENANT_LEN)?;
        self.limiter.check(tenant)
    }
}

fn bounded(field: &str, value: &str, max: usize) -> EngramResult<()> {
    if value.chars().count() > max {
        return Err(EngramError::Validation {
            field: field.to_string(),
            reason: format!("must be at most {max} characters"),
        });
    }
    Ok(())
}
