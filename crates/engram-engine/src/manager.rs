//! MemoryManager — orchestrates ingest and retrieval.
//!
//! Ingest has a synchronous fast path (PENDING node insert, audit event,
//! session cache, name returned to the caller) and a fire-and-forget
//! background pipeline (embed → vector upsert → extraction → one SQL
//! transaction that enriches the graph and promotes the anchor to READY).
//! Background failures are logged and audited, never propagated; the
//! recovery worker reconciles what they leave behind.

use std::sync::Arc;

use rusqlite::Connection;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use engram_core::constants::{
    DEFAULT_EDGE_TYPE, DEFAULT_NODE_TYPE, DEFAULT_SEARCH_K, MAX_BACKGROUND_TASKS,
    MENTIONS_EDGE_TYPE,
};
use engram_core::errors::{EngramError, EngramResult};
use engram_core::models::{
    event_types, Extraction, GraphFragment, NodeStatus, SearchHit, VectorRecord,
};
use engram_core::traits::{IEntityExtractor, ISummarizer};
use engram_core::validate::validate_tenant;
use engram_embeddings::EmbeddingEngine;
use engram_graph::GraphQueryEngine;
use engram_storage::queries::{edge_ops, event_ops, node_ops};
use engram_storage::{GraphStore, SagaTransaction, TransactionManager};
use engram_vector::VectorStore;

use crate::breaker::BreakerRegistry;
use crate::pool::BackgroundPool;
use crate::session::SessionCache;

/// Breaker name for the embedding collaborator.
pub const EMBEDDING_BREAKER: &str = "embedding";
/// Breaker name for vector-store writes.
pub const VECTOR_BREAKER: &str = "vector-write";
/// Breaker name for the entity extractor.
pub const EXTRACTION_BREAKER: &str = "extraction";

/// A hybrid-search answer: the ranked hits and an optional LLM synthesis.
#[derive(Debug, Clone)]
pub struct HybridAnswer {
    pub hits: Vec<SearchHit>,
    pub summary: Option<String>,
}

/// The memory orchestrator. Cheap to clone; every field is shared.
#[derive(Clone)]
pub struct MemoryManager {
    store: Arc<GraphStore>,
    txn: Arc<TransactionManager>,
    graph: Arc<GraphQueryEngine>,
    vectors: Arc<VectorStore>,
    embeddings: Arc<EmbeddingEngine>,
    extractor: Arc<dyn IEntityExtractor>,
    summarizer: Option<Arc<dyn ISummarizer>>,
    breakers: Arc<BreakerRegistry>,
    session: SessionCache,
    background: Arc<BackgroundPool>,
}

impl MemoryManager {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<GraphStore>,
        txn: Arc<TransactionManager>,
        graph: Arc<GraphQueryEngine>,
        vectors: Arc<VectorStore>,
        embeddings: Arc<EmbeddingEngine>,
        extractor: Arc<dyn IEntityExtractor>,
        summarizer: Option<Arc<dyn ISummarizer>>,
        breakers: Arc<BreakerRegistry>,
    ) -> Self {
        Self {
            store,
            txn,
            graph,
            vectors,
            embeddings,
            extractor,
            summarizer,
            breakers,
            session: SessionCache::new(),
            background: Arc::new(BackgroundPool::new(MAX_BACKGROUND_TASKS)),
        }
    }

    /// Wait for in-flight background work, up to `deadline`. Memories
    /// still unfinished stay PENDING for the recovery worker.
    pub async fn drain_background(&self, deadline: std::time::Duration) {
        self.background.drain(deadline).await;
    }

    /// The session cache (`recent:<tenant>` → last ingested content).
    pub fn session(&self) -> &SessionCache {
        &self.session
    }

    /// Ingest a memory. Returns the generated node name as soon as the
    /// fast path has committed; AI processing continues in the background
    /// and its failure never reaches this caller.
    pub async fn add_memory(
        &self,
        content: &str,
        tenant: &str,
        metadata: serde_json::Value,
    ) -> EngramResult<String> {
        validate_tenant(tenant)?;
        if content.trim().is_empty() {
            return Err(EngramError::Validation {
                field: "content".to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        let vector_id = Uuid::new_v4().to_string();
        let node_name = memory_node_name(&vector_id);

        // Fast path: node + audit event in one transaction, so they are
        // atomic and can never interleave into a background transaction
        // on the shared writer.
        let txn = self.txn.clone();
        let inner = txn.clone();
        let fast = FastPathInsert {
            node_name: node_name.clone(),
            vector_id: vector_id.clone(),
            content: content.to_string(),
            tenant: tenant.to_string(),
            metadata: metadata.clone(),
        };
        txn.execute(move || async move {
            inner.run(|conn| {
                // Forward reference: the vector record does not exist yet.
                node_ops::insert_node(
                    conn,
                    &fast.node_name,
                    "memory",
                    Some(&fast.content),
                    &fast.tenant,
                    Some(&fast.vector_id),
                    &fast.metadata,
                    NodeStatus::Pending,
                )?;
                event_ops::append_event(
                    conn,
                    event_types::MEMORY_ADDED_FAST,
                    &format!("memory {} accepted", fast.node_name),
                    &serde_json::json!({"node": fast.node_name, "vector_id": fast.vector_id}),
                    &fast.tenant,
                )?;
                Ok(())
            })
        })
        .await?;
        self.session.remember(tenant, content);

        let manager = self.clone();
        let task = BackgroundMemory {
            node_name: node_name.clone(),
            vector_id,
            content: content.to_string(),
            tenant: tenant.to_string(),
            metadata,
        };
        self.background.spawn(async move {
            let node = task.node_name.clone();
            let tenant = task.tenant.clone();
            if let Err(e) = manager.process_memory(task).await {
                warn!(node = %node, error = %e, "background memory processing failed");
                let _ = manager.store.append_event(
                    event_types::MEMORY_PROCESSING_FAILED,
                    &format!("background processing failed for {node}"),
                    &serde_json::json!({"error": e.to_user_friendly()}),
                    &tenant,
                );
            }
        });

        Ok(node_name)
    }

    /// The background pipeline for one memory.
    #[instrument(skip(self, task), fields(node = %task.node_name, tenant = %task.tenant))]
    async fn process_memory(&self, task: BackgroundMemory) -> EngramResult<()> {
        let BackgroundMemory {
            node_name,
            vector_id,
            content,
            tenant,
            metadata,
        } = task;
        let mut saga = SagaTransaction::new(vector_id.clone());

        // (a) Embed through breaker + cache.
        let embeddings = self.embeddings.clone();
        let text = content.clone();
        let vector = self
            .breakers
            .get(EMBEDDING_BREAKER)
            .call(move || async move { embeddings.embed(&text).await })
            .await?;

        // (b) Commit the vector side first (see the compensation below for
        // how it is undone if the SQL side aborts).
        let record = VectorRecord {
            id: vector_id.clone(),
            vector,
            text: content.clone(),
            tenant: tenant.clone(),
            timestamp: chrono::Utc::now().timestamp(),
            node_name: node_name.clone(),
            metadata: serde_json::to_string(&metadata)?,
        };
        let vectors = self.vectors.clone();
        self.breakers
            .get(VECTOR_BREAKER)
            .call(move || async move { vectors.upsert(&record) })
            .await?;
        saga.record_vector(vector_id.clone());

        // (c) Extraction is a tolerated failure: the memory stays usable
        // without graph enrichment. The breaker still counts the failure.
        let extractor = self.extractor.clone();
        let text = content.clone();
        let extraction = match self
            .breakers
            .get(EXTRACTION_BREAKER)
            .call(move || async move { extractor.extract(&text).await })
            .await
        {
            Ok(extraction) => extraction,
            Err(e) => {
                warn!(error = %e, "extraction failed, continuing with empty sets");
                Extraction::default()
            }
        };

        // (d) One outer transaction: compensating vector delete registered
        // before any SQL, then graph enrichment and promotion to READY.
        let txn = self.txn.clone();
        let inner = txn.clone();
        let vectors = self.vectors.clone();
        let vid = vector_id.clone();
        let anchor_name = node_name.clone();
        let txn_tenant = tenant.clone();
        let result = txn
            .execute(move || async move {
                inner.register_compensation(
                    "remove vector record for aborted graph enrichment",
                    move || async move { vectors.delete_ids(&[vid]).map(|_| ()) },
                )?;
                inner.run(|conn| enrich_graph(conn, &anchor_name, &txn_tenant, &extraction))
            })
            .await;

        match result {
            Ok(()) => {
                saga.mark_committed();
                info!(vectors = saga.vector_ids.len(), "memory processed");
                self.store.append_event(
                    event_types::MEMORY_PROCESSED,
                    &format!("memory {node_name} promoted to READY"),
                    &serde_json::json!({"node": node_name}),
                    &tenant,
                )?;
                Ok(())
            }
            Err(e) => {
                saga.mark_rolled_back();
                Err(e)
            }
        }
    }

    /// Semantic search with 1-hop graph hydration and the default k.
    pub async fn search(&self, query: &str, tenant: &str) -> EngramResult<Vec<SearchHit>> {
        self.search_with_depth(query, tenant, 1, DEFAULT_SEARCH_K).await
    }

    /// Semantic search with caller-chosen subgraph depth, plus an optional
    /// LLM summary when a summarizer is configured.
    pub async fn hybrid_search(
        &self,
        query: &str,
        tenant: &str,
        depth: i64,
    ) -> EngramResult<HybridAnswer> {
        let hits = self.search_with_depth(query, tenant, depth, DEFAULT_SEARCH_K).await?;

        let summary = match &self.summarizer {
            Some(summarizer) if !hits.is_empty() => {
                let fragments: Vec<GraphFragment> =
                    hits.iter().filter_map(|hit| hit.context.clone()).collect();
                match summarizer.summarize(query, &fragments).await {
                    Ok(text) => Some(text),
                    Err(e) => {
                        warn!(error = %e, "summary synthesis failed, returning hits only");
                        None
                    }
                }
            }
            _ => None,
        };

        Ok(HybridAnswer { hits, summary })
    }

    async fn search_with_depth(
        &self,
        query: &str,
        tenant: &str,
        depth: i64,
        k: usize,
    ) -> EngramResult<Vec<SearchHit>> {
        validate_tenant(tenant)?;
        if query.trim().is_empty() {
            return Err(EngramError::Validation {
                field: "query".to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        let embeddings = self.embeddings.clone();
        let text = query.to_string();
        let embedding = self
            .breakers
            .get(EMBEDDING_BREAKER)
            .call(move || async move { embeddings.embed(&text).await })
            .await?;

        let matches = self.vectors.search(&embedding, tenant, k, None)?;

        let mut hits = Vec::with_capacity(matches.len());
        for (record, similarity) in matches {
            // Hydrate the anchor by its vector handle. A miss means the
            // background processor has not completed (or failed).
            let node = self.store.get_node_by_embedding(&record.id, tenant)?;
            let context = match &node {
                Some(node) => Some(self.graph.subgraph(&node.name, tenant, depth)?),
                None => {
                    debug!(vector_id = %record.id, "hit without graph node");
                    None
                }
            };
            hits.push(SearchHit {
                memory: record.text,
                similarity,
                node_name: record.node_name,
                context,
            });
        }
        Ok(hits)
    }
}

struct BackgroundMemory {
    node_name: String,
    vector_id: String,
    content: String,
    tenant: String,
    metadata: serde_json::Value,
}

struct FastPathInsert {
    node_name: String,
    vector_id: String,
    content: String,
    tenant: String,
    metadata: serde_json::Value,
}

/// Derive the anchor node name from the vector UUID.
fn memory_node_name(vector_id: &str) -> String {
    format!("mem-{}", &vector_id[..8])
}

/// Graph enrichment for one memory, run inside the outer transaction:
/// resolve the anchor, upsert entity nodes with `mentions` edges, insert
/// relationship edges, promote the anchor to READY.
fn enrich_graph(
    conn: &Connection,
    node_name: &str,
    tenant: &str,
    extraction: &Extraction,
) -> EngramResult<()> {
    let anchor = node_ops::get_node(conn, node_name, tenant)?.ok_or_else(|| {
        EngramError::NotFound {
            entity: "node".to_string(),
            key: node_name.to_string(),
        }
    })?;

    for entity in &extraction.entities {
        // Model output is untrusted; names that fail validation are
        // dropped rather than failing the whole memory.
        if engram_core::validate::validate_name(&entity.name).is_err() {
            debug!(name = %entity.name, "skipping entity with invalid name");
            continue;
        }
        let node_type = entity.entity_type.as_deref().unwrap_or(DEFAULT_NODE_TYPE);
        let entity_node = node_ops::get_or_create_node(conn, &entity.name, node_type, tenant)?;
        if entity_node.id != anchor.id {
            edge_ops::insert_edge(
                conn,
                anchor.id,
                entity_node.id,
                MENTIONS_EDGE_TYPE,
                1.0,
                tenant,
                &serde_json::json!({}),
            )?;
        }
    }

    for rel in &extraction.relationships {
        if engram_core::validate::validate_name(&rel.from).is_err()
            || engram_core::validate::validate_name(&rel.to).is_err()
        {
            debug!(from = %rel.from, to = %rel.to, "skipping relationship with invalid endpoint");
            continue;
        }
        if rel.from == rel.to {
            continue;
        }
        let from = node_ops::get_or_create_node(conn, &rel.from, DEFAULT_NODE_TYPE, tenant)?;
        let to = node_ops::get_or_create_node(conn, &rel.to, DEFAULT_NODE_TYPE, tenant)?;
        if from.id == to.id {
            continue;
        }
        let edge_type = if rel.rel_type.trim().is_empty() {
            DEFAULT_EDGE_TYPE.to_string()
        } else {
            rel.rel_type.to_lowercase()
        };
        edge_ops::insert_edge(conn, from.id, to.id, &edge_type, 1.0, tenant, &serde_json::json!({}))?;
    }

    node_ops::set_status(conn, anchor.id, NodeStatus::Ready)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_names_are_mem_plus_eight_hex() {
        let vector_id = Uuid::new_v4().to_string();
        let name = memory_node_name(&vector_id);
        assert_eq!(name.len(), 12);
        assert!(name.starts_with("mem-"));
        assert!(name[4..].chars().all(|c| c.is_ascii_hexdigit()));
        engram_core::validate::validate_name(&name).unwrap();
    }
}
