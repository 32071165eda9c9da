//! End-to-end scenarios over the assembled engine: ingest then read,
//! tenant isolation, injection safety, hydration misses, tolerated
//! extraction failures, cross-store compensation, and surface limits.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use engram_core::config::{BreakerConfig, EmbeddingConfig, RateLimitConfig};
use engram_core::errors::{EngramError, EngramResult, ExtractionError};
use engram_core::models::{
    event_types, ExtractedEntity, ExtractedRelationship, Extraction, NodeStatus, VectorRecord,
};
use engram_core::traits::IEntityExtractor;
use engram_embeddings::EmbeddingEngine;
use engram_engine::{BreakerRegistry, MemoryManager, ToolSurface};
use engram_graph::GraphQueryEngine;
use engram_storage::{GraphStore, TransactionManager};
use engram_vector::VectorStore;

struct StubExtractor(Extraction);

#[async_trait]
impl IEntityExtractor for StubExtractor {
    async fn extract(&self, _text: &str) -> EngramResult<Extraction> {
        Ok(self.0.clone())
    }
}

struct FailingExtractor;

#[async_trait]
impl IEntityExtractor for FailingExtractor {
    async fn extract(&self, _text: &str) -> EngramResult<Extraction> {
        Err(EngramError::Extraction(ExtractionError::RequestFailed {
            message: "llm unreachable".to_string(),
        }))
    }
}

/// Blocks extraction until the test says go, so the test can interleave
/// other work deterministically.
struct GatedExtractor {
    gate: Arc<tokio::sync::Notify>,
}

#[async_trait]
impl IEntityExtractor for GatedExtractor {
    async fn extract(&self, _text: &str) -> EngramResult<Extraction> {
        self.gate.notified().await;
        Ok(Extraction::default())
    }
}

struct Harness {
    store: Arc<GraphStore>,
    vectors: Arc<VectorStore>,
    graph: Arc<GraphQueryEngine>,
    manager: Arc<MemoryManager>,
    _cache_dir: tempfile::TempDir,
}

fn harness(extractor: Arc<dyn IEntityExtractor>) -> Harness {
    let cache_dir = tempfile::tempdir().unwrap();
    let store = Arc::new(GraphStore::open_in_memory().unwrap());
    let vectors = Arc::new(VectorStore::open_in_memory().unwrap());
    let embeddings = Arc::new(
        EmbeddingEngine::new(&EmbeddingConfig {
            provider: "mock".to_string(),
            dimensions: 8,
            cache_dir: cache_dir.path().to_path_buf(),
            ..Default::default()
        })
        .unwrap(),
    );
    let txn = Arc::new(TransactionManager::new(store.clone()));
    let graph = Arc::new(GraphQueryEngine::new(store.clone()));
    let breakers = Arc::new(BreakerRegistry::new(BreakerConfig::default()));
    let manager = Arc::new(MemoryManager::new(
        store.clone(),
        txn,
        graph.clone(),
        vectors.clone(),
        embeddings,
        extractor,
        None,
        breakers,
    ));
    Harness {
        store,
        vectors,
        graph,
        manager,
        _cache_dir: cache_dir,
    }
}

fn alice_extraction() -> Extraction {
    Extraction {
        entities: vec![
            ExtractedEntity {
                name: "Alice".to_string(),
                entity_type: Some("person".to_string()),
                metadata: serde_json::Value::Null,
            },
            ExtractedEntity {
                name: "TypeScript".to_string(),
                entity_type: Some("technology".to_string()),
                metadata: serde_json::Value::Null,
            },
        ],
        relationships: vec![ExtractedRelationship {
            from: "Alice".to_string(),
            to: "TypeScript".to_string(),
            rel_type: "USES".to_string(),
        }],
    }
}

async fn wait_for_status(store: &GraphStore, name: &str, tenant: &str, status: NodeStatus) {
    for _ in 0..200 {
        if let Some(node) = store.get_node(name, tenant).unwrap() {
            if node.status == status {
                return;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("node {name} never reached {status:?}");
}

#[tokio::test]
async fn ingest_then_read_builds_the_graph() {
    let h = harness(Arc::new(StubExtractor(alice_extraction())));

    let name = h
        .manager
        .add_memory("Alice uses TypeScript.", "u1", serde_json::json!({}))
        .await
        .unwrap();

    // The returned name is mem- plus eight hex chars.
    assert_eq!(name.len(), 12);
    assert!(name.starts_with("mem-"));
    assert!(name[4..].chars().all(|c| c.is_ascii_hexdigit()));

    // Fast path is visible before the background work completes.
    let node = h.store.get_node(&name, "u1").unwrap().unwrap();
    assert_eq!(node.node_type, "memory");
    assert!(node.embedding_id.is_some());
    assert_eq!(h.manager.session().recent("u1").as_deref(), Some("Alice uses TypeScript."));

    wait_for_status(&h.store, &name, "u1", NodeStatus::Ready).await;

    let page = h.graph.read_graph("u1", 100, 0).unwrap();
    let names: Vec<&str> = page.nodes.iter().map(|n| n.name.as_str()).collect();
    assert!(names.contains(&name.as_str()));
    assert!(names.contains(&"Alice"));
    assert!(names.contains(&"TypeScript"));

    let anchor_id = page.nodes.iter().find(|n| n.name == name).unwrap().id;
    let mentions: Vec<_> = page
        .edges
        .iter()
        .filter(|e| e.source_id == anchor_id && e.edge_type == "mentions")
        .collect();
    assert_eq!(mentions.len(), 2, "memory→Alice and memory→TypeScript");

    // Relationship edge type is lowercased.
    assert!(page.edges.iter().any(|e| e.edge_type == "uses"));

    // READY anchors point at live vectors in the same tenant.
    let node = h.store.get_node(&name, "u1").unwrap().unwrap();
    let record = h.vectors.get(node.embedding_id.as_deref().unwrap()).unwrap().unwrap();
    assert_eq!(record.tenant, "u1");
    assert_eq!(record.node_name, name);

    // Audit trail has both the fast-path and the completion event.
    let events = h.store.recent_events("u1", 10).unwrap();
    let kinds: Vec<&str> = events.iter().map(|e| e.event_type.as_str()).collect();
    assert!(kinds.contains(&event_types::MEMORY_ADDED_FAST));
    assert!(kinds.contains(&event_types::MEMORY_PROCESSED));

    // Tenant isolation: another tenant sees an empty graph.
    let other = h.graph.read_graph("u2", 100, 0).unwrap();
    assert!(other.nodes.is_empty() && other.edges.is_empty());
}

#[tokio::test]
async fn injection_attempts_do_not_destroy_data() {
    let h = harness(Arc::new(StubExtractor(alice_extraction())));
    let name = h
        .manager
        .add_memory("Alice uses TypeScript.", "u1", serde_json::json!({}))
        .await
        .unwrap();
    wait_for_status(&h.store, &name, "u1", NodeStatus::Ready).await;

    let hits = h.graph.search_nodes("x'; DROP TABLE nodes; --", "u1").unwrap();
    assert!(hits.nodes.is_empty());

    // Everything is still there and queryable.
    let alice = h.graph.search_nodes("Alice", "u1").unwrap();
    assert_eq!(alice.nodes.len(), 1);
}

#[tokio::test]
async fn search_hydrates_hits_with_graph_context() {
    let h = harness(Arc::new(StubExtractor(alice_extraction())));
    let name = h
        .manager
        .add_memory("Alice uses TypeScript.", "u1", serde_json::json!({}))
        .await
        .unwrap();
    wait_for_status(&h.store, &name, "u1", NodeStatus::Ready).await;

    let hits = h.manager.search("who uses TypeScript?", "u1").await.unwrap();
    assert_eq!(hits.len(), 1);
    let hit = &hits[0];
    assert_eq!(hit.memory, "Alice uses TypeScript.");
    assert_eq!(hit.node_name, name);
    let context = hit.context.as_ref().expect("processed memory has context");
    let names: Vec<&str> = context.nodes.iter().map(|n| n.name.as_str()).collect();
    assert!(names.contains(&"Alice"));
    assert!(names.contains(&"TypeScript"));

    // Other tenants see nothing.
    let empty = h.manager.search("TypeScript", "u2").await.unwrap();
    assert!(empty.is_empty());
}

#[tokio::test]
async fn hits_without_graph_nodes_carry_no_context() {
    let h = harness(Arc::new(StubExtractor(Extraction::default())));

    // A vector record with no graph counterpart, as if the background
    // processor had not finished yet.
    h.vectors
        .upsert(&VectorRecord {
            id: "feedfeed-0000-0000-0000-000000000000".to_string(),
            vector: vec![0.1; 8],
            text: "orphaned memory".to_string(),
            tenant: "u1".to_string(),
            timestamp: chrono::Utc::now().timestamp(),
            node_name: "mem-feedfeed".to_string(),
            metadata: "{}".to_string(),
        })
        .unwrap();

    let hits = h.manager.search("orphaned", "u1").await.unwrap();
    assert_eq!(hits.len(), 1);
    assert!(hits[0].context.is_none());
}

#[tokio::test]
async fn extraction_failure_is_tolerated_and_memory_still_promotes() {
    let h = harness(Arc::new(FailingExtractor));
    let name = h
        .manager
        .add_memory("plain text, no entities", "u1", serde_json::json!({}))
        .await
        .unwrap();

    wait_for_status(&h.store, &name, "u1", NodeStatus::Ready).await;

    // Only the anchor exists; no entity nodes, no edges.
    let page = h.graph.read_graph("u1", 100, 0).unwrap();
    assert_eq!(page.nodes.len(), 1);
    assert!(page.edges.is_empty());
}

#[tokio::test]
async fn sql_failure_after_vector_commit_runs_the_compensation() {
    let gate = Arc::new(tokio::sync::Notify::new());
    let h = harness(Arc::new(GatedExtractor { gate: gate.clone() }));

    let name = h
        .manager
        .add_memory("doomed memory", "u1", serde_json::json!({}))
        .await
        .unwrap();

    // Wait until the vector side has committed (extraction is gated, so
    // the SQL phase has not started yet).
    for _ in 0..200 {
        if h.vectors.count("u1").unwrap() == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(h.vectors.count("u1").unwrap(), 1);

    // Remove the anchor so the graph phase must fail, then release.
    h.store.purge_tenant("u1").unwrap();
    gate.notify_one();

    // The compensation deletes the orphaned vector.
    for _ in 0..200 {
        if h.vectors.count("u1").unwrap() == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(h.vectors.count("u1").unwrap(), 0, "compensation must remove the vector");

    // The failure was audited, and never surfaced to the ingest caller.
    let mut audited = false;
    for _ in 0..200 {
        let events = h.store.recent_events("u1", 10).unwrap();
        if events.iter().any(|e| e.event_type == event_types::MEMORY_PROCESSING_FAILED) {
            audited = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(audited, "background failure must be audited");
    let _ = name;
}

#[tokio::test]
async fn surface_enforces_limits_and_rate() {
    let h = harness(Arc::new(StubExtractor(Extraction::default())));
    let surface = ToolSurface::new(
        h.manager.clone(),
        h.graph.clone(),
        RateLimitConfig {
            max_requests: 3,
            window_ms: 60_000,
        },
    );

    // Input limits.
    let long_text = "x".repeat(50_001);
    assert!(matches!(
        surface.add_memory(&long_text, "u1", "").await.unwrap_err(),
        EngramError::Validation { .. }
    ));
    let long_tenant = "t".repeat(101);
    assert!(surface.read_graph(&long_tenant, 10, 0).await.is_err());
    assert!(surface.read_graph("u1", 0, 0).await.is_err());
    assert!(surface.read_graph("u1", 501, 0).await.is_err());
    assert!(surface.hybrid_search("q", "u1", 0).await.is_err());
    assert!(surface.hybrid_search("q", "u1", 4).await.is_err());

    // Rate limit: a fresh tenant, so the calls above don't count.
    for _ in 0..3 {
        surface.read_graph("u9", 10, 0).await.unwrap();
    }
    let err = surface.read_graph("u9", 10, 0).await.unwrap_err();
    assert!(matches!(err, EngramError::RateLimited { .. }));
}

#[tokio::test]
async fn metadata_json_is_parsed_and_stored() {
    let h = harness(Arc::new(StubExtractor(Extraction::default())));
    let surface = ToolSurface::new(h.manager.clone(), h.graph.clone(), RateLimitConfig::default());

    let name = surface
        .add_memory("with metadata", "u1", r#"{"source": "chat"}"#)
        .await
        .unwrap();
    let node = h.store.get_node(&name, "u1").unwrap().unwrap();
    assert_eq!(node.metadata["source"], "chat");

    assert!(surface.add_memory("bad metadata", "u1", "{not json").await.is_err());
}
