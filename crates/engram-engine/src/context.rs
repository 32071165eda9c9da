//! Engram — the process-wide context object.
//!
//! Builds every subsystem from one config and threads them together
//! explicitly; there are no global singletons. The host keeps one of
//! these per process.

use std::sync::Arc;

use tracing::info;

use engram_core::config::EngramConfig;
use engram_core::errors::EngramResult;
use engram_core::traits::{IEntityExtractor, ISummarizer};
use engram_embeddings::EmbeddingEngine;
use engram_extraction::{LlmClient, LlmEntityExtractor, LlmSummarizer};
use engram_graph::GraphQueryEngine;
use engram_storage::{GraphStore, TransactionManager};
use engram_vector::VectorStore;

use crate::breaker::BreakerRegistry;
use crate::manager::MemoryManager;
use crate::recovery::{RecoveryHandle, RecoveryWorker};
use crate::surface::ToolSurface;

/// The assembled engine.
pub struct Engram {
    manager: Arc<MemoryManager>,
    surface: ToolSurface,
    recovery: Option<RecoveryHandle>,
}

impl Engram {
    /// Open every backend named in the config, wire the orchestrator, and
    /// start the recovery worker.
    pub fn open(config: &EngramConfig) -> EngramResult<Self> {
        let store = Arc::new(GraphStore::open(
            &config.storage.db_path,
            config.storage.read_pool_size,
        )?);
        let vectors = Arc::new(VectorStore::open(&config.vector.dir)?);
        let embeddings = Arc::new(EmbeddingEngine::new(&config.embedding)?);

        let llm = LlmClient::new(&config.extraction);
        let extractor: Arc<dyn IEntityExtractor> = Arc::new(LlmEntityExtractor::new(llm));
        let summarizer: Option<Arc<dyn ISummarizer>> = config
            .extraction
            .summarize_results
            .then(|| {
                let client = LlmClient::new(&config.extraction);
                Arc::new(LlmSummarizer::new(client)) as Arc<dyn ISummarizer>
            });

        let txn = Arc::new(TransactionManager::new(store.clone()));
        let graph = Arc::new(GraphQueryEngine::new(store.clone()));
        let breakers = Arc::new(BreakerRegistry::new(config.breaker.clone()));

        let manager = Arc::new(MemoryManager::new(
            store.clone(),
            txn,
            graph.clone(),
            vectors,
            embeddings,
            extractor,
            summarizer,
            breakers,
        ));

        let recovery = RecoveryWorker::new(store, config.recovery.clone()).spawn();
        let surface = ToolSurface::new(manager.clone(), graph, config.rate_limit.clone());

        info!("engram engine ready");
        Ok(Self {
            manager,
            surface,
            recovery: Some(recovery),
        })
    }

    /// The tool surface for the RPC host.
    pub fn surface(&self) -> &ToolSurface {
        &self.surface
    }

    /// The memory manager, for embedding hosts that bypass the surface.
    pub fn manager(&self) -> &Arc<MemoryManager> {
        &self.manager
    }

    /// Drain background work (bounded by a deadline), then stop the
    /// recovery worker. Memories still unfinished at the deadline stay
    /// PENDING for the next process's sweep.
    pub async fn shutdown(mut self) {
        self.manager
            .drain_background(std::time::Duration::from_secs(5))
            .await;
        if let Some(recovery) = self.recovery.take() {
            recovery.shutdown().await;
        }
        info!("engram engine stopped");
    }
}
