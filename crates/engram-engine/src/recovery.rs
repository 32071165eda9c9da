//! Recovery worker: the periodic sweep that reconciles abandoned work.
//!
//! The background pipeline is fire-and-forget; a crash between the fast
//! path and promotion leaves a node PENDING forever. The sweep moves such
//! rows to FAILED (with a recovery note) for manual replay — it never
//! re-runs AI work on its own.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use engram_core::config::RecoveryConfig;
use engram_core::errors::EngramResult;
use engram_storage::GraphStore;

/// Note written into `metadata.recovery_note` on every reconciled node.
const RECOVERY_NOTE: &str = "abandoned by background processor; manual replay required";

/// The recovery worker. Construct, then [`spawn`](Self::spawn).
pub struct RecoveryWorker {
    store: Arc<GraphStore>,
    config: RecoveryConfig,
    is_running: Arc<AtomicBool>,
}

/// Handle to a spawned worker; dropping it does not stop the loop, call
/// [`shutdown`](Self::shutdown).
pub struct RecoveryHandle {
    stop: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl RecoveryHandle {
    /// Stop the loop and wait for it to finish.
    pub async fn shutdown(self) {
        let _ = self.stop.send(true);
        let _ = self.join.await;
    }
}

impl RecoveryWorker {
    pub fn new(store: Arc<GraphStore>, config: RecoveryConfig) -> Self {
        Self {
            store,
            config,
            is_running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start the periodic sweep. The first tick runs immediately.
    pub fn spawn(self) -> RecoveryHandle {
        let (stop, mut stopped) = watch::channel(false);
        let join = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(self.config.sweep_interval_secs));
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = self.sweep() {
                            warn!(error = %e, "recovery sweep failed");
                        }
                    }
                    _ = stopped.changed() => {
                        info!("recovery worker stopping");
                        break;
                    }
                }
            }
        });
        RecoveryHandle { stop, join }
    }

    /// One sweep. Guarded so overlapping invocations become no-ops.
    pub fn sweep(&self) -> EngramResult<usize> {
        if self
            .is_running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("sweep already in progress, skipping");
            return Ok(0);
        }

        let result = self.sweep_inner();
        self.is_running.store(false, Ordering::SeqCst);
        result
    }

    fn sweep_inner(&self) -> EngramResult<usize> {
        let cutoff = chrono::Utc::now().timestamp() - self.config.stale_after_secs;
        let stale = self.store.find_stale_pending(cutoff)?;
        if stale.is_empty() {
            return Ok(0);
        }

        let mut reconciled = 0;
        for node in &stale {
            match self.store.mark_failed(node, RECOVERY_NOTE) {
                Ok(()) => reconciled += 1,
                Err(e) => warn!(node = %node.name, error = %e, "failed to reconcile node"),
            }
        }
        info!(reconciled, "recovery sweep transitioned abandoned nodes to FAILED");
        Ok(reconciled)
    }
}
