//! TransactionManager — one outer SQL transaction at a time, nested work
//! via named savepoints, and an out-of-band compensation registry for
//! effects the SQL transaction cannot cover (vector-store writes).

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex, MutexGuard};

use rusqlite::Connection;
use tracing::{debug, error};

use engram_core::errors::{EngramError, EngramResult, StorageError};

use crate::engine::GraphStore;
use crate::to_storage_err;

type UndoFuture = Pin<Box<dyn Future<Output = EngramResult<()>> + Send>>;
type UndoFn = Box<dyn FnOnce() -> UndoFuture + Send>;

struct Compensation {
    description: String,
    undo: UndoFn,
}

/// Serializes outer transactions and carries the compensation registry.
///
/// Callers run a whole transactional section through [`execute`]; inside
/// the section they issue SQL via [`run`], open nested scopes via
/// [`nested`], and register compensations for cross-store side effects.
/// On outer rollback the compensations run in reverse registration order;
/// on commit the registry is cleared without running.
///
/// The section closure must not call [`execute`] re-entrantly — nested
/// work goes through [`nested`], which maps to savepoints.
///
/// [`execute`]: TransactionManager::execute
/// [`run`]: TransactionManager::run
/// [`nested`]: TransactionManager::nested
pub struct TransactionManager {
    store: Arc<GraphStore>,
    /// Outer-transaction gate; waiters queue rather than interleave.
    gate: tokio::sync::Mutex<()>,
    /// Process-local "an outer transaction is open" flag.
    active: AtomicBool,
    /// Current savepoint depth (0 = outer).
    depth: AtomicUsize,
    compensations: StdMutex<Vec<Compensation>>,
}

impl TransactionManager {
    pub fn new(store: Arc<GraphStore>) -> Self {
        Self {
            store,
            gate: tokio::sync::Mutex::new(()),
            active: AtomicBool::new(false),
            depth: AtomicUsize::new(0),
            compensations: StdMutex::new(Vec::new()),
        }
    }

    /// Whether an outer transaction is currently open.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Run `op` inside one outer SQL transaction.
    ///
    /// Success commits and discards the compensation registry. Failure
    /// rolls the SQL side back, then runs every registered compensation in
    /// reverse order (each isolated; a failing compensation is logged and
    /// never masks the original error).
    pub async fn execute<T, F, Fut>(&self, op: F) -> EngramResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = EngramResult<T>>,
    {
        let _guard = self.gate.lock().await;
        self.begin()?;

        let result = op().await;

        match result {
            Ok(value) => match self.commit() {
                Ok(()) => {
                    // The commit stands either way; a poisoned registry
                    // only matters to the next transaction, which will see
                    // the typed error when it registers.
                    if let Err(e) = self.discard_compensations() {
                        error!(error = %e, "failed to clear compensation registry");
                    }
                    Ok(value)
                }
                // A failed COMMIT leaves no SQL effects; the cross-store
                // side effects still need undoing.
                Err(err) => {
                    self.run_compensations().await;
                    Err(err)
                }
            },
            Err(err) => {
                if let Err(rb) = self.rollback() {
                    error!(error = %rb, "outer rollback failed");
                }
                self.run_compensations().await;
                Err(err)
            }
        }
    }

    /// Issue SQL on the transaction's connection. Only valid while an
    /// outer transaction is open.
    pub fn run<T, F>(&self, f: F) -> EngramResult<T>
    where
        F: FnOnce(&Connection) -> EngramResult<T>,
    {
        self.require_active("run")?;
        self.store.with_writer(f)
    }

    /// Open a nested scope backed by a named savepoint
    /// (`sp_<depth>_<timestamp>`). Success releases the savepoint; failure
    /// rolls back to it, leaving the outer transaction usable.
    pub fn nested<T, F>(&self, f: F) -> EngramResult<T>
    where
        F: FnOnce(&Connection) -> EngramResult<T>,
    {
        self.require_active("nested")?;

        let depth = self.depth.fetch_add(1, Ordering::SeqCst) + 1;
        // Built from integers only; never from caller input.
        let name = format!("sp_{}_{}", depth, chrono::Utc::now().timestamp_millis());

        let result = self.store.with_writer(|conn| {
            conn.execute_batch(&format!("SAVEPOINT {name}"))
                .map_err(|e| to_storage_err("savepoint", e))?;
            match f(conn) {
                Ok(value) => {
                    conn.execute_batch(&format!("RELEASE SAVEPOINT {name}"))
                        .map_err(|e| to_storage_err("release_savepoint", e))?;
                    Ok(value)
                }
                Err(err) => {
                    if let Err(e) = conn.execute_batch(&format!(
                        "ROLLBACK TO SAVEPOINT {name}; RELEASE SAVEPOINT {name}"
                    )) {
                        error!(savepoint = %name, error = %e, "savepoint rollback failed");
                    }
                    Err(err)
                }
            }
        });

        self.depth.fetch_sub(1, Ordering::SeqCst);
        result
    }

    /// Register an undo action for a side effect outside the SQL store.
    /// Only valid while an outer transaction is open.
    pub fn register_compensation<F, Fut>(&self, description: &str, undo: F) -> EngramResult<()>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = EngramResult<()>> + Send + 'static,
    {
        self.require_active("register_compensation")?;
        debug!(description, "registered compensation");
        self.registry()?.push(Compensation {
            description: description.to_string(),
            undo: Box::new(move || Box::pin(undo())),
        });
        Ok(())
    }

    fn registry(&self) -> EngramResult<MutexGuard<'_, Vec<Compensation>>> {
        self.compensations.lock().map_err(|e| {
            EngramError::Database(StorageError::LockPoisoned {
                message: e.to_string(),
            })
        })
    }

    fn require_active(&self, operation: &str) -> EngramResult<()> {
        if !self.active.load(Ordering::SeqCst) {
            return Err(EngramError::Concurrency {
                operation: operation.to_string(),
                reason: "no outer transaction is open".to_string(),
            });
        }
        Ok(())
    }

    fn begin(&self) -> EngramResult<()> {
        self.store.with_writer(|conn| {
            // The gate should make this impossible; a connection already
            // inside a transaction means some caller bypassed the manager.
            if !conn.is_autocommit() {
                return Err(EngramError::Concurrency {
                    operation: "begin".to_string(),
                    reason: "a transaction is already open on the write connection".to_string(),
                });
            }
            // IMMEDIATE takes the write lock up front instead of on first write.
            conn.execute_batch("BEGIN IMMEDIATE")
                .map_err(|e| to_storage_err("begin", e))
        })?;
        self.active.store(true, Ordering::SeqCst);
        self.depth.store(0, Ordering::SeqCst);
        Ok(())
    }

    fn commit(&self) -> EngramResult<()> {
        self.active.store(false, Ordering::SeqCst);
        self.store.with_writer(|conn| {
            conn.execute_batch("COMMIT")
                .map_err(|e| to_storage_err("commit", e))
        })
    }

    fn rollback(&self) -> EngramResult<()> {
        self.active.store(false, Ordering::SeqCst);
        self.store.with_writer(|conn| {
            conn.execute_batch("ROLLBACK")
                .map_err(|e| to_storage_err("rollback", e))
        })
    }

    fn discard_compensations(&self) -> EngramResult<()> {
        self.registry()?.clear();
        Ok(())
    }

    /// Run registered compensations in reverse registration order, each
    /// isolated from the next.
    async fn run_compensations(&self) {
        let drained: Vec<Compensation> = match self.registry() {
            Ok(mut registry) => registry.drain(..).collect(),
            // Later register_compensation calls surface the same typed
            // error; nothing left to run here.
            Err(e) => {
                error!(error = %e, "compensation registry unavailable, nothing drained");
                return;
            }
        };

        for compensation in drained.into_iter().rev() {
            debug!(description = %compensation.description, "running compensation");
            if let Err(e) = (compensation.undo)().await {
                error!(
                    description = %compensation.description,
                    error = %e,
                    "compensation failed"
                );
            }
        }
    }
}
