//! Bounded pool for background ingest work.
//!
//! Each spawned task holds a semaphore permit, so at most `limit` memories
//! are processed concurrently. On shutdown the pool drains with a
//! deadline; whatever has not finished by then stays PENDING and is left
//! for the recovery worker.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::warn;

/// Tracked, concurrency-bounded background tasks.
pub struct BackgroundPool {
    semaphore: Arc<Semaphore>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl BackgroundPool {
    pub fn new(limit: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(limit)),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// The task list holds nothing but join handles, so a guard recovered
    /// from a poisoned lock is still valid. Ingest and shutdown must keep
    /// working after a panicked task; anything unfinished falls through to
    /// the recovery worker.
    fn tasks(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Spawn a tracked task. The task waits for a permit before running,
    /// which is what bounds concurrency.
    pub fn spawn<F>(&self, future: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let semaphore = self.semaphore.clone();
        let handle = tokio::spawn(async move {
            // The semaphore is never closed, so acquire cannot fail.
            let _permit = semaphore.acquire_owned().await;
            future.await;
        });

        let mut tasks = self.tasks();
        tasks.retain(|t| !t.is_finished());
        tasks.push(handle);
    }

    /// Number of tracked tasks that have not finished.
    pub fn in_flight(&self) -> usize {
        let mut tasks = self.tasks();
        tasks.retain(|t| !t.is_finished());
        tasks.len()
    }

    /// Wait for in-flight tasks, giving up at the deadline. Abandoned
    /// tasks keep running detached; their PENDING rows are the recovery
    /// worker's problem.
    pub async fn drain(&self, deadline: Duration) {
        let handles: Vec<JoinHandle<()>> = self.tasks().drain(..).collect();

        let started = Instant::now();
        let mut abandoned = 0usize;
        for handle in handles {
            let remaining = deadline.saturating_sub(started.elapsed());
            if remaining.is_zero() || tokio::time::timeout(remaining, handle).await.is_err() {
                abandoned += 1;
            }
        }
        if abandoned > 0 {
            warn!(abandoned, "background tasks left for the recovery worker");
        }
    }
}
