//! Saga executor for multi-step plans with explicit compensations, plus the
//! per-ingest bookkeeping record of vector-store effects.

use std::future::Future;
use std::pin::Pin;

use tracing::{debug, error};

use engram_core::errors::EngramResult;

type StepFuture = Pin<Box<dyn Future<Output = EngramResult<()>> + Send>>;
type StepFn = Box<dyn FnOnce() -> StepFuture + Send>;

struct SagaStep {
    name: String,
    execute: StepFn,
    compensate: StepFn,
}

/// A sequence of local transactions, each with an explicit compensating
/// counterpart. On any step failure, compensations for the completed steps
/// run in reverse order, then the original error is returned.
#[derive(Default)]
pub struct Saga {
    steps: Vec<SagaStep>,
}

impl Saga {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Append a step. Steps run in registration order.
    pub fn step<E, EF, C, CF>(mut self, name: &str, execute: E, compensate: C) -> Self
    where
        E: FnOnce() -> EF + Send + 'static,
        EF: Future<Output = EngramResult<()>> + Send + 'static,
        C: FnOnce() -> CF + Send + 'static,
        CF: Future<Output = EngramResult<()>> + Send + 'static,
    {
        self.steps.push(SagaStep {
            name: name.to_string(),
            execute: Box::new(move || Box::pin(execute())),
            compensate: Box::new(move || Box::pin(compensate())),
        });
        self
    }

    /// Run the saga to completion or compensated failure.
    pub async fn run(self) -> EngramResult<()> {
        let mut completed: Vec<(String, StepFn)> = Vec::new();

        for step in self.steps {
            debug!(step = %step.name, "saga step");
            match (step.execute)().await {
                Ok(()) => completed.push((step.name, step.compensate)),
                Err(err) => {
                    error!(step = %step.name, error = %err, "saga step failed, compensating");
                    for (name, compensate) in completed.into_iter().rev() {
                        if let Err(ce) = compensate().await {
                            error!(step = %name, error = %ce, "saga compensation failed");
                        }
                    }
                    return Err(err);
                }
            }
        }
        Ok(())
    }
}

/// Lifecycle of one ingest's cross-store effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SagaState {
    Pending,
    Committed,
    RolledBack,
}

/// In-memory record of the vector-store ids one ingest touched. Lifetime is
/// bounded by that ingest; the record exists for audit logging, not
/// persistence.
#[derive(Debug)]
pub struct SagaTransaction {
    pub id: String,
    pub vector_ids: Vec<String>,
    pub state: SagaState,
}

impl SagaTransaction {
    pub fn new(id: String) -> Self {
        Self {
            id,
            vector_ids: Vec::new(),
            state: SagaState::Pending,
        }
    }

    /// Record a vector-store insert performed under this saga.
    pub fn record_vector(&mut self, vector_id: String) {
        self.vector_ids.push(vector_id);
    }

    pub fn mark_committed(&mut self) {
        self.state = SagaState::Committed;
    }

    pub fn mark_rolled_back(&mut self) {
        self.state = SagaState::RolledBack;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use engram_core::errors::EngramError;

    fn fail(op: &str) -> EngramError {
        EngramError::Concurrency {
            operation: op.to_string(),
            reason: "test".to_string(),
        }
    }

    #[tokio::test]
    async fn all_steps_run_in_order_on_success() {
        let log = Arc::new(std::sync::Mutex::new(Vec::new()));
        let (a, b) = (log.clone(), log.clone());

        Saga::new()
            .step(
                "one",
                move || async move {
                    a.lock().unwrap().push("one");
                    Ok(())
                },
                || async { Ok(()) },
            )
            .step(
                "two",
                move || async move {
                    b.lock().unwrap().push("two");
                    Ok(())
                },
                || async { Ok(()) },
            )
            .run()
            .await
            .unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["one", "two"]);
    }

    #[tokio::test]
    async fn failure_compensates_completed_steps_in_reverse() {
        let log = Arc::new(std::sync::Mutex::new(Vec::new()));
        let (c1, c2) = (log.clone(), log.clone());

        let err = Saga::new()
            .step("one", || async { Ok(()) }, move || {
                let log = c1;
                async move {
                    log.lock().unwrap().push("undo-one");
                    Ok(())
                }
            })
            .step("two", || async { Ok(()) }, move || {
                let log = c2;
                async move {
                    log.lock().unwrap().push("undo-two");
                    Ok(())
                }
            })
            .step(
                "three",
                || async { Err(fail("three")) },
                || async { Ok(()) },
            )
            .run()
            .await
            .unwrap_err();

        assert!(matches!(err, EngramError::Concurrency { .. }));
        assert_eq!(*log.lock().unwrap(), vec!["undo-two", "undo-one"]);
    }

    #[tokio::test]
    async fn failing_compensation_does_not_halt_the_sweep() {
        let ran = Arc::new(AtomicUsize::new(0));
        let counter = ran.clone();

        Saga::new()
            .step("one", || async { Ok(()) }, move || {
                let counter = counter;
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            })
            .step("two", || async { Ok(()) }, || async {
                Err(fail("undo-two"))
            })
            .step("boom", || async { Err(fail("boom")) }, || async { Ok(()) })
            .run()
            .await
            .unwrap_err();

        // The failing undo for "two" did not stop "one"'s undo.
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn saga_transaction_lifecycle() {
        let mut saga = SagaTransaction::new("ingest-1".to_string());
        assert_eq!(saga.state, SagaState::Pending);
        saga.record_vector("v1".to_string());
        saga.record_vector("v2".to_string());
        saga.mark_committed();
        assert_eq!(saga.state, SagaState::Committed);
        assert_eq!(saga.vector_ids, vec!["v1", "v2"]);
    }
}
