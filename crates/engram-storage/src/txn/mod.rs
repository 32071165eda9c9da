//! Transactions: nested SQL savepoints, the cross-store compensation
//! registry, and the saga executor.

mod manager;
mod saga;

pub use manager::TransactionManager;
pub use saga::{Saga, SagaState, SagaTransaction};
