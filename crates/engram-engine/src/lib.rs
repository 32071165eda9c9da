//! # engram-engine
//!
//! The orchestrator: the memory manager (ingest fast path + background AI
//! pipeline, hybrid retrieval), per-dependency circuit breakers, the
//! recovery worker, the per-tenant rate limiter, the session cache, and
//! the tool-surface facade.

pub mod breaker;
pub mod context;
pub mod manager;
pub mod pool;
pub mod rate_limit;
pub mod recovery;
pub mod session;
pub mod surface;

pub use breaker::{BreakerRegistry, BreakerState, CircuitBreaker};
pub use context::Engram;
pub use manager::{HybridAnswer, MemoryManager};
pub use pool::BackgroundPool;
pub use rate_limit::RateLimiter;
pub use recovery::{RecoveryHandle, RecoveryWorker};
pub use session::SessionCache;
pub use surface::ToolSurface;
