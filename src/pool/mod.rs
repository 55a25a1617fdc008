//! # Classifier Session Pool
//!
//! Bounds the number of live, expensive classifier sessions and lets
//! recently-used sessions for the same target be reused within a keep-alive
//! window.
//!
//! ## Architecture
//!
//! - **ServicePool**: bounded queue of free lease slots plus a concurrent
//!   cache of sessions retired as "shared" (reusable and evictable)
//! - **ServiceLease**: revocable handle to one pooled session
//! - **EvictionScheduler**: single background clock driving keep-alive
//!   evictions; owned, started and stopped by the pool itself
//!
//! Pool exhaustion is not an error: `take_lease` blocks with periodic
//! wake-ups and force-evicts idle shared sessions to guarantee forward
//! progress when the pool is saturated.

pub mod eviction;
pub mod lease;
pub mod service_pool;

pub use lease::ServiceLease;
pub use service_pool::{PoolError, ServiceFactory, ServicePool};
