//! # System Constants
//!
//! Operational defaults and well-known identifiers shared across the
//! classification core. Runtime values are resolved through
//! [`crate::config::ClassificationConfig`]; this module only defines the
//! boundaries they start from.

/// Default values for pool sizing, scheduling and polling behavior.
pub mod defaults {
    /// Maximum number of live classifier sessions kept by the pool.
    pub const MAXIMUM_SERVICE_COUNT: usize = 2;

    /// Maximum number of classification results retained in memory.
    pub const MAXIMUM_RESULTS_TO_KEEP: usize = 10;

    /// Keep-alive window for shared sessions before eviction, in seconds.
    pub const SHARED_KEEP_ALIVE_SECS: u64 = 15 * 60;

    /// Wake-up interval while waiting for a free pool slot, in milliseconds.
    pub const SLOT_WAIT_MILLIS: u64 = 3_000;

    /// Poll interval for the orchestrator's handoff queue, in milliseconds.
    pub const POLL_INTERVAL_MILLIS: u64 = 2_000;

    /// Upper bound on classification jobs running at once, across targets.
    pub const MAX_CONCURRENT_CLASSIFICATIONS: u32 = 8;

    /// Capacity of the job-change notification channel.
    pub const NOTIFICATION_CAPACITY: usize = 1_024;
}

/// Well-known system identifiers.
pub mod system {
    /// User recorded on classification requests submitted without a caller
    /// identity (scheduled maintenance runs and the like).
    pub const SYSTEM_USER: &str = "system";

    /// Classifier implementation used when a request does not name one.
    pub const DEFAULT_CLASSIFIER_ID: &str = "elk";
}
