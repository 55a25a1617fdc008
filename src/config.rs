use crate::constants::{defaults, system};
use crate::error::{ClassificationCoreError, Result};
use std::time::Duration;

/// Runtime configuration for the classification core.
///
/// All values have sensible defaults and can be overridden through
/// `CLASSIFICATION_*` environment variables, mirroring how the embedding
/// terminology server configures its other subsystems.
#[derive(Debug, Clone)]
pub struct ClassificationConfig {
    /// Maximum number of live classifier sessions (pool bound).
    pub maximum_service_count: usize,
    /// Maximum number of taxonomies retained by the result registry.
    pub maximum_results_to_keep: usize,
    /// How long a shared session survives unused before eviction.
    pub shared_keep_alive: Duration,
    /// Wake-up interval while blocked on a free pool slot.
    pub slot_wait: Duration,
    /// Bounded wait applied to each handoff-queue poll.
    pub poll_interval: Duration,
    /// Global ceiling on concurrently running classification jobs.
    pub max_concurrent_classifications: u32,
    /// Capacity of the job-change notification channel.
    pub notification_capacity: usize,
    /// Classifier implementation used when a request names none.
    pub default_classifier_id: String,
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            maximum_service_count: defaults::MAXIMUM_SERVICE_COUNT,
            maximum_results_to_keep: defaults::MAXIMUM_RESULTS_TO_KEEP,
            shared_keep_alive: Duration::from_secs(defaults::SHARED_KEEP_ALIVE_SECS),
            slot_wait: Duration::from_millis(defaults::SLOT_WAIT_MILLIS),
            poll_interval: Duration::from_millis(defaults::POLL_INTERVAL_MILLIS),
            max_concurrent_classifications: defaults::MAX_CONCURRENT_CLASSIFICATIONS,
            notification_capacity: defaults::NOTIFICATION_CAPACITY,
            default_classifier_id: system::DEFAULT_CLASSIFIER_ID.to_string(),
        }
    }
}

impl ClassificationConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(count) = std::env::var("CLASSIFICATION_MAX_SESSIONS") {
            config.maximum_service_count = count.parse().map_err(|e| {
                ClassificationCoreError::ConfigurationError(format!("Invalid max_sessions: {e}"))
            })?;
        }

        if let Ok(count) = std::env::var("CLASSIFICATION_MAX_RESULTS") {
            config.maximum_results_to_keep = count.parse().map_err(|e| {
                ClassificationCoreError::ConfigurationError(format!("Invalid max_results: {e}"))
            })?;
        }

        if let Ok(secs) = std::env::var("CLASSIFICATION_KEEP_ALIVE_SECS") {
            let secs: u64 = secs.parse().map_err(|e| {
                ClassificationCoreError::ConfigurationError(format!("Invalid keep_alive_secs: {e}"))
            })?;
            config.shared_keep_alive = Duration::from_secs(secs);
        }

        if let Ok(millis) = std::env::var("CLASSIFICATION_POLL_INTERVAL_MS") {
            let millis: u64 = millis.parse().map_err(|e| {
                ClassificationCoreError::ConfigurationError(format!(
                    "Invalid poll_interval_ms: {e}"
                ))
            })?;
            config.poll_interval = Duration::from_millis(millis);
        }

        if let Ok(limit) = std::env::var("CLASSIFICATION_MAX_CONCURRENT") {
            config.max_concurrent_classifications = limit.parse().map_err(|e| {
                ClassificationCoreError::ConfigurationError(format!("Invalid max_concurrent: {e}"))
            })?;
        }

        if let Ok(id) = std::env::var("CLASSIFICATION_DEFAULT_CLASSIFIER") {
            config.default_classifier_id = id;
        }

        if config.maximum_service_count == 0 {
            return Err(ClassificationCoreError::ConfigurationError(
                "max_sessions must be at least 1".to_string(),
            ));
        }

        if config.max_concurrent_classifications == 0 {
            return Err(ClassificationCoreError::ConfigurationError(
                "max_concurrent must be at least 1".to_string(),
            ));
        }

        Ok(config)
    }
}
