use crate::config::ClassificationConfig;
use crate::pool::eviction::EvictionScheduler;
use crate::pool::lease::{LeaseSlot, ServiceLease};
use crate::scheduling::TargetKey;
use async_trait::async_trait;
use crossbeam::queue::ArrayQueue;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

#[derive(Error, Debug, Clone)]
pub enum PoolError {
    #[error("service pool has been shut down")]
    ShutDown,

    #[error("failed to create pooled service: {message}")]
    CreateFailed { message: String },

    #[error("failed to retire pooled service: {message}")]
    RetireFailed { message: String },
}

impl PoolError {
    pub fn create_failed(message: impl Into<String>) -> Self {
        Self::CreateFailed {
            message: message.into(),
        }
    }

    pub fn retire_failed(message: impl Into<String>) -> Self {
        Self::RetireFailed {
            message: message.into(),
        }
    }
}

/// Hooks the pool calls to construct, compare and tear down the expensive
/// session objects it manages.
#[async_trait]
pub trait ServiceFactory: Send + Sync + 'static {
    type Service: Send + Sync + 'static;
    type Params: Send + Sync;

    /// Build a new session for `target`. Failures propagate to the
    /// `take_lease` caller; the pool slot is returned, never leaked.
    async fn create(
        &self,
        target: &TargetKey,
        shared: bool,
        params: &Self::Params,
    ) -> Result<Self::Service, PoolError>;

    /// Tear a session down, releasing whatever it holds.
    async fn retire(&self, service: Self::Service) -> Result<(), PoolError>;

    /// Whether a cached session can serve a request with `params` as-is.
    fn matches_params(&self, service: &Self::Service, params: &Self::Params) -> bool;
}

struct SharedEntry<S> {
    lease: ServiceLease<S>,
    retired_at: Instant,
    eviction_id: u64,
}

struct PoolInner<F: ServiceFactory> {
    factory: F,
    free_slots: ArrayQueue<LeaseSlot>,
    shared: DashMap<TargetKey, SharedEntry<F::Service>>,
    scheduler: EvictionScheduler,
    keep_alive: Duration,
    slot_wait: Duration,
    shut_down: AtomicBool,
}

impl<F: ServiceFactory> PoolInner<F> {
    /// Retire a lease's session (logging failures) and return its slot to
    /// the free queue. Used on every eviction path, where retirement is
    /// advisory bookkeeping that must not wedge the pool.
    async fn dispose_lease(&self, mut lease: ServiceLease<F::Service>) {
        if let Some(service) = lease.take_service() {
            if let Err(error) = self.factory.retire(service).await {
                error!(%error, target = %lease.target(), "Failed to retire evicted session");
            }
        }
        let _ = self.free_slots.push(lease.into_slot());
    }
}

async fn evict_expired<F: ServiceFactory>(
    inner: Arc<PoolInner<F>>,
    target: TargetKey,
    eviction_id: u64,
) {
    if inner.shut_down.load(Ordering::SeqCst) {
        // Pool shut down first; its own teardown handles the cache.
        return;
    }
    let removed = inner
        .shared
        .remove_if(&target, |_, entry| entry.eviction_id == eviction_id);
    if let Some((_, entry)) = removed {
        debug!(%target, "Evicting shared session after keep-alive");
        inner.dispose_lease(entry.lease).await;
    }
}

/// Bounded pool of classifier sessions.
///
/// At most `maximum_service_count` sessions are live at any instant,
/// counting both leased and shared-idle ones. Sessions released as shared
/// stay reusable for their target until the keep-alive window elapses.
pub struct ServicePool<F: ServiceFactory> {
    inner: Arc<PoolInner<F>>,
}

impl<F: ServiceFactory> Clone for ServicePool<F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<F: ServiceFactory> ServicePool<F> {
    /// Create a pool with `maximum_service_count` slots. Must be called
    /// within a Tokio runtime; the pool owns a background eviction loop.
    pub fn new(
        factory: F,
        maximum_service_count: usize,
        keep_alive: Duration,
        slot_wait: Duration,
    ) -> Self {
        let capacity = maximum_service_count.max(1);
        let free_slots = ArrayQueue::new(capacity);
        for id in 0..capacity {
            let _ = free_slots.push(LeaseSlot::new(id));
        }

        info!(
            maximum_service_count = capacity,
            keep_alive_secs = keep_alive.as_secs(),
            "🧠 Initialized classifier session pool"
        );

        Self {
            inner: Arc::new(PoolInner {
                factory,
                free_slots,
                shared: DashMap::new(),
                scheduler: EvictionScheduler::start(),
                keep_alive,
                slot_wait,
                shut_down: AtomicBool::new(false),
            }),
        }
    }

    pub fn from_config(factory: F, config: &ClassificationConfig) -> Self {
        Self::new(
            factory,
            config.maximum_service_count,
            config.shared_keep_alive,
            config.slot_wait,
        )
    }

    /// Lease a session for `target`.
    ///
    /// A shared request first tries the shared cache: a hit cancels the
    /// pending eviction and, when the cached session's parameters no longer
    /// match, replaces the session in place. Otherwise a free slot is
    /// claimed, waiting with periodic wake-ups; when the pool is saturated
    /// by idle shared sessions, the oldest one is force-evicted to keep the
    /// caller from deadlocking.
    pub async fn take_lease(
        &self,
        target: &TargetKey,
        shared: bool,
        params: &F::Params,
    ) -> Result<ServiceLease<F::Service>, PoolError> {
        let inner = &self.inner;
        if inner.shut_down.load(Ordering::SeqCst) {
            return Err(PoolError::ShutDown);
        }

        if shared {
            if let Some((_, mut entry)) = inner.shared.remove(target) {
                entry.lease.cancel_eviction();

                if inner.factory.matches_params(entry.lease.service(), params) {
                    debug!(%target, "Reusing shared session");
                    return Ok(entry.lease);
                }

                // Parameters changed: swap the session without giving up the slot.
                debug!(%target, "Replacing shared session with mismatched parameters");
                let old = entry
                    .lease
                    .take_service()
                    .expect("cached shared lease holds a service");
                if let Err(e) = inner.factory.retire(old).await {
                    let _ = inner.free_slots.push(entry.lease.into_slot());
                    return Err(e);
                }
                match inner.factory.create(target, true, params).await {
                    Ok(service) => {
                        entry.lease.replace_service(service);
                        return Ok(entry.lease);
                    }
                    Err(e) => {
                        let _ = inner.free_slots.push(entry.lease.into_slot());
                        return Err(e);
                    }
                }
            }
        }

        loop {
            if inner.shut_down.load(Ordering::SeqCst) {
                return Err(PoolError::ShutDown);
            }

            if let Some(slot) = inner.free_slots.pop() {
                match inner.factory.create(target, shared, params).await {
                    Ok(service) => {
                        return Ok(ServiceLease::new(slot, target.clone(), shared, service));
                    }
                    Err(e) => {
                        let _ = inner.free_slots.push(slot);
                        return Err(e);
                    }
                }
            }

            tokio::time::sleep(inner.slot_wait).await;

            if inner.free_slots.is_empty() {
                self.evict_oldest_shared().await;
            }
        }
    }

    /// Return a lease to the pool.
    ///
    /// Non-shared leases retire their session immediately. Shared leases
    /// park in the shared cache and are scheduled for eviction after the
    /// keep-alive window.
    pub async fn release_lease(&self, mut lease: ServiceLease<F::Service>) -> Result<(), PoolError> {
        let inner = &self.inner;

        if !lease.is_shared() || inner.shut_down.load(Ordering::SeqCst) {
            if let Some(service) = lease.take_service() {
                inner.factory.retire(service).await?;
            }
            let _ = inner.free_slots.push(lease.into_slot());
            return Ok(());
        }

        let target = lease.target().clone();
        let handle = {
            let pool = Arc::clone(inner);
            let task_target = target.clone();
            inner.scheduler.schedule(inner.keep_alive, move |id| {
                Box::pin(evict_expired(pool, task_target, id))
            })
        };
        let eviction_id = handle.id();
        lease.set_eviction(handle);

        debug!(%target, slot = lease.slot_id(), "Parking shared session");
        inner.shared.insert(
            target,
            SharedEntry {
                lease,
                retired_at: Instant::now(),
                eviction_id,
            },
        );
        Ok(())
    }

    /// Force-evict the oldest shared entry, freeing its slot.
    async fn evict_oldest_shared(&self) {
        let inner = &self.inner;
        let oldest = inner
            .shared
            .iter()
            .min_by_key(|entry| entry.value().retired_at)
            .map(|entry| entry.key().clone());
        let Some(target) = oldest else { return };

        if let Some((_, mut entry)) = inner.shared.remove(&target) {
            entry.lease.cancel_eviction();
            warn!(%target, "Force-evicting idle shared session to free a slot");
            inner.dispose_lease(entry.lease).await;
        }
    }

    /// Run `f` against the shared cached session for `target`, if present.
    pub fn with_shared_service<R>(
        &self,
        target: &TargetKey,
        f: impl FnOnce(&F::Service) -> R,
    ) -> Option<R> {
        self.inner
            .shared
            .get(target)
            .map(|entry| f(entry.lease.service()))
    }

    /// Whether a classification could start right now without waiting.
    pub fn has_available_capacity(&self) -> bool {
        !self.inner.free_slots.is_empty() || !self.inner.shared.is_empty()
    }

    pub fn free_slot_count(&self) -> usize {
        self.inner.free_slots.len()
    }

    pub fn shared_count(&self) -> usize {
        self.inner.shared.len()
    }

    /// Stop the eviction clock, force-evict every shared entry and refuse
    /// further leases.
    pub async fn shutdown(&self) {
        let inner = &self.inner;
        if inner.shut_down.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("🛑 Shutting down classifier session pool");

        inner.scheduler.shutdown().await;

        let targets: Vec<TargetKey> = inner.shared.iter().map(|e| e.key().clone()).collect();
        for target in targets {
            if let Some((_, mut entry)) = inner.shared.remove(&target) {
                entry.lease.cancel_eviction();
                inner.dispose_lease(entry.lease).await;
            }
        }
    }
}
