use crate::pool::eviction::EvictionHandle;
use crate::scheduling::TargetKey;

/// A fixed slot in the pool's bounded free queue. Slots only exist in the
/// quantity configured at pool construction; holding one is what bounds the
/// number of live sessions.
#[derive(Debug)]
pub(crate) struct LeaseSlot {
    id: usize,
}

impl LeaseSlot {
    pub fn new(id: usize) -> Self {
        Self { id }
    }

    pub fn id(&self) -> usize {
        self.id
    }
}

/// Temporary, revocable handle to one pooled session.
///
/// Carries the target the session is bound to, the shared/exclusive flag it
/// was taken with, and (while parked in the shared cache) the handle to its
/// pending eviction.
pub struct ServiceLease<S> {
    slot: LeaseSlot,
    target: TargetKey,
    shared: bool,
    service: Option<S>,
    eviction: Option<EvictionHandle>,
}

impl<S> ServiceLease<S> {
    pub(crate) fn new(slot: LeaseSlot, target: TargetKey, shared: bool, service: S) -> Self {
        Self {
            slot,
            target,
            shared,
            service: Some(service),
            eviction: None,
        }
    }

    pub fn target(&self) -> &TargetKey {
        &self.target
    }

    pub fn is_shared(&self) -> bool {
        self.shared
    }

    pub fn service(&self) -> &S {
        self.service
            .as_ref()
            .expect("lease service accessed after retirement")
    }

    pub fn service_mut(&mut self) -> &mut S {
        self.service
            .as_mut()
            .expect("lease service accessed after retirement")
    }

    pub(crate) fn slot_id(&self) -> usize {
        self.slot.id()
    }

    pub(crate) fn take_service(&mut self) -> Option<S> {
        self.service.take()
    }

    pub(crate) fn replace_service(&mut self, service: S) {
        self.service = Some(service);
    }

    /// Cancel a pending eviction, if any. Returns `true` when a pending
    /// eviction was actually cancelled by this call.
    pub(crate) fn cancel_eviction(&mut self) -> bool {
        self.eviction.take().map(|h| h.cancel()).unwrap_or(false)
    }

    pub(crate) fn set_eviction(&mut self, handle: EvictionHandle) {
        self.eviction = Some(handle);
    }

    /// Downgrade a shared lease so release retires the session instead of
    /// parking it for reuse. Used when the session is no longer trustworthy
    /// (a failed classification run).
    pub(crate) fn demote_to_exclusive(&mut self) {
        self.shared = false;
    }

    /// Strip the lease down to its slot so it can re-enter the free queue.
    pub(crate) fn into_slot(self) -> LeaseSlot {
        self.slot
    }
}

impl<S> std::fmt::Debug for ServiceLease<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceLease")
            .field("slot", &self.slot.id())
            .field("target", &self.target)
            .field("shared", &self.shared)
            .field("held", &self.service.is_some())
            .finish()
    }
}
