use crate::scheduling::TargetKey;
use crate::taxonomy::Taxonomy;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

/// A completed classification, retained for review and persistence.
///
/// External edits to the target branch mark the outcome stale; consumers
/// decide whether a stale taxonomy is still worth showing.
#[derive(Debug)]
pub struct ClassificationOutcome {
    run_id: Uuid,
    target: TargetKey,
    taxonomy: Taxonomy,
    completed_at: DateTime<Utc>,
    elapsed: Duration,
    stale: AtomicBool,
}

impl ClassificationOutcome {
    pub fn new(run_id: Uuid, target: TargetKey, taxonomy: Taxonomy, elapsed: Duration) -> Self {
        Self {
            run_id,
            target,
            taxonomy,
            completed_at: Utc::now(),
            elapsed,
            stale: AtomicBool::new(false),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn target(&self) -> &TargetKey {
        &self.target
    }

    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn is_stale(&self) -> bool {
        self.stale.load(Ordering::SeqCst)
    }

    pub fn set_stale(&self) {
        self.stale.store(true, Ordering::SeqCst);
    }
}

/// Bounded in-memory retention of classification outcomes, keyed by run id.
///
/// Once capacity is reached the oldest outcome is dropped; persistence of
/// results a client wants to keep is a separate, explicit step outside this
/// core.
pub struct ResultRegistry {
    capacity: usize,
    entries: Mutex<VecDeque<Arc<ClassificationOutcome>>>,
}

impl ResultRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Mutex::new(VecDeque::new()),
        }
    }

    pub fn put(&self, outcome: Arc<ClassificationOutcome>) {
        let mut entries = self.entries.lock();
        entries.retain(|existing| existing.run_id() != outcome.run_id());
        entries.push_back(outcome);
        while entries.len() > self.capacity {
            if let Some(evicted) = entries.pop_front() {
                debug!(run_id = %evicted.run_id(), "Evicted oldest classification result");
            }
        }
    }

    pub fn get(&self, run_id: Uuid) -> Option<Arc<ClassificationOutcome>> {
        self.entries
            .lock()
            .iter()
            .find(|outcome| outcome.run_id() == run_id)
            .cloned()
    }

    pub fn remove(&self, run_id: Uuid) -> Option<Arc<ClassificationOutcome>> {
        let mut entries = self.entries.lock();
        let position = entries
            .iter()
            .position(|outcome| outcome.run_id() == run_id)?;
        entries.remove(position)
    }

    /// Mark every retained outcome for `target` stale. Returns how many
    /// were marked.
    pub fn set_stale(&self, target: &TargetKey) -> usize {
        let entries = self.entries.lock();
        let mut marked = 0;
        for outcome in entries.iter() {
            if outcome.target() == target && !outcome.is_stale() {
                outcome.set_stale();
                marked += 1;
            }
        }
        marked
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(target: &TargetKey) -> Arc<ClassificationOutcome> {
        Arc::new(ClassificationOutcome::new(
            Uuid::new_v4(),
            target.clone(),
            Taxonomy::default(),
            Duration::from_secs(1),
        ))
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let registry = ResultRegistry::new(2);
        let target = TargetKey::new("snomed", "MAIN");

        let first = outcome(&target);
        let second = outcome(&target);
        let third = outcome(&target);

        registry.put(Arc::clone(&first));
        registry.put(Arc::clone(&second));
        registry.put(Arc::clone(&third));

        assert_eq!(registry.len(), 2);
        assert!(registry.get(first.run_id()).is_none());
        assert!(registry.get(second.run_id()).is_some());
        assert!(registry.get(third.run_id()).is_some());
    }

    #[test]
    fn test_stale_marking_is_per_target() {
        let registry = ResultRegistry::new(4);
        let main = TargetKey::new("snomed", "MAIN");
        let project = TargetKey::new("snomed", "MAIN/project");

        let on_main = outcome(&main);
        let on_project = outcome(&project);
        registry.put(Arc::clone(&on_main));
        registry.put(Arc::clone(&on_project));

        assert_eq!(registry.set_stale(&main), 1);
        assert!(on_main.is_stale());
        assert!(!on_project.is_stale());

        // Marking again is a no-op.
        assert_eq!(registry.set_stale(&main), 0);
    }

    #[test]
    fn test_remove() {
        let registry = ResultRegistry::new(4);
        let target = TargetKey::new("snomed", "MAIN");
        let entry = outcome(&target);
        registry.put(Arc::clone(&entry));

        assert!(registry.remove(entry.run_id()).is_some());
        assert!(registry.get(entry.run_id()).is_none());
        assert!(registry.is_empty());
    }
}
