use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Identifies the code system branch a classification runs against.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetKey {
    /// Code system identifier (e.g. the repository holding the ontology).
    pub system: String,
    /// Branch or version within the code system.
    pub branch: String,
}

impl TargetKey {
    pub fn new(system: impl Into<String>, branch: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            branch: branch.into(),
        }
    }
}

impl fmt::Display for TargetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.system, self.branch)
    }
}

/// Monotonically increasing sequence used to assign scheduling slots.
///
/// Injected into the [`AdmissionController`] instead of living in a process
/// global, so tests can construct and reset it deterministically. The counter
/// is never reset in production use; round-robin distribution over the slot
/// range holds even under bursty submission.
#[derive(Debug, Clone, Default)]
pub struct SlotSequence {
    counter: Arc<AtomicU64>,
}

impl SlotSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next value of the sequence. Wrapping is harmless: the modulo applied
    /// by the controller keeps slot ids inside the configured range.
    pub fn next(&self) -> u64 {
        self.counter.fetch_add(1, Ordering::Relaxed)
    }
}

/// Conflict predicate attached to every classification job submission.
///
/// Two rules conflict iff their slot ids are equal (global concurrency
/// ceiling reached) or they name the same target (no two classifications may
/// run on the same branch simultaneously). Created once per submission
/// attempt; carries no persistent identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulingRule {
    slot: u32,
    target: TargetKey,
}

impl SchedulingRule {
    pub fn slot(&self) -> u32 {
        self.slot
    }

    pub fn target(&self) -> &TargetKey {
        &self.target
    }

    /// True when the external scheduler must not run the two jobs at once.
    pub fn conflicts_with(&self, other: &SchedulingRule) -> bool {
        self.slot == other.slot || self.target == other.target
    }
}

/// Creates scheduling rules with round-robin slot assignment.
#[derive(Debug, Clone)]
pub struct AdmissionController {
    sequence: SlotSequence,
    concurrency_limit: u32,
}

impl AdmissionController {
    /// `concurrency_limit` must be at least 1; slot ids fall in
    /// `[0, concurrency_limit)`.
    pub fn new(concurrency_limit: u32, sequence: SlotSequence) -> Self {
        debug_assert!(concurrency_limit > 0, "concurrency limit must be positive");
        Self {
            sequence,
            concurrency_limit,
        }
    }

    pub fn concurrency_limit(&self) -> u32 {
        self.concurrency_limit
    }

    pub fn create_rule(&self, target: &TargetKey) -> SchedulingRule {
        let slot = (self.sequence.next() % u64::from(self.concurrency_limit)) as u32;
        SchedulingRule {
            slot,
            target: target.clone(),
        }
    }
}
