//! # Taxonomy Extraction
//!
//! Converts the classifier's inferred subsumption hierarchy into the
//! normalized [`Taxonomy`] handed to downstream review and persistence:
//! direct-parent edges, unsatisfiable concepts, equivalence groups and a
//! dependency-ordered iteration sequence.
//!
//! The walk is breadth-first from the hierarchy's top element and enforces
//! one ordering guarantee everything downstream relies on: a node is
//! finalized only after every one of its direct superclass nodes has been
//! finalized. Consumers that cache per-depth data can release it at each
//! depth-boundary marker, which is only emitted once no node is still
//! waiting on an unfinished parent.

pub mod inferrer;
pub mod types;

use crate::classifier::ClassifierError;
use thiserror::Error;

pub use inferrer::TaxonomyInferrer;
pub use types::{EquivalenceSet, IterationEntry, Taxonomy};

/// Errors fatal to one taxonomy extraction run. No partial taxonomy is ever
/// returned.
#[derive(Error, Debug, Clone)]
pub enum ExtractionError {
    #[error(transparent)]
    Classifier(#[from] ClassifierError),

    #[error("taxonomy traversal stalled with {deferred} nodes still waiting on parents")]
    StalledTraversal { deferred: usize },
}
