use crate::classifier::ConceptId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One element of the taxonomy's dependency-ordered iteration sequence.
///
/// `DepthBoundary` signals that every node of the breadth-first layer just
/// completed is fully finalized; consumers caching ancestor data per depth
/// may release the previous layer at that point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IterationEntry {
    Concept(ConceptId),
    DepthBoundary,
}

/// A group of concepts the classifier proved logically equivalent, reduced
/// to one representative plus its remaining members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquivalenceSet {
    /// Canonical member: the smallest already-persisted identifier, falling
    /// back to the smallest identifier overall.
    pub representative: ConceptId,
    /// Every other member of the group; never contains the representative.
    pub members: Vec<ConceptId>,
}

/// Normalized classification output.
///
/// Built incrementally during the taxonomy walk, immutable once returned.
/// Every concept identifier appears exactly once in the iteration order and
/// in at most one of the unsatisfiable set or the edge-set domain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Taxonomy {
    parents: BTreeMap<ConceptId, BTreeSet<ConceptId>>,
    unsatisfiable: BTreeSet<ConceptId>,
    equivalences: BTreeMap<ConceptId, Vec<ConceptId>>,
    iteration_order: Vec<IterationEntry>,
}

impl Taxonomy {
    pub(crate) fn from_parts(
        parents: BTreeMap<ConceptId, BTreeSet<ConceptId>>,
        unsatisfiable: BTreeSet<ConceptId>,
        equivalences: BTreeMap<ConceptId, Vec<ConceptId>>,
        iteration_order: Vec<IterationEntry>,
    ) -> Self {
        Self {
            parents,
            unsatisfiable,
            equivalences,
            iteration_order,
        }
    }

    /// Direct parents of `concept`, or `None` when the concept is not part
    /// of the edge-set domain (unsatisfiable or unknown).
    pub fn parents(&self, concept: &str) -> Option<&BTreeSet<ConceptId>> {
        self.parents.get(concept)
    }

    /// Every concept that owns a (possibly empty) direct-parent edge set.
    pub fn edge_domain(&self) -> impl Iterator<Item = &ConceptId> {
        self.parents.keys()
    }

    pub fn unsatisfiable_ids(&self) -> &BTreeSet<ConceptId> {
        &self.unsatisfiable
    }

    pub fn is_unsatisfiable(&self, concept: &str) -> bool {
        self.unsatisfiable.contains(concept)
    }

    /// Members equivalent to `representative`, excluding the representative
    /// itself.
    pub fn equivalent_concepts(&self, representative: &str) -> Option<&[ConceptId]> {
        self.equivalences.get(representative).map(Vec::as_slice)
    }

    /// The dependency-ordered concept sequence, interleaved with depth
    /// boundaries.
    pub fn iteration_order(&self) -> &[IterationEntry] {
        &self.iteration_order
    }

    /// Concept identifiers in iteration order, boundaries stripped.
    pub fn ordered_concept_ids(&self) -> impl Iterator<Item = &ConceptId> {
        self.iteration_order.iter().filter_map(|entry| match entry {
            IterationEntry::Concept(id) => Some(id),
            IterationEntry::DepthBoundary => None,
        })
    }

    /// Equivalence groups as reviewable sets, sorted by representative.
    pub fn equivalence_sets(&self) -> Vec<EquivalenceSet> {
        self.equivalences
            .iter()
            .map(|(representative, members)| EquivalenceSet {
                representative: representative.clone(),
                members: members.clone(),
            })
            .collect()
    }

    /// Total number of finalized concepts (satisfiable and unsatisfiable).
    pub fn concept_count(&self) -> usize {
        self.parents.len() + self.unsatisfiable.len()
    }
}
