use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

/// Persisted concept identifier. Ordering is lexicographic, which is also
/// the tie-break order used when picking equivalence representatives.
pub type ConceptId = String;

/// Opaque handle to a single class inside the classifier's ontology.
///
/// A handle may or may not map back to a persisted concept; unmapped handles
/// (the top/bottom elements, anonymous classes introduced by axiom
/// normalization) are ignored during taxonomy extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassHandle(pub u64);

/// Opaque handle to one equivalence class ("node") in the classifier's
/// inferred hierarchy. Every member class of a node is logically equivalent
/// to every other member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u64);

/// Errors surfaced by classifier queries and concept resolution.
///
/// Any failure during a taxonomy walk is fatal for that run; there is no
/// partial-result recovery.
#[derive(Error, Debug, Clone)]
pub enum ClassifierError {
    #[error("classifier query failed: {message}")]
    Query { message: String },

    #[error("concept resolution failed: {message}")]
    Resolution { message: String },

    #[error("classifier construction failed: {message}")]
    Construction { message: String },
}

impl ClassifierError {
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }

    pub fn resolution(message: impl Into<String>) -> Self {
        Self::Resolution {
            message: message.into(),
        }
    }

    pub fn construction(message: impl Into<String>) -> Self {
        Self::Construction {
            message: message.into(),
        }
    }
}

/// An ontology classifier that has already computed subsumption over the
/// target concept hierarchy.
///
/// The inferred hierarchy is a DAG of equivalence nodes reachable from a
/// single top element; the bottom element collects every unsatisfiable
/// class. Implementations are expected to be cheap to query repeatedly:
/// the taxonomy walk revisits nodes through multiple parents.
pub trait OntologyClassifier: Send + Sync {
    /// The hierarchy's top element.
    fn top_node(&self) -> NodeId;

    /// The hierarchy's bottom element (universal unsatisfiable class).
    fn bottom_node(&self) -> NodeId;

    fn is_top(&self, node: NodeId) -> bool {
        node == self.top_node()
    }

    fn is_bottom(&self, node: NodeId) -> bool {
        node == self.bottom_node()
    }

    /// Direct subclass nodes of `node`.
    fn direct_subclasses(&self, node: NodeId) -> Result<Vec<NodeId>, ClassifierError>;

    /// Direct superclass nodes of `node`.
    fn direct_superclasses(&self, node: NodeId) -> Result<Vec<NodeId>, ClassifierError>;

    /// The class handles proven equivalent within `node`.
    fn node_members(&self, node: NodeId) -> Result<Vec<ClassHandle>, ClassifierError>;

    /// Release any native resources held by the classifier. Called exactly
    /// once, when the owning session is retired.
    fn dispose(&mut self);
}

/// Maps classifier-internal class handles back to persisted concept
/// identifiers.
pub trait ConceptMapper: Send + Sync {
    /// `None` when the handle has no concept counterpart (top, bottom,
    /// anonymous classes).
    fn concept_id(&self, class: ClassHandle) -> Option<ConceptId>;
}

/// Reports which candidate concept identifiers already exist in the concept
/// catalog, for deterministic equivalence-representative selection.
pub trait ConceptResolver: Send + Sync {
    /// The returned identifiers are a subset of `candidates`, sorted
    /// ascending.
    fn persisted_ids(
        &self,
        candidates: &BTreeSet<ConceptId>,
    ) -> Result<Vec<ConceptId>, ClassifierError>;
}
