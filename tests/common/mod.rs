//! Shared fixtures for integration tests: a canned subsumption hierarchy
//! standing in for a real ontology classifier, plus static concept mapping
//! and resolution.

use classification_core::classifier::{
    ClassHandle, ClassifierConstructor, ClassifierError, ClassifierRegistry, ConceptId,
    ConceptMapper, ConceptResolver, NodeId, OntologyClassifier,
};
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const TOP: NodeId = NodeId(0);
pub const BOTTOM: NodeId = NodeId(1);

pub fn node(id: u64) -> NodeId {
    NodeId(id)
}

/// A pre-classified hierarchy backed by adjacency maps.
pub struct CannedClassifier {
    children: HashMap<NodeId, Vec<NodeId>>,
    parents: HashMap<NodeId, Vec<NodeId>>,
    members: HashMap<NodeId, Vec<ClassHandle>>,
    disposals: Arc<AtomicUsize>,
}

impl CannedClassifier {
    pub fn new(
        edges: &[(NodeId, NodeId)],
        members: &[(NodeId, &[u64])],
        disposals: Arc<AtomicUsize>,
    ) -> Self {
        let mut children: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        let mut parents: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        for (parent, child) in edges {
            children.entry(*parent).or_default().push(*child);
            parents.entry(*child).or_default().push(*parent);
        }
        Self {
            children,
            parents,
            members: members
                .iter()
                .map(|(node, handles)| (*node, handles.iter().map(|h| ClassHandle(*h)).collect()))
                .collect(),
            disposals,
        }
    }
}

impl OntologyClassifier for CannedClassifier {
    fn top_node(&self) -> NodeId {
        TOP
    }

    fn bottom_node(&self) -> NodeId {
        BOTTOM
    }

    fn direct_subclasses(&self, node: NodeId) -> Result<Vec<NodeId>, ClassifierError> {
        Ok(self.children.get(&node).cloned().unwrap_or_default())
    }

    fn direct_superclasses(&self, node: NodeId) -> Result<Vec<NodeId>, ClassifierError> {
        Ok(self.parents.get(&node).cloned().unwrap_or_default())
    }

    fn node_members(&self, node: NodeId) -> Result<Vec<ClassHandle>, ClassifierError> {
        Ok(self.members.get(&node).cloned().unwrap_or_default())
    }

    fn dispose(&mut self) {
        self.disposals.fetch_add(1, Ordering::SeqCst);
    }
}

/// Static class-handle to concept-id mapping.
pub struct StaticMapper(HashMap<u64, ConceptId>);

impl StaticMapper {
    pub fn new(pairs: &[(u64, &str)]) -> Self {
        Self(
            pairs
                .iter()
                .map(|(handle, id)| (*handle, (*id).to_string()))
                .collect(),
        )
    }
}

impl ConceptMapper for StaticMapper {
    fn concept_id(&self, class: ClassHandle) -> Option<ConceptId> {
        self.0.get(&class.0).cloned()
    }
}

/// Resolver reporting a fixed set of identifiers as persisted.
pub struct StaticResolver(BTreeSet<ConceptId>);

impl StaticResolver {
    pub fn new(persisted: &[&str]) -> Self {
        Self(persisted.iter().map(|id| (*id).to_string()).collect())
    }
}

impl ConceptResolver for StaticResolver {
    fn persisted_ids(
        &self,
        candidates: &BTreeSet<ConceptId>,
    ) -> Result<Vec<ConceptId>, ClassifierError> {
        Ok(candidates
            .iter()
            .filter(|id| self.0.contains(*id))
            .cloned()
            .collect())
    }
}

/// Registry with one canned classifier under `id`, counting constructions
/// and disposals.
pub fn canned_registry(
    id: &str,
    edges: Vec<(NodeId, NodeId)>,
    members: Vec<(NodeId, Vec<u64>)>,
) -> (Arc<ClassifierRegistry>, Arc<AtomicUsize>, Arc<AtomicUsize>) {
    let registry = Arc::new(ClassifierRegistry::new());
    let constructions = Arc::new(AtomicUsize::new(0));
    let disposals = Arc::new(AtomicUsize::new(0));

    let ctor_constructions = Arc::clone(&constructions);
    let ctor_disposals = Arc::clone(&disposals);
    let constructor: ClassifierConstructor = Box::new(move |_request| {
        ctor_constructions.fetch_add(1, Ordering::SeqCst);
        let member_refs: Vec<(NodeId, &[u64])> = members
            .iter()
            .map(|(node, handles)| (*node, handles.as_slice()))
            .collect();
        Ok(Box::new(CannedClassifier::new(
            &edges,
            &member_refs,
            Arc::clone(&ctor_disposals),
        )))
    });
    registry.register(id, constructor);

    (registry, constructions, disposals)
}
