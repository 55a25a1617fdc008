use crate::classifier::{ConceptId, ConceptMapper, ConceptResolver, NodeId, OntologyClassifier};
use crate::taxonomy::types::{IterationEntry, Taxonomy};
use crate::taxonomy::ExtractionError;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::mem;
use tracing::{debug, trace};

/// Breadth-first, dependency-ordered walk over the classifier's inferred
/// node hierarchy.
///
/// Nodes are finalized strictly after all of their direct superclass nodes.
/// A node encountered before its parents are done is deferred rather than
/// retried explicitly: in a DAG reachable from the top element, the node is
/// re-emitted as a child whenever any other parent finalizes, so the walk
/// revisits it without a retry queue. The deferred set exists to gate the
/// depth-boundary markers in the iteration order.
pub struct TaxonomyInferrer<'a> {
    classifier: &'a dyn OntologyClassifier,
    mapper: &'a dyn ConceptMapper,
    resolver: &'a dyn ConceptResolver,

    processed: HashSet<ConceptId>,
    deferred: HashSet<NodeId>,
    member_cache: HashMap<NodeId, BTreeSet<ConceptId>>,
    bottom_visited: bool,

    parents: BTreeMap<ConceptId, BTreeSet<ConceptId>>,
    unsatisfiable: BTreeSet<ConceptId>,
    equivalences: BTreeMap<ConceptId, Vec<ConceptId>>,
    iteration_order: Vec<IterationEntry>,
}

impl<'a> TaxonomyInferrer<'a> {
    pub fn new(
        classifier: &'a dyn OntologyClassifier,
        mapper: &'a dyn ConceptMapper,
        resolver: &'a dyn ConceptResolver,
    ) -> Self {
        Self {
            classifier,
            mapper,
            resolver,
            processed: HashSet::new(),
            deferred: HashSet::new(),
            member_cache: HashMap::new(),
            bottom_visited: false,
            parents: BTreeMap::new(),
            unsatisfiable: BTreeSet::new(),
            equivalences: BTreeMap::new(),
            iteration_order: Vec::new(),
        }
    }

    /// Walk the hierarchy and assemble the taxonomy. Consumes the inferrer;
    /// one instance serves exactly one run.
    pub fn infer(mut self) -> Result<Taxonomy, ExtractionError> {
        let top = self.classifier.top_node();
        let mut current: VecDeque<NodeId> = self.classifier.direct_subclasses(top)?.into();
        let mut next: VecDeque<NodeId> = VecDeque::new();

        while !current.is_empty() || !next.is_empty() {
            while let Some(node) = current.pop_front() {
                self.deferred.remove(&node);
                self.visit(node, &mut next)?;
            }

            if self.deferred.is_empty() {
                // No node is waiting on an unfinished parent: everything in
                // the layer just completed is final.
                self.iteration_order.push(IterationEntry::DepthBoundary);
            }

            mem::swap(&mut current, &mut next);
        }

        if !self.deferred.is_empty() {
            // Unreachable for a well-formed DAG: a deferred node is always
            // re-emitted once its remaining parents finalize. Treat a stall
            // as a classifier contract violation rather than dropping
            // concepts silently.
            return Err(ExtractionError::StalledTraversal {
                deferred: self.deferred.len(),
            });
        }

        debug!(
            concepts = self.parents.len() + self.unsatisfiable.len(),
            unsatisfiable = self.unsatisfiable.len(),
            equivalence_groups = self.equivalences.len(),
            "Taxonomy extraction complete"
        );

        Ok(Taxonomy::from_parts(
            self.parents,
            self.unsatisfiable,
            self.equivalences,
            self.iteration_order,
        ))
    }

    fn visit(&mut self, node: NodeId, next: &mut VecDeque<NodeId>) -> Result<(), ExtractionError> {
        if self.classifier.is_top(node) {
            // The top element carries no concepts, but its children still
            // seed the following round.
            next.extend(self.classifier.direct_subclasses(node)?);
            return Ok(());
        }

        let concept_ids = self.mapped_ids(node)?;
        if concept_ids.iter().all(|id| self.processed.contains(id)) {
            // Already finalized (vacuously so for fully unmapped nodes).
            return Ok(());
        }

        if self.classifier.is_bottom(node) {
            if !self.bottom_visited {
                self.bottom_visited = true;
                self.finalize_unsatisfiable(&concept_ids);
            }
            // The bottom node never contributes children.
            return Ok(());
        }

        let mut parent_concept_ids: BTreeSet<ConceptId> = BTreeSet::new();
        for parent in self.classifier.direct_superclasses(node)? {
            if self.classifier.is_top(parent) {
                continue;
            }
            let parent_ids = self.mapped_ids(parent)?;
            if !parent_ids.iter().all(|id| self.processed.contains(id)) {
                trace!(?node, ?parent, "Deferring node with unfinalized parent");
                self.deferred.insert(node);
                return Ok(());
            }
            parent_concept_ids.extend(parent_ids);
        }

        self.finalize(&concept_ids, parent_concept_ids)?;
        next.extend(self.classifier.direct_subclasses(node)?);
        Ok(())
    }

    /// Concept identifiers a node maps to; unmapped class handles are
    /// dropped. Memoized, since parent checks revisit nodes repeatedly.
    fn mapped_ids(&mut self, node: NodeId) -> Result<BTreeSet<ConceptId>, ExtractionError> {
        if let Some(ids) = self.member_cache.get(&node) {
            return Ok(ids.clone());
        }
        let ids: BTreeSet<ConceptId> = self
            .classifier
            .node_members(node)?
            .into_iter()
            .filter_map(|class| self.mapper.concept_id(class))
            .collect();
        self.member_cache.insert(node, ids.clone());
        Ok(ids)
    }

    fn finalize_unsatisfiable(&mut self, concept_ids: &BTreeSet<ConceptId>) {
        for id in concept_ids {
            self.unsatisfiable.insert(id.clone());
            self.processed.insert(id.clone());
            self.iteration_order
                .push(IterationEntry::Concept(id.clone()));
        }
    }

    fn finalize(
        &mut self,
        concept_ids: &BTreeSet<ConceptId>,
        parent_concept_ids: BTreeSet<ConceptId>,
    ) -> Result<(), ExtractionError> {
        if concept_ids.len() > 1 {
            self.record_equivalence(concept_ids)?;
        }

        // Full cross product: every concept in the node receives an edge to
        // every concept of every direct parent node.
        for id in concept_ids {
            self.parents.insert(id.clone(), parent_concept_ids.clone());
            self.processed.insert(id.clone());
            self.iteration_order
                .push(IterationEntry::Concept(id.clone()));
        }
        Ok(())
    }

    fn record_equivalence(&mut self, concept_ids: &BTreeSet<ConceptId>) -> Result<(), ExtractionError> {
        let persisted = self.resolver.persisted_ids(concept_ids)?;
        let representative = persisted
            .first()
            .cloned()
            .or_else(|| concept_ids.iter().next().cloned())
            .expect("equivalence group has at least two members");

        let members: Vec<ConceptId> = concept_ids
            .iter()
            .filter(|id| **id != representative)
            .cloned()
            .collect();

        self.equivalences.insert(representative, members);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{ClassHandle, ClassifierError};
    use parking_lot::Mutex;

    const TOP: NodeId = NodeId(0);
    const BOTTOM: NodeId = NodeId(1);

    struct FixtureClassifier {
        children: HashMap<NodeId, Vec<NodeId>>,
        parents: HashMap<NodeId, Vec<NodeId>>,
        members: HashMap<NodeId, Vec<ClassHandle>>,
        fail_subclasses_of: Option<NodeId>,
        disposed: Mutex<bool>,
    }

    impl FixtureClassifier {
        /// Build a hierarchy from (parent, child) edges and per-node member
        /// handles. Top and bottom exist implicitly.
        fn new(edges: &[(NodeId, NodeId)], members: &[(NodeId, &[u64])]) -> Self {
            let mut children: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
            let mut parents: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
            for (parent, child) in edges {
                children.entry(*parent).or_default().push(*child);
                parents.entry(*child).or_default().push(*parent);
            }
            let members = members
                .iter()
                .map(|(node, handles)| {
                    (*node, handles.iter().map(|h| ClassHandle(*h)).collect())
                })
                .collect();
            Self {
                children,
                parents,
                members,
                fail_subclasses_of: None,
                disposed: Mutex::new(false),
            }
        }
    }

    impl OntologyClassifier for FixtureClassifier {
        fn top_node(&self) -> NodeId {
            TOP
        }

        fn bottom_node(&self) -> NodeId {
            BOTTOM
        }

        fn direct_subclasses(&self, node: NodeId) -> Result<Vec<NodeId>, ClassifierError> {
            if self.fail_subclasses_of == Some(node) {
                return Err(ClassifierError::query("induced subclass query failure"));
            }
            Ok(self.children.get(&node).cloned().unwrap_or_default())
        }

        fn direct_superclasses(&self, node: NodeId) -> Result<Vec<NodeId>, ClassifierError> {
            Ok(self.parents.get(&node).cloned().unwrap_or_default())
        }

        fn node_members(&self, node: NodeId) -> Result<Vec<ClassHandle>, ClassifierError> {
            Ok(self.members.get(&node).cloned().unwrap_or_default())
        }

        fn dispose(&mut self) {
            *self.disposed.lock() = true;
        }
    }

    struct FixtureMapper(HashMap<u64, ConceptId>);

    impl FixtureMapper {
        fn new(pairs: &[(u64, &str)]) -> Self {
            Self(
                pairs
                    .iter()
                    .map(|(handle, id)| (*handle, (*id).to_string()))
                    .collect(),
            )
        }
    }

    impl ConceptMapper for FixtureMapper {
        fn concept_id(&self, class: ClassHandle) -> Option<ConceptId> {
            self.0.get(&class.0).cloned()
        }
    }

    struct FixtureResolver(BTreeSet<ConceptId>);

    impl FixtureResolver {
        fn new(persisted: &[&str]) -> Self {
            Self(persisted.iter().map(|id| (*id).to_string()).collect())
        }
    }

    impl ConceptResolver for FixtureResolver {
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

    fn concepts(taxonomy: &Taxonomy) -> Vec<&str> {
        taxonomy.ordered_concept_ids().map(String::as_str).collect()
    }

    fn boundary_between(taxonomy: &Taxonomy, earlier: &str, later: &str) -> bool {
        let order = taxonomy.iteration_order();
        let position = |id: &str| {
            order
                .iter()
                .position(|e| *e == IterationEntry::Concept(id.to_string()))
                .expect("concept present in iteration order")
        };
        let (from, to) = (position(earlier), position(later));
        assert!(from < to, "{earlier} must precede {later}");
        order[from..to]
            .iter()
            .any(|e| *e == IterationEntry::DepthBoundary)
    }

    #[test]
    fn test_linear_hierarchy_edges_and_order() {
        // Top -> B -> C, bottom below C, nothing equivalent or unsatisfiable.
        let b = NodeId(2);
        let c = NodeId(3);
        let classifier = FixtureClassifier::new(
            &[(TOP, b), (b, c), (c, BOTTOM)],
            &[(b, &[10]), (c, &[11])],
        );
        let mapper = FixtureMapper::new(&[(10, "B"), (11, "C")]);
        let resolver = FixtureResolver::new(&[]);

        let taxonomy = TaxonomyInferrer::new(&classifier, &mapper, &resolver)
            .infer()
            .unwrap();

        // Top is unmapped, so B has an empty parent edge set.
        assert_eq!(taxonomy.parents("B"), Some(&BTreeSet::new()));
        let c_parents: BTreeSet<ConceptId> = ["B".to_string()].into();
        assert_eq!(taxonomy.parents("C"), Some(&c_parents));

        assert_eq!(concepts(&taxonomy), vec!["B", "C"]);
        assert!(boundary_between(&taxonomy, "B", "C"));
        assert!(taxonomy.unsatisfiable_ids().is_empty());
        assert!(taxonomy.equivalence_sets().is_empty());
    }

    #[test]
    fn test_equivalence_prefers_persisted_representative() {
        // "10" and "20" are equivalent; only "10" is persisted.
        let node = NodeId(2);
        let classifier = FixtureClassifier::new(&[(TOP, node)], &[(node, &[1, 2])]);
        let mapper = FixtureMapper::new(&[(1, "10"), (2, "20")]);
        let resolver = FixtureResolver::new(&["10"]);

        let taxonomy = TaxonomyInferrer::new(&classifier, &mapper, &resolver)
            .infer()
            .unwrap();

        assert_eq!(
            taxonomy.equivalent_concepts("10"),
            Some(&["20".to_string()][..])
        );
        assert_eq!(taxonomy.equivalent_concepts("20"), None);

        // Every member of the node receives the full parent edge set.
        assert!(taxonomy.parents("10").is_some());
        assert!(taxonomy.parents("20").is_some());
    }

    #[test]
    fn test_equivalence_falls_back_to_smallest_id() {
        let node = NodeId(2);
        let classifier = FixtureClassifier::new(&[(TOP, node)], &[(node, &[1, 2, 3])]);
        let mapper = FixtureMapper::new(&[(1, "30"), (2, "10"), (3, "20")]);
        let resolver = FixtureResolver::new(&[]);

        let taxonomy = TaxonomyInferrer::new(&classifier, &mapper, &resolver)
            .infer()
            .unwrap();

        assert_eq!(
            taxonomy.equivalent_concepts("10"),
            Some(&["20".to_string(), "30".to_string()][..])
        );
    }

    #[test]
    fn test_unsatisfiable_concepts_have_no_edges() {
        // A is fine; U collapses into the bottom node.
        let a = NodeId(2);
        let classifier = FixtureClassifier::new(
            &[(TOP, a), (a, BOTTOM)],
            &[(a, &[1]), (BOTTOM, &[9])],
        );
        let mapper = FixtureMapper::new(&[(1, "A"), (9, "U")]);
        let resolver = FixtureResolver::new(&["A", "U"]);

        let taxonomy = TaxonomyInferrer::new(&classifier, &mapper, &resolver)
            .infer()
            .unwrap();

        assert!(taxonomy.is_unsatisfiable("U"));
        assert_eq!(taxonomy.parents("U"), None);
        assert!(!taxonomy.edge_domain().any(|id| id == "U"));
        assert_eq!(concepts(&taxonomy).iter().filter(|c| **c == "U").count(), 1);
    }

    #[test]
    fn test_bottom_reachable_from_many_parents_is_processed_once() {
        let a = NodeId(2);
        let b = NodeId(3);
        let classifier = FixtureClassifier::new(
            &[(TOP, a), (TOP, b), (a, BOTTOM), (b, BOTTOM)],
            &[(a, &[1]), (b, &[2]), (BOTTOM, &[9])],
        );
        let mapper = FixtureMapper::new(&[(1, "A"), (2, "B"), (9, "U")]);
        let resolver = FixtureResolver::new(&[]);

        let taxonomy = TaxonomyInferrer::new(&classifier, &mapper, &resolver)
            .infer()
            .unwrap();

        assert_eq!(taxonomy.unsatisfiable_ids().len(), 1);
        assert_eq!(concepts(&taxonomy).iter().filter(|c| **c == "U").count(), 1);
    }

    #[test]
    fn test_deferred_node_finalizes_after_late_parent() {
        // Z's parents sit at different depths: X at depth 1, Y at depth 2
        // (below W). Z defers on first encounter and finalizes only after Y.
        let x = NodeId(2);
        let w = NodeId(3);
        let y = NodeId(4);
        let z = NodeId(5);
        let classifier = FixtureClassifier::new(
            &[(TOP, x), (TOP, w), (w, y), (x, z), (y, z)],
            &[(x, &[1]), (w, &[2]), (y, &[3]), (z, &[4])],
        );
        let mapper = FixtureMapper::new(&[(1, "X"), (2, "W"), (3, "Y"), (4, "Z")]);
        let resolver = FixtureResolver::new(&[]);

        let taxonomy = TaxonomyInferrer::new(&classifier, &mapper, &resolver)
            .infer()
            .unwrap();

        let order = concepts(&taxonomy);
        let index = |id: &str| order.iter().position(|c| *c == id).unwrap();
        assert!(index("Y") < index("Z"), "Z finalizes only after parent Y");

        let z_parents: BTreeSet<ConceptId> = ["X".to_string(), "Y".to_string()].into();
        assert_eq!(taxonomy.parents("Z"), Some(&z_parents));

        // The layer on which Z deferred must not emit a depth boundary
        // between Y and Z.
        assert!(!boundary_between(&taxonomy, "Y", "Z"));
        assert!(boundary_between(&taxonomy, "X", "Y"));
    }

    #[test]
    fn test_diamond_revisit_is_idempotent() {
        // Z is a child of both X and Y at the same depth; the second visit
        // finds it finalized and contributes nothing twice.
        let x = NodeId(2);
        let y = NodeId(3);
        let z = NodeId(4);
        let classifier = FixtureClassifier::new(
            &[(TOP, x), (TOP, y), (x, z), (y, z)],
            &[(x, &[1]), (y, &[2]), (z, &[3])],
        );
        let mapper = FixtureMapper::new(&[(1, "X"), (2, "Y"), (3, "Z")]);
        let resolver = FixtureResolver::new(&[]);

        let taxonomy = TaxonomyInferrer::new(&classifier, &mapper, &resolver)
            .infer()
            .unwrap();

        assert_eq!(concepts(&taxonomy).iter().filter(|c| **c == "Z").count(), 1);
        let z_parents: BTreeSet<ConceptId> = ["X".to_string(), "Y".to_string()].into();
        assert_eq!(taxonomy.parents("Z"), Some(&z_parents));
    }

    #[test]
    fn test_cross_product_edges_for_equivalent_parents() {
        // Parent node {P1, P2} is an equivalence group; child C gets edges
        // to both identifiers.
        let p = NodeId(2);
        let c = NodeId(3);
        let classifier =
            FixtureClassifier::new(&[(TOP, p), (p, c)], &[(p, &[1, 2]), (c, &[3])]);
        let mapper = FixtureMapper::new(&[(1, "P1"), (2, "P2"), (3, "C")]);
        let resolver = FixtureResolver::new(&["P1"]);

        let taxonomy = TaxonomyInferrer::new(&classifier, &mapper, &resolver)
            .infer()
            .unwrap();

        let c_parents: BTreeSet<ConceptId> = ["P1".to_string(), "P2".to_string()].into();
        assert_eq!(taxonomy.parents("C"), Some(&c_parents));
    }

    #[test]
    fn test_classifier_failure_is_fatal() {
        let b = NodeId(2);
        let mut classifier =
            FixtureClassifier::new(&[(TOP, b)], &[(b, &[1])]);
        classifier.fail_subclasses_of = Some(b);
        let mapper = FixtureMapper::new(&[(1, "B")]);
        let resolver = FixtureResolver::new(&[]);

        let result = TaxonomyInferrer::new(&classifier, &mapper, &resolver).infer();
        assert!(matches!(result, Err(ExtractionError::Classifier(_))));
    }

    #[test]
    fn test_every_concept_appears_once_in_iteration_order() {
        let a = NodeId(2);
        let b = NodeId(3);
        let c = NodeId(4);
        let classifier = FixtureClassifier::new(
            &[(TOP, a), (TOP, b), (a, c), (b, c), (c, BOTTOM)],
            &[(a, &[1]), (b, &[2]), (c, &[3]), (BOTTOM, &[9])],
        );
        let mapper = FixtureMapper::new(&[(1, "A"), (2, "B"), (3, "C"), (9, "U")]);
        let resolver = FixtureResolver::new(&[]);

        let taxonomy = TaxonomyInferrer::new(&classifier, &mapper, &resolver)
            .infer()
            .unwrap();

        let mut seen = HashSet::new();
        for id in taxonomy.ordered_concept_ids() {
            assert!(seen.insert(id.clone()), "{id} appears twice");
        }
        assert_eq!(seen.len(), taxonomy.concept_count());
    }
}
