use crate::classifier::ConceptId;
use crate::orchestration::errors::{ClassificationError, OrchestrationResult};
use crate::scheduling::TargetKey;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An ad-hoc concept definition overlaid on the persisted ontology for the
/// duration of one classification run. Used to preview the taxonomy impact
/// of edits before they are committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptDefinition {
    pub concept_id: ConceptId,
    pub stated_parents: Vec<ConceptId>,
    /// Serialized axiom payload in whatever form the selected classifier
    /// implementation understands.
    pub definition: serde_json::Value,
}

impl ConceptDefinition {
    pub fn new(concept_id: impl Into<ConceptId>, stated_parents: Vec<ConceptId>) -> Self {
        Self {
            concept_id: concept_id.into(),
            stated_parents,
            definition: serde_json::Value::Null,
        }
    }
}

/// Immutable description of one classification run.
///
/// Assembled through [`ClassificationRequestBuilder`] and never mutated
/// after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationRequest {
    run_id: Uuid,
    user_id: String,
    target: TargetKey,
    additional_concepts: Vec<ConceptDefinition>,
    parent_lock_context: String,
    classifier_id: Option<String>,
}

impl ClassificationRequest {
    pub fn builder() -> ClassificationRequestBuilder {
        ClassificationRequestBuilder::default()
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn target(&self) -> &TargetKey {
        &self.target
    }

    pub fn additional_concepts(&self) -> &[ConceptDefinition] {
        &self.additional_concepts
    }

    pub fn parent_lock_context(&self) -> &str {
        &self.parent_lock_context
    }

    /// The requested classifier implementation; `None` defers to the
    /// configured default.
    pub fn classifier_id(&self) -> Option<&str> {
        self.classifier_id.as_deref()
    }
}

/// Builder-style assembly for [`ClassificationRequest`].
#[derive(Debug, Default)]
pub struct ClassificationRequestBuilder {
    run_id: Option<Uuid>,
    user_id: Option<String>,
    target: Option<TargetKey>,
    additional_concepts: Vec<ConceptDefinition>,
    parent_lock_context: Option<String>,
    classifier_id: Option<String>,
}

impl ClassificationRequestBuilder {
    /// Run identifier; freshly generated when not supplied.
    pub fn run_id(mut self, run_id: Uuid) -> Self {
        self.run_id = Some(run_id);
        self
    }

    pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn target(mut self, target: TargetKey) -> Self {
        self.target = Some(target);
        self
    }

    pub fn additional_concepts(mut self, concepts: Vec<ConceptDefinition>) -> Self {
        self.additional_concepts = concepts;
        self
    }

    pub fn add_concept(mut self, concept: ConceptDefinition) -> Self {
        self.additional_concepts.push(concept);
        self
    }

    /// Description of the lock/parent context the run executes under.
    pub fn parent_lock_context(mut self, context: impl Into<String>) -> Self {
        self.parent_lock_context = Some(context.into());
        self
    }

    pub fn classifier_id(mut self, id: impl Into<String>) -> Self {
        self.classifier_id = Some(id.into());
        self
    }

    pub fn maybe_classifier_id(mut self, id: Option<String>) -> Self {
        self.classifier_id = id;
        self
    }

    pub fn build(self) -> OrchestrationResult<ClassificationRequest> {
        let user_id = self
            .user_id
            .ok_or_else(|| ClassificationError::invalid_request("user_id is required"))?;
        let target = self
            .target
            .ok_or_else(|| ClassificationError::invalid_request("target is required"))?;

        Ok(ClassificationRequest {
            run_id: self.run_id.unwrap_or_else(Uuid::new_v4),
            user_id,
            target,
            additional_concepts: self.additional_concepts,
            parent_lock_context: self
                .parent_lock_context
                .unwrap_or_else(|| "classification".to_string()),
            classifier_id: self.classifier_id,
        })
    }
}
