//! # Classifier Registry
//!
//! Maps classifier implementation ids to constructor functions, supplied at
//! startup and resolved by lookup when a session is created. An explicit
//! strategy registry: no dynamic class loading, no reflection.

use crate::classifier::interfaces::{ClassifierError, OntologyClassifier};
use crate::orchestration::request::ClassificationRequest;
use parking_lot::RwLock;
use std::collections::HashMap;
use thiserror::Error;
use tracing::info;

/// Constructor for one classifier implementation. Receives the full request
/// so implementations can overlay the ad-hoc concept definitions onto the
/// persisted ontology before classification starts.
pub type ClassifierConstructor = Box<
    dyn Fn(&ClassificationRequest) -> Result<Box<dyn OntologyClassifier>, ClassifierError>
        + Send
        + Sync,
>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("no classifier registered under id '{id}'")]
    UnknownClassifier { id: String },
}

/// Thread-safe registry of classifier constructors.
pub struct ClassifierRegistry {
    factories: RwLock<HashMap<String, ClassifierConstructor>>,
}

impl ClassifierRegistry {
    pub fn new() -> Self {
        Self {
            factories: RwLock::new(HashMap::new()),
        }
    }

    /// Register a constructor under `id`, replacing any previous entry.
    pub fn register(&self, id: impl Into<String>, constructor: ClassifierConstructor) {
        let id = id.into();
        info!(classifier_id = %id, "Registered classifier factory");
        self.factories.write().insert(id, constructor);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.factories.read().contains_key(id)
    }

    pub fn registered_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.factories.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Construct a classifier instance for `request` using the
    /// implementation registered under `id`.
    pub fn create(
        &self,
        id: &str,
        request: &ClassificationRequest,
    ) -> Result<Box<dyn OntologyClassifier>, ClassifierError> {
        let factories = self.factories.read();
        let constructor = factories
            .get(id)
            .ok_or_else(|| ClassifierError::construction(format!("unknown classifier id '{id}'")))?;
        constructor(request)
    }

    /// Like [`Self::create`] but reports the missing id as a typed registry
    /// error, for callers that can fall back to another implementation.
    pub fn lookup(&self, id: &str) -> Result<(), RegistryError> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(RegistryError::UnknownClassifier { id: id.to_string() })
        }
    }
}

impl Default for ClassifierRegistry {
    fn default() -> Self {
        Self::new()
    }
}
