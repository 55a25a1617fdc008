//! # Classifier Abstractions
//!
//! The ontology classifier itself is an external capability: this module
//! defines the narrow interfaces the core consumes ([`OntologyClassifier`],
//! [`ConceptMapper`], [`ConceptResolver`]), the pooled session object that
//! wraps one live classifier instance, and the factory registry that maps
//! classifier implementation ids to constructors.

pub mod interfaces;
pub mod registry;
pub mod session;

pub use interfaces::{
    ClassHandle, ClassifierError, ConceptId, ConceptMapper, ConceptResolver, NodeId,
    OntologyClassifier,
};
pub use registry::{ClassifierConstructor, ClassifierRegistry, RegistryError};
pub use session::{ReasonerSession, ReasonerSessionFactory};
