//! # Classification Orchestration
//!
//! Coordinates one classification run end to end: assemble the immutable
//! request, submit it to the external job system under an admission rule,
//! await the terminal notification, and hand the extracted taxonomy back to
//! the caller.
//!
//! ## Core Components
//!
//! - **ClassificationRunner**: blocking facade over the asynchronous
//!   submit/notify/fetch protocol; the only externally cancellable
//!   long-running operation in the core
//! - **ClassificationJob**: the unit of work executed inside an admitted
//!   job: lease a session, drive its state machine around the taxonomy
//!   walk, register the result
//! - **ResultRegistry**: bounded in-memory retention of classification
//!   outcomes, keyed by run id
//! - **ClassificationRequest**: immutable value describing one run,
//!   assembled builder-style

pub mod classification_job;
pub mod classification_runner;
pub mod errors;
pub mod request;
pub mod result_registry;

pub use classification_job::ClassificationJob;
pub use classification_runner::{
    CancellationToken, ClassificationRunner, ClassifyParams, RegistryResultProcessor,
    ResultProcessor,
};
pub use errors::{ClassificationError, OrchestrationResult};
pub use request::{ClassificationRequest, ClassificationRequestBuilder, ConceptDefinition};
pub use result_registry::{ClassificationOutcome, ResultRegistry};
