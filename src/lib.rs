#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Classification Core
//!
//! High-performance Rust core for terminology classification orchestration.
//!
//! ## Overview
//!
//! The classification core runs an external ontology classifier against a
//! large concept hierarchy, bounds how many of these expensive, stateful
//! classification sessions may run at once, and converts the classifier's
//! raw output into a normalized taxonomy (parent edges, equivalence groups,
//! unsatisfiable concepts) ready for downstream review and persistence.
//!
//! ## Architecture
//!
//! Control flows caller → orchestrator → external job system → job body:
//!
//! - The [`orchestration::ClassificationRunner`] submits a classification
//!   request and blocks until a terminal notification arrives
//! - The external scheduler admits the job under a
//!   [`scheduling::SchedulingRule`] bounding global and per-target
//!   concurrency
//! - Inside the admitted job, [`orchestration::ClassificationJob`] leases a
//!   reasoner session from the bounded [`pool::ServicePool`] and walks the
//!   classified hierarchy with [`taxonomy::TaxonomyInferrer`]
//! - Job completion is signaled over the [`events`] notification bus; the
//!   runner fetches and cleans up the job record and returns the result
//!
//! ## Module Organization
//!
//! - [`scheduling`] - Admission control (scheduling rules, slot sequence)
//! - [`pool`] - Bounded classifier session pool with shared reuse and idle
//!   eviction
//! - [`state_machine`] - Per-session lifecycle state machine
//! - [`classifier`] - Abstract classifier interfaces and factory registry
//! - [`taxonomy`] - Taxonomy extraction algorithm and result types
//! - [`jobs`] - External job system interface plus in-memory backend
//! - [`events`] - Job-change notification bus
//! - [`orchestration`] - Request assembly, job orchestration, result
//!   retention
//! - [`config`] - Configuration management
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use classification_core::config::ClassificationConfig;
//! use classification_core::scheduling::{AdmissionController, SlotSequence, TargetKey};
//!
//! let config = ClassificationConfig::default();
//! let admission = AdmissionController::new(
//!     config.max_concurrent_classifications,
//!     SlotSequence::new(),
//! );
//!
//! let rule_a = admission.create_rule(&TargetKey::new("snomed", "MAIN"));
//! let rule_b = admission.create_rule(&TargetKey::new("snomed", "MAIN/project"));
//! assert!(!rule_a.conflicts_with(&rule_b));
//! ```
//!
//! ## Concurrency Model
//!
//! At most `maximum_service_count` classifier sessions are live at any
//! instant; `take_lease` blocks with eviction-assisted retry rather than
//! failing on exhaustion. No two classifications run concurrently against
//! the same target branch, and a process-wide slot sequence caps the global
//! job count. The taxonomy walk itself is single-threaded per run and owns
//! its session exclusively for the run's duration.

pub mod classifier;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod jobs;
pub mod logging;
pub mod orchestration;
pub mod pool;
pub mod scheduling;
pub mod state_machine;
pub mod taxonomy;

pub use config::ClassificationConfig;
pub use error::{ClassificationCoreError, Result};
pub use events::{JobChangedEvent, NotificationPublisher};
pub use jobs::{InMemoryJobSystem, JobRecord, JobState, JobSystem};
pub use orchestration::{
    CancellationToken, ClassificationError, ClassificationJob, ClassificationOutcome,
    ClassificationRequest, ClassificationRunner, ClassifyParams, RegistryResultProcessor,
    ResultProcessor, ResultRegistry,
};
pub use pool::{ServiceFactory, ServiceLease, ServicePool};
pub use scheduling::{AdmissionController, SchedulingRule, SlotSequence, TargetKey};
pub use state_machine::{ReasonerState, SessionStateMachine};
pub use taxonomy::{EquivalenceSet, IterationEntry, Taxonomy, TaxonomyInferrer};
