//! # Remote Job Interface
//!
//! The classification core does not own a job store: it submits requests to
//! an external job system and observes their progress over the notification
//! bus. This module defines the narrow [`JobSystem`] interface the
//! orchestrator consumes, the job record/state model, and an in-memory
//! implementation used when embedding the core standalone and throughout
//! the test suite.

pub mod job_system;
pub mod memory;

pub use job_system::{JobRecord, JobState, JobSystem, JobSystemError};
pub use memory::InMemoryJobSystem;
