// Admission control for classification jobs.
//
// The external job scheduler consults a [`SchedulingRule`] before starting a
// job: a job whose rule conflicts with any currently running job's rule is
// held back. Rules bound global concurrency through a fixed number of slots
// and serialize jobs targeting the same branch.

pub mod rule;

pub use rule::{AdmissionController, SchedulingRule, SlotSequence, TargetKey};
