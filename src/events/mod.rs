// Notification bus for job lifecycle events.
//
// A broadcast channel carries "job changed" events from the job system to
// any number of observers; the orchestrator opens a one-shot, filtered
// subscription per run.

pub mod publisher;

pub use publisher::{JobChangedEvent, NotificationPublisher};
