use crate::orchestration::request::ClassificationRequest;
use crate::scheduling::SchedulingRule;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Lifecycle state of a remote classification job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Accepted, waiting for the scheduler to admit it
    Scheduled,
    /// Currently executing
    Running,
    /// Cancellation asked for but not yet honored
    CancelRequested,
    /// Completed successfully; results are available
    Finished,
    /// Terminated before completion
    Cancelled,
    /// Terminated by an error
    Failed,
}

impl JobState {
    /// Check if the job reached a terminal ("done") state. A pending
    /// cancellation request is not terminal: the job is still winding down.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Cancelled | Self::Failed)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scheduled => write!(f, "scheduled"),
            Self::Running => write!(f, "running"),
            Self::CancelRequested => write!(f, "cancel_requested"),
            Self::Finished => write!(f, "finished"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Authoritative record of one submitted job, fetched after a terminal
/// notification arrives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: Uuid,
    pub state: JobState,
    pub user_id: String,
    pub description: String,
    pub submitted_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl JobRecord {
    pub fn scheduled(request: &ClassificationRequest) -> Self {
        Self {
            id: request.run_id(),
            state: JobState::Scheduled,
            user_id: request.user_id().to_string(),
            description: format!("Classifying the ontology on {}", request.target()),
            submitted_at: Utc::now(),
            finished_at: None,
            error: None,
        }
    }
}

#[derive(Error, Debug, Clone)]
pub enum JobSystemError {
    #[error("job {run_id} was not found")]
    NotFound { run_id: Uuid },

    #[error("job system backend error: {message}")]
    Backend { message: String },
}

impl JobSystemError {
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }
}

/// External job system consumed by the orchestrator.
///
/// The system is expected to apply the submitted [`SchedulingRule`] before
/// starting a job: a job whose rule conflicts with any running job's rule
/// must not start until the conflict clears.
#[async_trait]
pub trait JobSystem: Send + Sync {
    /// Submit a classification job. Returns once the job is accepted, not
    /// once it runs.
    async fn submit(
        &self,
        request: &ClassificationRequest,
        rule: SchedulingRule,
    ) -> Result<(), JobSystemError>;

    /// Fetch the authoritative record for `run_id`.
    async fn fetch(&self, run_id: Uuid) -> Result<JobRecord, JobSystemError>;

    /// Delete the record for `run_id`. Invoked exactly once per observed
    /// terminal state, as unconditional cleanup.
    async fn delete(&self, run_id: Uuid) -> Result<(), JobSystemError>;
}
