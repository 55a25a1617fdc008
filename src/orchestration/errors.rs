use crate::jobs::JobSystemError;
use crate::pool::PoolError;
use crate::state_machine::StateMachineError;
use crate::taxonomy::ExtractionError;
use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced by the classification orchestrator.
///
/// Callers observe exactly one of these per run; partial taxonomies are
/// never returned. The three terminal-job outcomes are distinct variants so
/// callers can tell a remote failure from a remote cancellation from their
/// own cancellation.
#[derive(Error, Debug)]
pub enum ClassificationError {
    /// The caller's cancellation token fired before the run completed.
    #[error("classification was cancelled by the caller")]
    Cancelled,

    /// The remote job was cancelled before it finished.
    #[error("classification job was cancelled")]
    RemoteCancelled,

    /// The remote job terminated with an error.
    #[error("classification job failed: {message}")]
    RemoteFailed { message: String },

    /// The job system reported a state the protocol does not allow here.
    #[error("unexpected job system state: {message}")]
    IllegalState { message: String },

    #[error("classification results are not available for run {run_id}")]
    ResultsUnavailable { run_id: Uuid },

    #[error("invalid classification request: {message}")]
    InvalidRequest { message: String },

    #[error(transparent)]
    JobSystem(#[from] JobSystemError),

    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error(transparent)]
    StateMachine(#[from] StateMachineError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

impl ClassificationError {
    pub fn remote_failed(message: impl Into<String>) -> Self {
        Self::RemoteFailed {
            message: message.into(),
        }
    }

    pub fn illegal_state(message: impl Into<String>) -> Self {
        Self::IllegalState {
            message: message.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// True for both caller-initiated and remote cancellation.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled | Self::RemoteCancelled)
    }
}

pub type OrchestrationResult<T> = Result<T, ClassificationError>;
