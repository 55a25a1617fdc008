use crate::state_machine::states::ReasonerState;
use thiserror::Error;

/// Errors raised by the session state machine.
///
/// An invalid transition is a programming error in the orchestration layer,
/// not a recoverable runtime condition: callers are expected to fail loudly
/// rather than retry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateMachineError {
    #[error("invalid transition: cannot {event} while {from}")]
    InvalidTransition { from: ReasonerState, event: String },
}

impl StateMachineError {
    pub fn invalid_transition(from: ReasonerState, event: impl Into<String>) -> Self {
        Self::InvalidTransition {
            from,
            event: event.into(),
        }
    }
}

pub type StateMachineResult<T> = Result<T, StateMachineError>;
