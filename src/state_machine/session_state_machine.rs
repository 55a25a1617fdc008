use super::{
    errors::{StateMachineError, StateMachineResult},
    states::ReasonerState,
};
use parking_lot::Mutex;
use tracing::debug;

/// Internally synchronized lifecycle state machine for one classifier
/// session.
///
/// A single mutex-guarded field holds the current state; every mutating call
/// takes the lock, so concurrent callers observe a consistent lifecycle
/// without external serialization.
#[derive(Debug)]
pub struct SessionStateMachine {
    state: Mutex<ReasonerState>,
}

impl SessionStateMachine {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ReasonerState::default()),
        }
    }

    pub fn current_state(&self) -> ReasonerState {
        *self.state.lock()
    }

    /// Start a classification run.
    ///
    /// Precondition: no classification is already running on this session.
    pub fn begin_classification(&self) -> StateMachineResult<ReasonerState> {
        let mut state = self.state.lock();
        if !state.can_begin_classification() {
            return Err(StateMachineError::invalid_transition(
                *state,
                "begin_classification",
            ));
        }
        *state = ReasonerState::Classifying;
        debug!(state = %*state, "session began classification");
        Ok(*state)
    }

    /// Complete the running classification, leaving the session synchronized
    /// with the ontology it just classified.
    pub fn end_classification(&self) -> StateMachineResult<ReasonerState> {
        let mut state = self.state.lock();
        if *state != ReasonerState::Classifying {
            return Err(StateMachineError::invalid_transition(
                *state,
                "end_classification",
            ));
        }
        *state = ReasonerState::Synchronized;
        debug!(state = %*state, "session ended classification");
        Ok(*state)
    }

    /// Record that external edits invalidated the session's last result.
    ///
    /// Synchronized sessions drop back to idle; every other state is left
    /// untouched. Must not be called mid-classification.
    pub fn set_stale(&self) -> StateMachineResult<ReasonerState> {
        let mut state = self.state.lock();
        if *state == ReasonerState::Classifying {
            return Err(StateMachineError::invalid_transition(*state, "set_stale"));
        }
        if *state == ReasonerState::Synchronized {
            *state = ReasonerState::Idle;
            debug!(state = %*state, "session result marked stale");
        }
        Ok(*state)
    }

    /// Mark the session failed, from any state.
    pub fn fail(&self) -> ReasonerState {
        let mut state = self.state.lock();
        *state = ReasonerState::Failed;
        *state
    }

    /// Tear the session down, from any state. Terminal.
    pub fn unload(&self) -> ReasonerState {
        let mut state = self.state.lock();
        *state = ReasonerState::Unloaded;
        *state
    }
}

impl Default for SessionStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_lifecycle() {
        let machine = SessionStateMachine::new();
        assert_eq!(machine.current_state(), ReasonerState::Idle);

        machine.begin_classification().unwrap();
        assert_eq!(machine.current_state(), ReasonerState::Classifying);

        machine.end_classification().unwrap();
        assert_eq!(machine.current_state(), ReasonerState::Synchronized);

        machine.set_stale().unwrap();
        assert_eq!(machine.current_state(), ReasonerState::Idle);
    }

    #[test]
    fn test_double_begin_is_a_precondition_fault() {
        let machine = SessionStateMachine::new();
        machine.begin_classification().unwrap();

        let err = machine.begin_classification().unwrap_err();
        assert_eq!(
            err,
            StateMachineError::invalid_transition(ReasonerState::Classifying, "begin_classification")
        );
        // The running classification is unaffected
        assert_eq!(machine.current_state(), ReasonerState::Classifying);
    }

    #[test]
    fn test_end_requires_running_classification() {
        let machine = SessionStateMachine::new();
        assert!(machine.end_classification().is_err());
    }

    #[test]
    fn test_set_stale_outside_synchronized_is_a_no_op() {
        let machine = SessionStateMachine::new();
        assert_eq!(machine.set_stale().unwrap(), ReasonerState::Idle);

        machine.fail();
        assert_eq!(machine.set_stale().unwrap(), ReasonerState::Failed);
    }

    #[test]
    fn test_set_stale_mid_classification_is_rejected() {
        let machine = SessionStateMachine::new();
        machine.begin_classification().unwrap();
        assert!(machine.set_stale().is_err());
    }

    #[test]
    fn test_fail_and_unload_are_unconditional() {
        let machine = SessionStateMachine::new();
        machine.begin_classification().unwrap();
        assert_eq!(machine.fail(), ReasonerState::Failed);
        assert_eq!(machine.unload(), ReasonerState::Unloaded);

        // Unloaded sessions may still be failed over, nothing guards it
        assert_eq!(machine.fail(), ReasonerState::Failed);
    }

    #[test]
    fn test_restart_after_stale() {
        let machine = SessionStateMachine::new();
        machine.begin_classification().unwrap();
        machine.end_classification().unwrap();
        machine.set_stale().unwrap();

        machine.begin_classification().unwrap();
        assert_eq!(machine.current_state(), ReasonerState::Classifying);
    }
}
