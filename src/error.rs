use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum ClassificationCoreError {
    PoolError(String),
    StateTransitionError(String),
    OrchestrationError(String),
    ExtractionError(String),
    RegistryError(String),
    JobSystemError(String),
    ConfigurationError(String),
}

impl fmt::Display for ClassificationCoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassificationCoreError::PoolError(msg) => write!(f, "Pool error: {msg}"),
            ClassificationCoreError::StateTransitionError(msg) => {
                write!(f, "State transition error: {msg}")
            }
            ClassificationCoreError::OrchestrationError(msg) => {
                write!(f, "Orchestration error: {msg}")
            }
            ClassificationCoreError::ExtractionError(msg) => write!(f, "Extraction error: {msg}"),
            ClassificationCoreError::RegistryError(msg) => write!(f, "Registry error: {msg}"),
            ClassificationCoreError::JobSystemError(msg) => write!(f, "Job system error: {msg}"),
            ClassificationCoreError::ConfigurationError(msg) => {
                write!(f, "Configuration error: {msg}")
            }
        }
    }
}

impl std::error::Error for ClassificationCoreError {}

impl From<crate::pool::PoolError> for ClassificationCoreError {
    fn from(err: crate::pool::PoolError) -> Self {
        ClassificationCoreError::PoolError(err.to_string())
    }
}

impl From<crate::state_machine::StateMachineError> for ClassificationCoreError {
    fn from(err: crate::state_machine::StateMachineError) -> Self {
        ClassificationCoreError::StateTransitionError(err.to_string())
    }
}

impl From<crate::orchestration::ClassificationError> for ClassificationCoreError {
    fn from(err: crate::orchestration::ClassificationError) -> Self {
        ClassificationCoreError::OrchestrationError(err.to_string())
    }
}

impl From<crate::taxonomy::ExtractionError> for ClassificationCoreError {
    fn from(err: crate::taxonomy::ExtractionError) -> Self {
        ClassificationCoreError::ExtractionError(err.to_string())
    }
}

impl From<crate::jobs::JobSystemError> for ClassificationCoreError {
    fn from(err: crate::jobs::JobSystemError) -> Self {
        ClassificationCoreError::JobSystemError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ClassificationCoreError>;
