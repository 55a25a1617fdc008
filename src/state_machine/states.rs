use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle states of one classifier session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonerState {
    /// Session has been torn down; terminal for this instance
    Unloaded,
    /// Session is live but holds no up-to-date classification result
    Idle,
    /// Last classification completed and still reflects the ontology
    Synchronized,
    /// A classification is currently running on this session
    Classifying,
    /// Session hit an unrecoverable error
    Failed,
}

impl ReasonerState {
    /// Check if a classification may start from this state
    pub fn can_begin_classification(&self) -> bool {
        !matches!(self, Self::Classifying)
    }

    /// Check if this session holds a servable classification result
    pub fn is_synchronized(&self) -> bool {
        matches!(self, Self::Synchronized)
    }

    /// Check if this is a terminal state for the session instance
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Unloaded)
    }
}

impl fmt::Display for ReasonerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unloaded => write!(f, "unloaded"),
            Self::Idle => write!(f, "idle"),
            Self::Synchronized => write!(f, "synchronized"),
            Self::Classifying => write!(f, "classifying"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for ReasonerState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unloaded" => Ok(Self::Unloaded),
            "idle" => Ok(Self::Idle),
            "synchronized" => Ok(Self::Synchronized),
            "classifying" => Ok(Self::Classifying),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Invalid reasoner state: {s}")),
        }
    }
}

/// Fresh sessions start out idle, awaiting their first classification
impl Default for ReasonerState {
    fn default() -> Self {
        Self::Idle
    }
}
