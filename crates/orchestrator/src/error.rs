use std::time::Duration;

use heist_core::{PhaseKind, Role};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("{role} is busy and cannot start the {} phase", .phase.as_str())]
    PhaseBusy { role: Role, phase: PhaseKind },

    #[error("{role} did not finish the {} phase within {timeout:?}", .phase.as_str())]
    PhaseTimeout {
        role: Role,
        phase: PhaseKind,
        timeout: Duration,
    },

    #[error("Mission cancelled")]
    Cancelled,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("HTTP request failed: {0}")]
    Request(reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl OrchestratorError {
    /// Whether the call may succeed if simply tried again.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

impl From<reqwest::Error> for OrchestratorError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            Self::Unavailable(err.to_string())
        } else {
            Self::Request(err)
        }
    }
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;
