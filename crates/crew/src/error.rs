use heist_core::PhaseKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CrewError {
    #[error("Phase busy: cannot start {requested:?} while a phase is in progress")]
    PhaseBusy { requested: PhaseKind },

    #[error("Invalid phase transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Invalid crew configuration: {0}")]
    InvalidConfig(String),

    #[error("Phase engine stopped")]
    EngineStopped,

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Star feed error: {0}")]
    Feed(String),
}

pub type Result<T> = std::result::Result<T, CrewError>;
