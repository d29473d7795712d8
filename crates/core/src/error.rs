use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Offer is missing fields: {}", missing.join(", "))]
    IncompleteOffer { missing: Vec<&'static str> },

    #[error("Unknown crew role: {0}")]
    UnknownRole(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
