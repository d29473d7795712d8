use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OfferError {
    #[error("Failed to read offer catalog {path}: {source}")]
    Catalog {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid offer service configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, OfferError>;
