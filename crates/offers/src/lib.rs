pub mod catalog;
pub mod config;
pub mod error;
pub mod service;

pub use catalog::Catalog;
pub use config::{OfferRanges, OfferServiceConfig};
pub use error::{OfferError, Result};
pub use service::OfferService;
