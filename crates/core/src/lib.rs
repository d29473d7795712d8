//! Shared domain types for the heist crew services.
//!
//! Everything that crosses a service boundary lives here: offers, phase
//! snapshots, loot details, settlement arithmetic and the crew roles.

pub mod domain;
pub mod error;

pub use domain::*;
pub use error::{CoreError, Result};
