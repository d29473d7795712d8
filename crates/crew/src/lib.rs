pub mod config;
pub mod engine;
pub mod error;
pub mod feed;
pub mod state;
pub mod state_machine;

pub use config::CrewConfig;
pub use engine::PhaseEngine;
pub use error::{CrewError, Result};
pub use feed::{BusSeverityFeed, SeverityFeed, SeverityStream, SseSeverityFeed};
pub use state::PhaseState;
pub use state_machine::PhaseStateMachine;
