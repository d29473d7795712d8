//! Michael's side of the heist: negotiate an offer, run both phases through
//! the crew, settle the loot and write the report.

pub mod client;
pub mod desk;
pub mod error;
pub mod mission;
pub mod report;
pub mod retry;

pub use client::{CrewClient, LesterClient};
pub use desk::{OfferDesk, Operator};
pub use error::{OrchestratorError, Result};
pub use mission::{CutResponses, Mission, MissionConfig, MissionOutcome};
pub use report::{FileReportWriter, MissionReport, ReportSink, REPORT_FILE_NAME};
pub use retry::{with_retry, RetryPolicy};
