//! Human-readable mission report.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use heist_core::{PhaseKind, Role, Settlement};
use tracing::info;

use crate::error::Result;
use crate::mission::{CutResponses, MissionOutcome};

pub const REPORT_FILE_NAME: &str = "mission-report.txt";

const MISSION_NAME: &str = "Bank Heist # 7128";
const HEAVY_RULE: &str = "= = = = = = = = = = = = = = = = = = = = = = = = = = = = = = = = = = = = = = = = = = = = = = = = = = = = = = = = =";
const LIGHT_RULE: &str = "- - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - -";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissionReport {
    Success {
        hit_role: Role,
        settlement: Settlement,
        responses: CutResponses,
    },
    Failure {
        phase: PhaseKind,
        role: Role,
        cause: String,
        loot: u64,
        extra_loot: u64,
    },
}

impl From<&MissionOutcome> for MissionReport {
    fn from(outcome: &MissionOutcome) -> Self {
        match outcome {
            MissionOutcome::Completed {
                hit_role,
                settlement,
                responses,
                ..
            } => Self::Success {
                hit_role: *hit_role,
                settlement: *settlement,
                responses: responses.clone(),
            },
            MissionOutcome::Failed {
                phase,
                role,
                cause,
                loot,
                extra_loot,
                ..
            } => Self::Failure {
                phase: *phase,
                role: *role,
                cause: cause.clone(),
                loot: *loot,
                extra_loot: *extra_loot,
            },
        }
    }
}

impl MissionReport {
    pub fn render(&self) -> String {
        let mut out = String::new();
        line(&mut out, HEAVY_RULE);
        line(&mut out, "== FINAL MISSION REPORT ==");
        line(&mut out, HEAVY_RULE);
        line(&mut out, &format!("Mission : {}", MISSION_NAME));

        match self {
            Self::Success {
                hit_role,
                settlement,
                responses,
            } => {
                let ability = hit_role.ability();
                line(&mut out, "Overall Result : MISSION ACCOMPLISHED !");
                line(&mut out, "--- LOOT SPLIT ---");
                line(&mut out, &format!("Base Loot : {}", money(settlement.loot)));
                line(
                    &mut out,
                    &format!("Extra Loot ( {} ): {}", ability, money(settlement.extra_loot)),
                );
                line(&mut out, &format!("Total Loot : {}", money(settlement.total())));
                line(&mut out, LIGHT_RULE);
                for role in [Role::Franklin, Role::Trevor] {
                    line(
                        &mut out,
                        &format!("Payment to {} : {}", role, money(settlement.share_of(role))),
                    );
                    line(
                        &mut out,
                        &format!("{}'s Response : \"{}\"", role, responses.of(role).message),
                    );
                }
                line(
                    &mut out,
                    &format!(
                        "Payment to Lester : {} ( split ) + {} ( remainder )",
                        money(settlement.share),
                        money(settlement.remainder)
                    ),
                );
                line(
                    &mut out,
                    &format!("Lester's Response : \"{}\"", responses.lester.message),
                );
                line(
                    &mut out,
                    &format!("Michael's Cut : {}", money(settlement.michael_share)),
                );
                line(&mut out, LIGHT_RULE);
                line(
                    &mut out,
                    &format!("Final Balance : {}", money(settlement.paid_out())),
                );
            }
            Self::Failure {
                phase,
                role,
                cause,
                loot,
                extra_loot,
            } => {
                line(&mut out, "Overall Result : TOTAL FAILURE !");
                line(&mut out, "--- LOSSES ---");
                line(&mut out, &format!("Phase : \"{}\"", phase.title()));
                line(&mut out, &format!("Responsible : {}", role));
                line(&mut out, &format!("Cause : {}", cause));
                line(&mut out, &format!("Lost Loot : {}", money(*loot)));
                line(
                    &mut out,
                    &format!("Lost Extra Loot ( {} ): {}", role.ability(), money(*extra_loot)),
                );
                line(
                    &mut out,
                    &format!("Total Lost Loot : {}", money(loot + extra_loot)),
                );
            }
        }

        line(&mut out, HEAVY_RULE);
        out
    }
}

fn line(out: &mut String, text: &str) {
    let _ = writeln!(out, "{}", text);
}

/// Dollar amount with thousands separators, e.g. `$1,500,000`.
pub fn money(amount: u64) -> String {
    let digits = amount.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    grouped.push('$');
    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

/// Destination for the finished report.
#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn write(&self, report: &MissionReport) -> Result<()>;
}

pub struct FileReportWriter {
    path: PathBuf,
}

impl FileReportWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Write `mission-report.txt` inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(REPORT_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ReportSink for FileReportWriter {
    async fn write(&self, report: &MissionReport) -> Result<()> {
        tokio::fs::write(&self.path, report.render()).await?;
        info!(path = %self.path.display(), "Mission report written");
        Ok(())
    }
}
