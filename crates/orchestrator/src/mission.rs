//! The fixed mission sequence: negotiate, distraction, hit, settlement.

use std::sync::Arc;
use std::time::Duration;

use heist_core::{
    Ack, CompleteOffer, CutDetails, PhaseKind, PhaseSnapshot, PhaseStatus, Role, Settlement,
};
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::desk::{OfferDesk, Operator};
use crate::error::{OrchestratorError, Result};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_PHASE_TIMEOUT: Duration = Duration::from_secs(120);

/// Cause recorded when the hit ends because of the stars.
pub const HIT_FAILURE_CAUSE: &str = "The star limit was reached";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissionConfig {
    /// Pause between two status polls
    pub poll_interval: Duration,
    /// Longest a single phase may run before the mission gives up on it
    pub phase_timeout: Duration,
}

impl Default for MissionConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            phase_timeout: DEFAULT_PHASE_TIMEOUT,
        }
    }
}

/// Replies gathered while paying everyone out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CutResponses {
    pub trevor: Ack,
    pub franklin: Ack,
    pub lester: Ack,
}

impl CutResponses {
    pub fn of(&self, role: Role) -> &Ack {
        match role {
            Role::Trevor => &self.trevor,
            Role::Franklin => &self.franklin,
        }
    }

    pub fn all_confirmed(&self) -> bool {
        self.trevor.ok && self.franklin.ok && self.lester.ok
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissionOutcome {
    Completed {
        offer: CompleteOffer,
        hit_role: Role,
        settlement: Settlement,
        responses: CutResponses,
    },
    Failed {
        offer: CompleteOffer,
        phase: PhaseKind,
        role: Role,
        cause: String,
        loot: u64,
        extra_loot: u64,
    },
}

impl MissionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

pub struct Mission {
    desk: Arc<dyn OfferDesk>,
    trevor: Arc<dyn Operator>,
    franklin: Arc<dyn Operator>,
    config: MissionConfig,
    cancel: CancellationToken,
}

impl Mission {
    pub fn new(
        desk: Arc<dyn OfferDesk>,
        trevor: Arc<dyn Operator>,
        franklin: Arc<dyn Operator>,
    ) -> Self {
        Self {
            desk,
            trevor,
            franklin,
            config: MissionConfig::default(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_config(mut self, config: MissionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub async fn run(&self) -> Result<MissionOutcome> {
        info!("Phase 1: negotiating an offer with Lester");
        let offer = self.negotiate().await?;
        info!(
            loot = offer.loot,
            police_risk = offer.police_risk,
            trevor_success = offer.trevor_success,
            franklin_success = offer.franklin_success,
            "Offer accepted"
        );

        let distraction_role = offer.distraction_role();
        info!(role = %distraction_role, "Phase 2: running the distraction");
        let snapshot = self.run_distraction(&offer, distraction_role).await?;
        if snapshot.status != PhaseStatus::Success {
            warn!(role = %distraction_role, message = %snapshot.message, "Distraction failed");
            return Ok(MissionOutcome::Failed {
                offer,
                phase: PhaseKind::Distraction,
                role: distraction_role,
                cause: distraction_role.distraction_failure_cause().to_string(),
                loot: offer.loot,
                extra_loot: 0,
            });
        }

        let hit_role = offer.hit_role();
        info!(role = %hit_role, "Phase 3: running the hit");
        let snapshot = self.run_hit(&offer, hit_role).await?;
        if snapshot.status != PhaseStatus::Success {
            warn!(role = %hit_role, message = %snapshot.message, "Hit failed");
            return Ok(MissionOutcome::Failed {
                offer,
                phase: PhaseKind::Hit,
                role: hit_role,
                cause: HIT_FAILURE_CAUSE.to_string(),
                loot: offer.loot,
                extra_loot: snapshot.extra_loot,
            });
        }
        info!(
            total_loot = snapshot.total_loot,
            extra_loot = snapshot.extra_loot,
            "Hit completed"
        );

        info!("Phase 4: splitting the loot");
        let (settlement, responses) = self.settle(hit_role).await?;

        Ok(MissionOutcome::Completed {
            offer,
            hit_role,
            settlement,
            responses,
        })
    }

    /// Ask Lester for offers until one is complete and acceptable.
    pub async fn negotiate(&self) -> Result<CompleteOffer> {
        loop {
            if self.cancel.is_cancelled() {
                return Err(OrchestratorError::Cancelled);
            }

            let proposal = tokio::select! {
                _ = self.cancel.cancelled() => return Err(OrchestratorError::Cancelled),
                proposal = self.desk.propose_offer() => proposal?,
            };

            let Some(offer) = proposal else {
                debug!("Lester had no offer, asking again");
                continue;
            };

            let offer = match offer.complete() {
                Ok(offer) => offer,
                Err(e) => {
                    warn!(error = %e, "Rejecting incomplete offer");
                    self.desk.record_decision(false).await?;
                    continue;
                }
            };

            let accepted = offer.is_acceptable();
            self.desk.record_decision(accepted).await?;
            if accepted {
                return Ok(offer);
            }
            info!(
                police_risk = offer.police_risk,
                trevor_success = offer.trevor_success,
                franklin_success = offer.franklin_success,
                "Offer rejected"
            );
        }
    }

    async fn run_distraction(&self, offer: &CompleteOffer, role: Role) -> Result<PhaseSnapshot> {
        let operator = self.operator(role);
        let turns_needed = offer.turns_needed(role);

        operator.start_distraction(turns_needed).await?;
        debug!(role = %role, turns_needed, "Distraction started");
        self.await_terminal(operator.as_ref(), PhaseKind::Distraction)
            .await
    }

    /// The feed runs only for the hit and is stopped once, whatever happens.
    async fn run_hit(&self, offer: &CompleteOffer, role: Role) -> Result<PhaseSnapshot> {
        let frequency = offer.feed_frequency();
        self.desk.start_feed(frequency).await?;
        info!(frequency, "Star notifications started");

        let result = self.drive_hit(offer, role).await;

        match self.desk.stop_feed().await {
            Ok(()) => info!("Star notifications stopped"),
            Err(e) => warn!(error = %e, "Failed to stop star notifications"),
        }

        result
    }

    async fn drive_hit(&self, offer: &CompleteOffer, role: Role) -> Result<PhaseSnapshot> {
        let operator = self.operator(role);
        let turns_needed = offer.turns_needed(role);

        operator.start_hit(turns_needed, offer.loot).await?;
        debug!(role = %role, turns_needed, loot = offer.loot, "Hit started");
        self.await_terminal(operator.as_ref(), PhaseKind::Hit).await
    }

    async fn settle(&self, hit_role: Role) -> Result<(Settlement, CutResponses)> {
        let loot = self.operator(hit_role).retrieve_loot().await?;
        let settlement = Settlement::compute(loot.loot, loot.extra_loot).ok_or_else(|| {
            OrchestratorError::InvalidResponse(format!(
                "{} reported loot that overflows: {} + {}",
                hit_role, loot.loot, loot.extra_loot
            ))
        })?;
        info!(
            total = settlement.total(),
            share = settlement.share,
            remainder = settlement.remainder,
            "Loot split computed"
        );

        let cut = |share| CutDetails::new(settlement.loot, settlement.extra_loot, share);

        let trevor = self.trevor.confirm_cut(cut(settlement.trevor_share)).await?;
        info!(response = %trevor.message, "Trevor's response");
        let franklin = self
            .franklin
            .confirm_cut(cut(settlement.franklin_share))
            .await?;
        info!(response = %franklin.message, "Franklin's response");
        let lester = self
            .desk
            .verify_settlement(cut(settlement.lester_share))
            .await?;
        info!(response = %lester.message, "Lester's response");

        Ok((
            settlement,
            CutResponses {
                trevor,
                franklin,
                lester,
            },
        ))
    }

    /// Poll `operator` until its phase is terminal, the timeout expires or
    /// the mission is cancelled.
    async fn await_terminal(
        &self,
        operator: &dyn Operator,
        phase: PhaseKind,
    ) -> Result<PhaseSnapshot> {
        let role = operator.role();
        let timeout = self.config.phase_timeout;
        let deadline = tokio::time::sleep(timeout);
        tokio::pin!(deadline);

        let mut ticker = interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => return Err(OrchestratorError::Cancelled),
                _ = &mut deadline => {
                    return Err(OrchestratorError::PhaseTimeout { role, phase, timeout });
                }
                _ = ticker.tick() => {}
            }

            let snapshot = operator.check_status().await?;
            if snapshot.status.is_terminal() {
                info!(
                    role = %role,
                    phase = phase.as_str(),
                    status = snapshot.status.as_str(),
                    "Phase finished"
                );
                return Ok(snapshot);
            }
            debug!(
                role = %role,
                phase = phase.as_str(),
                stars = snapshot.current_severity,
                "Phase still running"
            );
        }
    }

    fn operator(&self, role: Role) -> Arc<dyn Operator> {
        match role {
            Role::Trevor => self.trevor.clone(),
            Role::Franklin => self.franklin.clone(),
        }
    }
}
