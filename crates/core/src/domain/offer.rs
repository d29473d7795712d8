use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::Role;
use crate::error::{CoreError, Result};

/// Turns are counted down from this ceiling by the executor's success score.
pub const TURN_CEILING: u32 = 200;
/// Feed frequency is derived from this ceiling minus the police risk.
pub const FEED_FREQUENCY_CEILING: u32 = 100;

const SUCCESS_THRESHOLD: u32 = 50;
const RISK_LIMIT: u32 = 80;

/// A proposed job. Any field may be missing when the catalog row was malformed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, ToSchema)]
pub struct Offer {
    pub loot: Option<u64>,
    pub police_risk: Option<u32>,
    pub trevor_success: Option<u32>,
    pub franklin_success: Option<u32>,
}

impl Offer {
    pub fn new(loot: u64, police_risk: u32, trevor_success: u32, franklin_success: u32) -> Self {
        Self {
            loot: Some(loot),
            police_risk: Some(police_risk),
            trevor_success: Some(trevor_success),
            franklin_success: Some(franklin_success),
        }
    }

    /// Returns the offer with every field present, or the list of missing ones.
    pub fn complete(&self) -> Result<CompleteOffer> {
        match (
            self.loot,
            self.police_risk,
            self.trevor_success,
            self.franklin_success,
        ) {
            (Some(loot), Some(police_risk), Some(trevor_success), Some(franklin_success)) => {
                Ok(CompleteOffer {
                    loot,
                    police_risk,
                    trevor_success,
                    franklin_success,
                })
            }
            _ => {
                let missing = [
                    ("loot", self.loot.is_none()),
                    ("police_risk", self.police_risk.is_none()),
                    ("trevor_success", self.trevor_success.is_none()),
                    ("franklin_success", self.franklin_success.is_none()),
                ]
                .into_iter()
                .filter_map(|(name, absent)| absent.then_some(name))
                .collect();
                Err(CoreError::IncompleteOffer { missing })
            }
        }
    }
}

/// An offer that passed validation; the orchestrator only plans against these.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct CompleteOffer {
    pub loot: u64,
    pub police_risk: u32,
    pub trevor_success: u32,
    pub franklin_success: u32,
}

impl CompleteOffer {
    /// At least one executor is likely to succeed and the police risk is tolerable.
    pub fn is_acceptable(&self) -> bool {
        (self.trevor_success > SUCCESS_THRESHOLD || self.franklin_success > SUCCESS_THRESHOLD)
            && self.police_risk < RISK_LIMIT
    }

    pub fn success_of(&self, role: Role) -> u32 {
        match role {
            Role::Trevor => self.trevor_success,
            Role::Franklin => self.franklin_success,
        }
    }

    /// The distraction goes to the stronger executor; ties go to Trevor.
    pub fn distraction_role(&self) -> Role {
        if self.franklin_success > self.trevor_success {
            Role::Franklin
        } else {
            Role::Trevor
        }
    }

    /// The hit goes to whoever did not run the distraction.
    pub fn hit_role(&self) -> Role {
        self.distraction_role().partner()
    }

    pub fn turns_needed(&self, role: Role) -> u32 {
        TURN_CEILING.saturating_sub(self.success_of(role))
    }

    /// Star frequency in turns: riskier jobs raise stars faster. Never zero.
    pub fn feed_frequency(&self) -> u32 {
        FEED_FREQUENCY_CEILING
            .saturating_sub(self.police_risk)
            .max(1)
    }
}

impl From<CompleteOffer> for Offer {
    fn from(offer: CompleteOffer) -> Self {
        Offer::new(
            offer.loot,
            offer.police_risk,
            offer.trevor_success,
            offer.franklin_success,
        )
    }
}

/// Body returned by the offer service; `offer` is null when Lester has nothing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct ProposeResponse {
    pub offer: Option<Offer>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct DecisionRequest {
    pub accepted: bool,
}
