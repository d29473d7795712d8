use heist_core::PhaseStatus;

use crate::error::{CrewError, Result};

pub struct PhaseStateMachine;

impl PhaseStateMachine {
    pub fn validate_transition(from: &PhaseStatus, to: &PhaseStatus) -> Result<()> {
        let allowed = Self::allowed_transitions(from);

        if allowed.contains(to) {
            Ok(())
        } else {
            Err(CrewError::InvalidTransition {
                from: from.as_str().to_string(),
                to: to.as_str().to_string(),
            })
        }
    }

    fn allowed_transitions(from: &PhaseStatus) -> Vec<PhaseStatus> {
        match from {
            PhaseStatus::AwaitingOrders => vec![PhaseStatus::InProgress],
            PhaseStatus::InProgress => vec![PhaseStatus::Success, PhaseStatus::Failure],
            PhaseStatus::Success => vec![PhaseStatus::InProgress],
            PhaseStatus::Failure => vec![PhaseStatus::InProgress],
        }
    }

    pub fn can_transition(from: &PhaseStatus, to: &PhaseStatus) -> bool {
        Self::validate_transition(from, to).is_ok()
    }

    /// A new phase may start from any state except a running one.
    pub fn can_start(current: &PhaseStatus) -> bool {
        Self::can_transition(current, &PhaseStatus::InProgress)
    }
}
