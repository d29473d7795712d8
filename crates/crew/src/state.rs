//! The executor's phase record and the per-turn rules that mutate it.
//!
//! Nothing here knows about time or channels; the engine calls these methods
//! once per tick and once per star update.

use heist_core::{PhaseKind, PhaseSnapshot, PhaseStatus, Role};
use tracing::info;

use crate::error::{CrewError, Result};
use crate::state_machine::PhaseStateMachine;

/// Stars at which the executor's ability switches on.
pub const ABILITY_THRESHOLD: u32 = 5;
/// Stars at which an active ability can no longer hold the police off.
pub const FAILURE_THRESHOLD: u32 = 7;

pub const HIT_FAILURE_MESSAGE: &str = "Too many stars! The cops arrived!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    Continue,
    Finished,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhaseState {
    status: PhaseStatus,
    message: String,
    current_severity: u32,
    ability_active: bool,
    extra_loot: u64,
    total_loot: u64,
}

impl PhaseState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> PhaseStatus {
        self.status
    }

    pub fn current_severity(&self) -> u32 {
        self.current_severity
    }

    pub fn ability_active(&self) -> bool {
        self.ability_active
    }

    pub fn snapshot(&self) -> PhaseSnapshot {
        PhaseSnapshot {
            status: self.status,
            message: self.message.clone(),
            current_severity: self.current_severity,
            ability_active: self.ability_active,
            extra_loot: self.extra_loot,
            total_loot: self.total_loot,
        }
    }

    /// Overwrite the record for a new phase. Refused while one is running.
    pub fn begin(&mut self, kind: PhaseKind) -> Result<()> {
        if !PhaseStateMachine::can_start(&self.status) {
            return Err(CrewError::PhaseBusy { requested: kind });
        }

        self.status = PhaseStatus::InProgress;
        self.message.clear();
        self.current_severity = 0;
        self.ability_active = false;
        if kind == PhaseKind::Hit {
            self.extra_loot = 0;
            self.total_loot = 0;
        }
        Ok(())
    }

    /// Apply a star update. Dropped unless a phase is running.
    pub fn apply_severity(&mut self, stars: u32) -> bool {
        if self.status != PhaseStatus::InProgress {
            return false;
        }
        self.current_severity = stars;
        true
    }

    /// One distraction turn. The failure trial is drawn only at the midpoint.
    pub fn distraction_turn(
        &mut self,
        role: Role,
        turn: u32,
        turns_needed: u32,
        trial_failed: impl FnOnce() -> bool,
    ) -> Result<TurnOutcome> {
        if turn == turns_needed / 2 && trial_failed() {
            info!(role = %role, turn, "Distraction failed");
            self.finish(PhaseStatus::Failure, role.distraction_failure_message())?;
            return Ok(TurnOutcome::Finished);
        }

        if turn >= turns_needed {
            self.complete_distraction(role, turn)?;
            return Ok(TurnOutcome::Finished);
        }

        Ok(TurnOutcome::Continue)
    }

    pub fn complete_distraction(&mut self, role: Role, turns: u32) -> Result<()> {
        self.finish(PhaseStatus::Success, "Distraction complete")?;
        info!(role = %role, turns, "Distraction succeeded");
        Ok(())
    }

    /// One hit turn against the latest star count.
    pub fn hit_turn(
        &mut self,
        role: Role,
        turn: u32,
        turns_needed: u32,
        loot: u64,
    ) -> Result<TurnOutcome> {
        if self.current_severity >= ABILITY_THRESHOLD && !self.ability_active {
            info!(role = %role, ability = role.ability(), turn, "Ability activated");
            self.ability_active = true;
        }

        if self.ability_active && self.current_severity >= FAILURE_THRESHOLD {
            info!(
                role = %role,
                turn,
                stars = self.current_severity,
                "Hit failed, too many stars"
            );
            self.finish(PhaseStatus::Failure, HIT_FAILURE_MESSAGE)?;
            self.current_severity = 0;
            return Ok(TurnOutcome::Finished);
        }

        if turn >= turns_needed {
            self.complete_hit(role, turns_needed, loot)?;
            return Ok(TurnOutcome::Finished);
        }

        Ok(TurnOutcome::Continue)
    }

    pub fn complete_hit(&mut self, role: Role, turns: u32, loot: u64) -> Result<()> {
        self.finish(PhaseStatus::Success, "Hit complete")?;

        // No rule grants an ability bonus yet.
        let extra_loot = 0;
        info!(role = %role, turns, extra_loot, "Hit succeeded");

        self.current_severity = 0;
        self.ability_active = false;
        self.extra_loot = extra_loot;
        self.total_loot = loot.saturating_add(extra_loot);
        Ok(())
    }

    /// Only a running phase can end.
    fn finish(&mut self, status: PhaseStatus, message: &str) -> Result<()> {
        PhaseStateMachine::validate_transition(&self.status, &status)?;
        self.status = status;
        self.message = message.to_string();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running_hit() -> PhaseState {
        let mut state = PhaseState::new();
        state.begin(PhaseKind::Hit).unwrap();
        state
    }

    #[test]
    fn test_new_state_awaits_orders() {
        let state = PhaseState::new();
        assert_eq!(state.status(), PhaseStatus::AwaitingOrders);
        assert_eq!(state.snapshot().total_loot, 0);
    }

    #[test]
    fn test_begin_refused_while_running() {
        let mut state = PhaseState::new();
        state.begin(PhaseKind::Distraction).unwrap();
        let err = state.begin(PhaseKind::Hit).unwrap_err();
        assert!(matches!(
            err,
            CrewError::PhaseBusy {
                requested: PhaseKind::Hit
            }
        ));
        assert_eq!(state.status(), PhaseStatus::InProgress);
    }

    #[test]
    fn test_distraction_trial_only_at_midpoint() {
        let mut state = PhaseState::new();
        state.begin(PhaseKind::Distraction).unwrap();

        let mut draws = 0;
        for turn in 1..=10 {
            let outcome = state.distraction_turn(Role::Trevor, turn, 10, || {
                draws += 1;
                false
            })
            .unwrap();
            if turn < 10 {
                assert_eq!(outcome, TurnOutcome::Continue);
            } else {
                assert_eq!(outcome, TurnOutcome::Finished);
            }
        }
        assert_eq!(draws, 1);
        assert_eq!(state.status(), PhaseStatus::Success);
    }

    #[test]
    fn test_distraction_failure_uses_role_message() {
        let mut state = PhaseState::new();
        state.begin(PhaseKind::Distraction).unwrap();

        assert_eq!(
            state.distraction_turn(Role::Franklin, 1, 4, || true).unwrap(),
            TurnOutcome::Continue
        );
        assert_eq!(
            state.distraction_turn(Role::Franklin, 2, 4, || true).unwrap(),
            TurnOutcome::Finished
        );
        let snapshot = state.snapshot();
        assert_eq!(snapshot.status, PhaseStatus::Failure);
        assert_eq!(snapshot.message, Role::Franklin.distraction_failure_message());
    }

    #[test]
    fn test_ability_is_sticky() {
        let mut state = running_hit();

        state.apply_severity(5);
        assert_eq!(state.hit_turn(Role::Trevor, 1, 100, 10).unwrap(), TurnOutcome::Continue);
        assert!(state.ability_active());

        state.apply_severity(2);
        assert_eq!(state.hit_turn(Role::Trevor, 2, 100, 10).unwrap(), TurnOutcome::Continue);
        assert!(state.ability_active());

        state.apply_severity(7);
        assert_eq!(state.hit_turn(Role::Trevor, 3, 100, 10).unwrap(), TurnOutcome::Finished);
        let snapshot = state.snapshot();
        assert_eq!(snapshot.status, PhaseStatus::Failure);
        assert_eq!(snapshot.message, HIT_FAILURE_MESSAGE);
        assert_eq!(snapshot.current_severity, 0);
    }

    #[test]
    fn test_never_fails_below_ability_threshold() {
        let mut state = running_hit();
        for turn in 1..=20 {
            state.apply_severity(4);
            assert_eq!(
                state.hit_turn(Role::Franklin, turn, 20, 1_000).unwrap(),
                if turn < 20 {
                    TurnOutcome::Continue
                } else {
                    TurnOutcome::Finished
                }
            );
            assert!(!state.ability_active() || state.status() == PhaseStatus::Success);
        }
        assert_eq!(state.status(), PhaseStatus::Success);
    }

    #[test]
    fn test_jump_to_seven_activates_and_fails_same_turn() {
        let mut state = running_hit();
        state.apply_severity(7);
        assert_eq!(state.hit_turn(Role::Trevor, 1, 100, 10).unwrap(), TurnOutcome::Finished);
        assert_eq!(state.status(), PhaseStatus::Failure);
    }

    #[test]
    fn test_hit_success_records_loot_and_clears_flags() {
        let mut state = running_hit();
        state.apply_severity(6);
        state.hit_turn(Role::Franklin, 1, 2, 1_500_000).unwrap();
        assert!(state.ability_active());
        assert_eq!(state.hit_turn(Role::Franklin, 2, 2, 1_500_000).unwrap(), TurnOutcome::Finished);

        let snapshot = state.snapshot();
        assert_eq!(snapshot.status, PhaseStatus::Success);
        assert_eq!(snapshot.current_severity, 0);
        assert!(!snapshot.ability_active);
        assert_eq!(snapshot.total_loot, 1_500_000);
        assert_eq!(snapshot.extra_loot, 0);
    }

    #[test]
    fn test_updates_dropped_after_terminal() {
        let mut state = running_hit();
        state.complete_hit(Role::Trevor, 0, 10).unwrap();
        assert!(!state.apply_severity(9));
        assert_eq!(state.current_severity(), 0);
    }

    #[test]
    fn test_only_running_phase_can_finish() {
        let mut state = PhaseState::new();
        let err = state.complete_hit(Role::Franklin, 0, 10).unwrap_err();
        assert!(matches!(err, CrewError::InvalidTransition { .. }));
        assert_eq!(state.status(), PhaseStatus::AwaitingOrders);
        assert_eq!(state.snapshot().total_loot, 0);

        let mut state = running_hit();
        state.complete_hit(Role::Franklin, 0, 10).unwrap();
        assert!(state.complete_distraction(Role::Franklin, 0).is_err());
        assert_eq!(state.snapshot().message, "Hit complete");
    }
}
