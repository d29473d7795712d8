use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::Role;

/// Number of equal parts the loot is divided into.
pub const SPLIT_PARTS: u64 = 4;

pub const LESTER_CUT_OK: &str = "Excellent! The payment is correct!";
pub const LESTER_CUT_WRONG: &str = "That's not what we agreed on...";
pub const CREW_CUT_OK: &str = "Just what I expected";
pub const CREW_CUT_WRONG: &str = "Not what I expected at all";

/// Four-way split of the total loot. Lester absorbs the remainder.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct Settlement {
    pub loot: u64,
    pub extra_loot: u64,
    pub share: u64,
    pub remainder: u64,
    pub lester_share: u64,
    pub trevor_share: u64,
    pub franklin_share: u64,
    /// The orchestrator's own cut.
    pub michael_share: u64,
}

impl Settlement {
    /// Split `loot + extra_loot`. `None` when the total does not fit in a `u64`.
    pub fn compute(loot: u64, extra_loot: u64) -> Option<Self> {
        let total = total_loot(loot, extra_loot)?;
        let share = total / SPLIT_PARTS;
        let remainder = total % SPLIT_PARTS;

        Some(Self {
            loot,
            extra_loot,
            share,
            remainder,
            lester_share: share + remainder,
            trevor_share: share,
            franklin_share: share,
            michael_share: share,
        })
    }

    pub fn total(&self) -> u64 {
        self.loot.saturating_add(self.extra_loot)
    }

    pub fn share_of(&self, role: Role) -> u64 {
        match role {
            Role::Trevor => self.trevor_share,
            Role::Franklin => self.franklin_share,
        }
    }

    /// Sum of every payout, including the orchestrator's cut.
    pub fn paid_out(&self) -> u64 {
        [self.trevor_share, self.franklin_share, self.michael_share]
            .into_iter()
            .fold(self.lester_share, u64::saturating_add)
    }
}

pub fn total_loot(loot: u64, extra_loot: u64) -> Option<u64> {
    loot.checked_add(extra_loot)
}

pub fn equal_share(loot: u64, extra_loot: u64) -> Option<u64> {
    total_loot(loot, extra_loot).map(|total| total / SPLIT_PARTS)
}

pub fn lester_share(loot: u64, extra_loot: u64) -> Option<u64> {
    total_loot(loot, extra_loot).map(|total| total / SPLIT_PARTS + total % SPLIT_PARTS)
}

/// A payout claim sent to one party for confirmation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct CutDetails {
    pub loot: u64,
    pub extra_loot: u64,
    pub share: u64,
}

impl CutDetails {
    pub fn new(loot: u64, extra_loot: u64, share: u64) -> Self {
        Self {
            loot,
            extra_loot,
            share,
        }
    }
}

/// Business acknowledgement; `ok == false` is an outcome, not an error.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct Ack {
    pub ok: bool,
    pub message: String,
}

impl Ack {
    pub fn new(ok: bool, message: impl Into<String>) -> Self {
        Self {
            ok,
            message: message.into(),
        }
    }
}

/// Lester's check: the share must include the remainder. A total that
/// overflows is never a valid split.
pub fn verify_lester_cut(cut: &CutDetails) -> Ack {
    if lester_share(cut.loot, cut.extra_loot) == Some(cut.share) {
        Ack::new(true, LESTER_CUT_OK)
    } else {
        Ack::new(false, LESTER_CUT_WRONG)
    }
}

/// An executor's check: the share is the plain equal part.
pub fn verify_crew_cut(cut: &CutDetails) -> Ack {
    if equal_share(cut.loot, cut.extra_loot) == Some(cut.share) {
        Ack::new(true, CREW_CUT_OK)
    } else {
        Ack::new(false, CREW_CUT_WRONG)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_even_split() {
        let settlement = Settlement::compute(1_000_000, 0).unwrap();
        assert_eq!(settlement.share, 250_000);
        assert_eq!(settlement.lester_share, 250_000);
        assert_eq!(settlement.trevor_share, 250_000);
        assert_eq!(settlement.franklin_share, 250_000);
        assert_eq!(settlement.remainder, 0);
    }

    #[test]
    fn test_remainder_goes_to_lester() {
        let settlement = Settlement::compute(1_000_001, 0).unwrap();
        assert_eq!(settlement.share, 250_000);
        assert_eq!(settlement.lester_share, 250_001);
        assert_eq!(settlement.trevor_share, 250_000);
        assert_eq!(settlement.franklin_share, 250_000);
    }

    #[test]
    fn test_split_conserves_total() {
        for loot in [0u64, 1, 2, 3, 7, 999, 1_000_003, 12_345_678] {
            for extra in [0u64, 1, 5, 250] {
                let s = Settlement::compute(loot, extra).unwrap();
                assert_eq!(s.paid_out(), loot + extra);
                assert_eq!(s.lester_share - s.share, (loot + extra) % SPLIT_PARTS);
                assert_eq!(s.total(), loot + extra);
            }
        }
    }

    #[test]
    fn test_verify_lester_cut() {
        let ok = verify_lester_cut(&CutDetails::new(1_000_001, 0, 250_001));
        assert!(ok.ok);
        assert_eq!(ok.message, LESTER_CUT_OK);

        let wrong = verify_lester_cut(&CutDetails::new(1_000_001, 0, 250_000));
        assert!(!wrong.ok);
        assert_eq!(wrong.message, LESTER_CUT_WRONG);
    }

    #[test]
    fn test_verify_crew_cut_ignores_remainder() {
        assert!(verify_crew_cut(&CutDetails::new(1_000_003, 0, 250_000)).ok);
        assert!(!verify_crew_cut(&CutDetails::new(1_000_003, 0, 250_003)).ok);
    }

    #[test]
    fn test_overflowing_total_is_rejected() {
        assert_eq!(Settlement::compute(u64::MAX, 1), None);
        assert!(Settlement::compute(u64::MAX, 0).is_some());

        let lester = verify_lester_cut(&CutDetails::new(u64::MAX, 1, 0));
        assert!(!lester.ok);
        assert_eq!(lester.message, LESTER_CUT_WRONG);

        let crew = verify_crew_cut(&CutDetails::new(u64::MAX, 1, u64::MAX / 4));
        assert!(!crew.ok);
        assert_eq!(crew.message, CREW_CUT_WRONG);
    }
}
