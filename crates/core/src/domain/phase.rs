use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, ToSchema, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStatus {
    #[default]
    AwaitingOrders,
    InProgress,
    Success,
    Failure,
}

impl PhaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AwaitingOrders => "awaiting_orders",
            Self::InProgress => "in_progress",
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "awaiting_orders" => Some(Self::AwaitingOrders),
            "in_progress" => Some(Self::InProgress),
            "success" => Some(Self::Success),
            "failure" => Some(Self::Failure),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failure)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKind {
    Distraction,
    Hit,
}

impl PhaseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Distraction => "distraction",
            Self::Hit => "hit",
        }
    }

    /// Label used in mission reports.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Distraction => "Distraction",
            Self::Hit => "Hit",
        }
    }
}

/// Point-in-time view of an executor's phase record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default, ToSchema)]
pub struct PhaseSnapshot {
    pub status: PhaseStatus,
    pub message: String,
    /// Stars seen during the running hit; zero otherwise.
    pub current_severity: u32,
    pub ability_active: bool,
    pub extra_loot: u64,
    pub total_loot: u64,
}

/// Loot recorded by the last successful hit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, ToSchema)]
pub struct LootDetails {
    pub loot: u64,
    pub extra_loot: u64,
}

impl LootDetails {
    pub fn total(&self) -> u64 {
        self.loot + self.extra_loot
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct DistractionRequest {
    pub turns_needed: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct HitRequest {
    pub turns_needed: u32,
    pub loot: u64,
}

/// Reply to a phase start request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct StartAck {
    pub phase: PhaseKind,
    pub accepted: bool,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_status_serialization() {
        assert_eq!(PhaseStatus::AwaitingOrders.as_str(), "awaiting_orders");
        assert_eq!(PhaseStatus::parse("in_progress"), Some(PhaseStatus::InProgress));
        assert_eq!(PhaseStatus::parse("done"), None);

        let json = serde_json::to_string(&PhaseStatus::Failure).unwrap();
        assert_eq!(json, "\"failure\"");
    }

    #[test]
    fn test_terminal_states() {
        assert!(!PhaseStatus::AwaitingOrders.is_terminal());
        assert!(!PhaseStatus::InProgress.is_terminal());
        assert!(PhaseStatus::Success.is_terminal());
        assert!(PhaseStatus::Failure.is_terminal());
    }

    #[test]
    fn test_default_snapshot_awaits_orders() {
        let snapshot = PhaseSnapshot::default();
        assert_eq!(snapshot.status, PhaseStatus::AwaitingOrders);
        assert_eq!(snapshot.current_severity, 0);
        assert!(!snapshot.ability_active);
    }
}
