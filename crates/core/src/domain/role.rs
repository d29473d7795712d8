use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

use crate::error::CoreError;

/// One of the interchangeable executors that can run a phase.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Trevor,
    Franklin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trevor => "trevor",
            Self::Franklin => "franklin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trevor" => Some(Self::Trevor),
            "franklin" => Some(Self::Franklin),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Trevor => "Trevor",
            Self::Franklin => "Franklin",
        }
    }

    /// The other executor of the pair.
    pub fn partner(&self) -> Self {
        match self {
            Self::Trevor => Self::Franklin,
            Self::Franklin => Self::Trevor,
        }
    }

    /// Status message set when this role blows the distraction.
    pub fn distraction_failure_message(&self) -> &'static str {
        match self {
            Self::Trevor => "Trevor was too drunk!",
            Self::Franklin => "Chop barked and gave Franklin away!",
        }
    }

    /// Cause line used in the failure report for a blown distraction.
    pub fn distraction_failure_cause(&self) -> &'static str {
        match self {
            Self::Trevor => "Trevor was drunk",
            Self::Franklin => "Chop barked and distracted Franklin",
        }
    }

    /// Name of the special ability that switches on at five stars.
    pub fn ability(&self) -> &'static str {
        match self {
            Self::Trevor => "rage",
            Self::Franklin => "Chop",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| CoreError::UnknownRole(s.to_string()))
    }
}
