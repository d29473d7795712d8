use std::path::{Path, PathBuf};
use std::time::Duration;

use crew::CrewConfig;
use heist_core::Role;
use offers::{OfferRanges, OfferServiceConfig};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, warn};

pub const CONFIG_FILE: &str = "heist.toml";

pub const DEFAULT_LESTER_PORT: u16 = 50051;
pub const DEFAULT_TREVOR_PORT: u16 = 50053;
pub const DEFAULT_FRANKLIN_PORT: u16 = 50054;

pub fn default_port(role: Role) -> u16 {
    match role {
        Role::Trevor => DEFAULT_TREVOR_PORT,
        Role::Franklin => DEFAULT_FRANKLIN_PORT,
    }
}

/// Offer service settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LesterSettings {
    /// Comma-delimited offer catalog; offers are synthesized when absent
    pub catalog: Option<PathBuf>,
    pub cooldown_secs: u64,
    pub cooldown_threshold: u32,
    pub miss_chance_percent: u32,
    pub seed: Option<u64>,
    pub ranges: OfferRanges,
}

impl Default for LesterSettings {
    fn default() -> Self {
        let defaults = OfferServiceConfig::default();
        Self {
            catalog: None,
            cooldown_secs: defaults.cooldown.as_secs(),
            cooldown_threshold: defaults.cooldown_threshold,
            miss_chance_percent: defaults.miss_chance_percent,
            seed: None,
            ranges: defaults.ranges,
        }
    }
}

impl LesterSettings {
    pub fn service_config(&self) -> OfferServiceConfig {
        OfferServiceConfig {
            cooldown: Duration::from_secs(self.cooldown_secs),
            cooldown_threshold: self.cooldown_threshold,
            miss_chance_percent: self.miss_chance_percent,
            seed: self.seed,
            ranges: self.ranges.clone(),
        }
    }
}

/// Executor settings, shared by both crew members
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CrewSettings {
    pub tick_ms: u64,
    pub distraction_failure_percent: u32,
    pub seed: Option<u64>,
}

impl Default for CrewSettings {
    fn default() -> Self {
        let defaults = CrewConfig::new(Role::Trevor);
        Self {
            tick_ms: defaults.tick.as_millis() as u64,
            distraction_failure_percent: defaults.distraction_failure_percent,
            seed: None,
        }
    }
}

impl CrewSettings {
    pub fn crew_config(&self, role: Role) -> CrewConfig {
        let mut config = CrewConfig::new(role);
        config.tick = Duration::from_millis(self.tick_ms);
        config.distraction_failure_percent = self.distraction_failure_percent;
        config.seed = self.seed;
        config
    }
}

/// Orchestrator settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MichaelSettings {
    pub poll_interval_ms: u64,
    pub phase_timeout_secs: u64,
    /// Directory the mission report is written to
    pub report_dir: PathBuf,
}

impl Default for MichaelSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1_000,
            phase_timeout_secs: 120,
            report_dir: PathBuf::from("."),
        }
    }
}

/// Contents of `heist.toml`. Every section and key is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HeistConfig {
    pub lester: LesterSettings,
    pub crew: CrewSettings,
    pub michael: MichaelSettings,
}

impl HeistConfig {
    /// Read config from `path`, falling back to defaults when it is missing or invalid.
    pub async fn read(path: &Path) -> Self {
        if !path.exists() {
            debug!(path = %path.display(), "Config file does not exist, using defaults");
            return Self::default();
        }

        match fs::read_to_string(path).await {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => {
                    debug!(path = %path.display(), "Config loaded successfully");
                    config
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to parse config, using defaults");
                    Self::default()
                }
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read config file, using defaults");
                Self::default()
            }
        }
    }
}
