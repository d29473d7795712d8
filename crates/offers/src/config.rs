use std::time::Duration;

use heist_core::Offer;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{OfferError, Result};

pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(10);
pub const DEFAULT_COOLDOWN_THRESHOLD: u32 = 3;
pub const DEFAULT_MISS_CHANCE_PERCENT: u32 = 10;

/// Bounds used to synthesize offers when no catalog is loaded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OfferRanges {
    pub loot_min: u64,
    pub loot_max: u64,
    pub risk_min: u32,
    pub risk_max: u32,
    pub success_min: u32,
    pub success_max: u32,
}

impl Default for OfferRanges {
    fn default() -> Self {
        Self {
            loot_min: 100_000,
            loot_max: 5_000_000,
            risk_min: 0,
            risk_max: 100,
            success_min: 0,
            success_max: 100,
        }
    }
}

impl OfferRanges {
    pub fn validate(&self) -> Result<()> {
        if self.loot_min > self.loot_max
            || self.risk_min > self.risk_max
            || self.success_min > self.success_max
        {
            return Err(OfferError::InvalidConfig(
                "offer range minimum exceeds maximum".to_string(),
            ));
        }
        if self.risk_max > 100 || self.success_max > 100 {
            return Err(OfferError::InvalidConfig(
                "risk and success ranges must stay within 0..=100".to_string(),
            ));
        }
        Ok(())
    }

    pub fn synthesize<R: Rng + ?Sized>(&self, rng: &mut R) -> Offer {
        Offer::new(
            rng.gen_range(self.loot_min..=self.loot_max),
            rng.gen_range(self.risk_min..=self.risk_max),
            rng.gen_range(self.success_min..=self.success_max),
            rng.gen_range(self.success_min..=self.success_max),
        )
    }
}

#[derive(Debug, Clone)]
pub struct OfferServiceConfig {
    /// Pause imposed before the next offer once the streak is reached
    pub cooldown: Duration,
    /// Consecutive rejections that trigger the cooldown
    pub cooldown_threshold: u32,
    /// Chance, in percent, that a proposal round yields nothing
    pub miss_chance_percent: u32,
    /// Seed for reproducible proposals; entropy when absent
    pub seed: Option<u64>,
    pub ranges: OfferRanges,
}

impl Default for OfferServiceConfig {
    fn default() -> Self {
        Self {
            cooldown: DEFAULT_COOLDOWN,
            cooldown_threshold: DEFAULT_COOLDOWN_THRESHOLD,
            miss_chance_percent: DEFAULT_MISS_CHANCE_PERCENT,
            seed: None,
            ranges: OfferRanges::default(),
        }
    }
}

impl OfferServiceConfig {
    pub fn validate(&self) -> Result<()> {
        if self.miss_chance_percent > 100 {
            return Err(OfferError::InvalidConfig(format!(
                "miss chance {}% is above 100%",
                self.miss_chance_percent
            )));
        }
        if self.cooldown_threshold == 0 {
            return Err(OfferError::InvalidConfig(
                "cooldown threshold must be at least 1".to_string(),
            ));
        }
        self.ranges.validate()
    }
}
