use std::time::Duration;

use heist_core::Role;

use crate::error::{CrewError, Result};

/// Wall-clock length of one phase turn.
pub const DEFAULT_TICK: Duration = Duration::from_millis(10);
pub const DEFAULT_DISTRACTION_FAILURE_PERCENT: u32 = 10;
pub const DEFAULT_FEED_RETRY_ATTEMPTS: u32 = 5;
pub const DEFAULT_FEED_INITIAL_BACKOFF: Duration = Duration::from_millis(100);
pub const DEFAULT_FEED_MAX_BACKOFF: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct CrewConfig {
    pub role: Role,
    pub tick: Duration,
    /// Chance, in percent, that the midpoint trial ends a distraction
    pub distraction_failure_percent: u32,
    /// Seed for reproducible trials; entropy when absent
    pub seed: Option<u64>,
    /// Consecutive failed subscriptions before a hit stops listening for stars
    pub feed_retry_attempts: u32,
    pub feed_initial_backoff: Duration,
    pub feed_max_backoff: Duration,
}

impl CrewConfig {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            tick: DEFAULT_TICK,
            distraction_failure_percent: DEFAULT_DISTRACTION_FAILURE_PERCENT,
            seed: None,
            feed_retry_attempts: DEFAULT_FEED_RETRY_ATTEMPTS,
            feed_initial_backoff: DEFAULT_FEED_INITIAL_BACKOFF,
            feed_max_backoff: DEFAULT_FEED_MAX_BACKOFF,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.tick.is_zero() {
            return Err(CrewError::InvalidConfig("tick must be positive".to_string()));
        }
        if self.distraction_failure_percent > 100 {
            return Err(CrewError::InvalidConfig(format!(
                "distraction failure chance {}% is above 100%",
                self.distraction_failure_percent
            )));
        }
        if self.feed_retry_attempts == 0 {
            return Err(CrewError::InvalidConfig(
                "feed retry attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
