//! Wire types for the star feed

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// SSE event name used for every star update
pub const STARS_EVENT: &str = "stars.changed";

/// One star counter update with delivery metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct StarsUpdate {
    /// Unique event ID
    pub id: Uuid,
    /// When the update was produced
    pub timestamp: DateTime<Utc>,
    /// Current star count, increasing within one producer run
    pub stars: u32,
}

impl StarsUpdate {
    /// Create a new update with auto-generated ID and timestamp
    pub fn new(stars: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            stars,
        }
    }
}

/// Body of a feed start command
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct FeedStartRequest {
    /// Turns between two star updates
    pub frequency: u32,
}
