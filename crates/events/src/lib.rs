//! Star feed for the heist crew.
//!
//! A single-topic broadcast of an increasing star counter: the producer ticks
//! at a caller-chosen frequency, subscribers receive what is published while
//! they listen. There is no replay.

mod bus;
mod producer;
mod types;

pub use bus::EventBus;
pub use producer::{StarsProducer, TURN_DURATION};
pub use types::*;
