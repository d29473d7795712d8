mod offer;
mod phase;
mod role;
mod settlement;

pub use offer::*;
pub use phase::*;
pub use role::*;
pub use settlement::*;
