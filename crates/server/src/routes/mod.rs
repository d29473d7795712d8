mod feed;
mod health;
mod loot;
mod offers;
mod phases;

pub use feed::*;
pub use health::*;
pub use loot::*;
pub use offers::*;
pub use phases::*;
