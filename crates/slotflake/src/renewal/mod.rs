mod keeper;
mod schedule;

pub use keeper::*;
pub use schedule::*;
