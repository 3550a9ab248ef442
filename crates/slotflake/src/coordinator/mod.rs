mod allocate;
mod config;
mod slot_coordinator;
mod state;

pub use allocate::SLOTS_PER_FIELD;
pub use config::*;
pub use slot_coordinator::*;
pub use state::*;
