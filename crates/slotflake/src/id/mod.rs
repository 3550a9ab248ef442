mod slot;
mod slotflake;

pub use slot::*;
pub use slotflake::*;
