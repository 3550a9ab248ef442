//! Snowflake-style 64-bit identifiers whose datacenter/worker bits are leased
//! from a shared coordination store.
//!
//! A process builds a [`SlotCoordinator`] over some [`CoordinationStore`],
//! calls [`SlotCoordinator::acquire_slot`] once at startup, keeps the lease
//! alive with a [`LeaseKeeper`], and mints IDs with
//! [`SlotCoordinator::next_id`] from any thread. On shutdown the keeper is
//! stopped and [`SlotCoordinator::release_slot`] frees the slot for the next
//! process.
//!
//! ```
//! use std::sync::Arc;
//! use slotflake::{CoordinatorConfig, MemoryStore, Slot, SlotCoordinator, SystemClock};
//!
//! let store = Arc::new(MemoryStore::new());
//! let coordinator =
//!     SlotCoordinator::new(store, CoordinatorConfig::default(), SystemClock).unwrap();
//!
//! assert_eq!(coordinator.acquire_slot().unwrap(), Slot::new(0, 0));
//!
//! let a = coordinator.next_id().unwrap();
//! let b = coordinator.next_id().unwrap();
//! assert!(a < b);
//!
//! coordinator.release_slot().unwrap();
//! ```

mod coordinator;
mod error;
mod generator;
mod hook;
mod id;
mod key;
mod mutex;
mod renewal;
mod store;
mod time;

pub use crate::coordinator::*;
pub use crate::error::*;
pub use crate::generator::*;
pub use crate::hook::*;
pub use crate::id::*;
pub use crate::key::*;
pub use crate::renewal::*;
pub use crate::store::*;
pub use crate::time::*;
