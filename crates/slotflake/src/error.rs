use crate::store::StoreError;

/// A result type defaulting to the crate's [`enum@Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All errors `slotflake` can produce.
///
/// Every variant is a local, synchronous failure. Apart from the bounded
/// retries applied while acquiring a slot, nothing here is retried on the
/// caller's behalf.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A datacenter or worker slot does not fit its 5-bit field.
    #[error("{field} {value} is out of range (max {max})")]
    InvalidSlot {
        field: &'static str,
        value: u64,
        max: u64,
    },

    /// A configuration value was rejected before anything was started.
    #[error("invalid configuration for `{field}`: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    /// The clock reported a millisecond earlier than the last issued ID.
    ///
    /// Fatal to the call that observed it: continuing could emit a duplicate
    /// or decreasing identifier.
    #[error("clock moved backwards: last issued at {last} ms, now {now} ms")]
    ClockRegression { last: u64, now: u64 },

    /// The clock reported a time earlier than the generator's epoch.
    #[error("clock reads {now} ms, which is before the epoch at {epoch} ms")]
    ClockBeforeEpoch { now: u64, epoch: u64 },

    /// The elapsed time since the epoch no longer fits in 41 bits.
    #[error("timestamp offset {offset} ms exceeds the 41-bit timestamp field")]
    TimestampOverflow { offset: u64 },

    /// Every (datacenter, worker) slot is already leased.
    #[error("all {capacity}x{capacity} datacenter/worker slots are leased")]
    SlotsExhausted { capacity: u64 },

    /// The coordination store kept failing for the whole retry budget.
    #[error("coordination store unavailable during `{operation}` after {attempts} attempts")]
    StoreUnavailable {
        operation: &'static str,
        attempts: u32,
        #[source]
        source: StoreError,
    },

    /// A single coordination store call failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The stored lease no longer names the slot this process holds.
    #[error("lease `{key}` holds {found}, expected {expected}")]
    LeaseMismatch {
        key: String,
        expected: String,
        found: String,
    },

    /// IDs were requested before a slot was acquired.
    #[error("no slot has been acquired yet")]
    Unbound,

    /// The lease on `slot` was released or lost; this coordinator will not
    /// issue IDs or acquire again.
    #[error("lease on slot {slot} has ended")]
    LeaseEnded { slot: crate::Slot },

    /// The generator lock was poisoned by a panicking thread.
    ///
    /// Not available with the `parking-lot` feature, whose mutexes do not
    /// poison.
    #[cfg(not(feature = "parking-lot"))]
    #[error("generator lock poisoned")]
    LockPoisoned,
}

#[cfg(not(feature = "parking-lot"))]
use crate::mutex::{MutexGuard, PoisonError};
#[cfg(not(feature = "parking-lot"))]
impl<T> From<PoisonError<MutexGuard<'_, T>>> for Error {
    fn from(_: PoisonError<MutexGuard<'_, T>>) -> Self {
        Self::LockPoisoned
    }
}
