use core::{cmp, time::Duration};

use portable_atomic::{AtomicU64, Ordering};

use crate::{
    IdGenStatus, Result, Slot, SlotflakeGenerator, SlotflakeId, TWITTER_EPOCH, TimeSource,
    generator::interface::{cold_clock_behind, offset_millis},
};

/// A lock-free ID generator suitable for multi-threaded environments.
///
/// The packed state lives in an [`AtomicU64`] and is advanced with a single
/// compare-and-swap. A thread that loses the race gets
/// [`IdGenStatus::Pending`] with `yield_for: 0` and retries immediately.
///
/// The state is loaded *before* the clock is sampled: any timestamp another
/// thread has already committed was read from the clock earlier, so a later
/// read can only be behind it if the clock itself went backwards.
///
/// ## Features
/// - ✅ Thread-safe
/// - ❌ Fair access across threads
///
/// ## See Also
/// - [`LockSlotflakeGenerator`]
///
/// [`LockSlotflakeGenerator`]: crate::LockSlotflakeGenerator
pub struct AtomicSlotflakeGenerator<T>
where
    T: TimeSource,
{
    #[cfg(feature = "cache-padded")]
    state: crossbeam_utils::CachePadded<AtomicU64>,
    #[cfg(not(feature = "cache-padded"))]
    state: AtomicU64,
    slot: Slot,
    epoch: u64,
    time: T,
}

impl<T> AtomicSlotflakeGenerator<T>
where
    T: TimeSource,
{
    /// Creates a generator for `slot` measuring time from [`TWITTER_EPOCH`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSlot`](crate::Error::InvalidSlot) if either
    /// half of `slot` is outside `0..=31`.
    pub fn new(slot: Slot, time: T) -> Result<Self> {
        Self::with_epoch(slot, TWITTER_EPOCH, time)
    }

    /// Creates a generator for `slot` measuring time from `epoch`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSlot`](crate::Error::InvalidSlot) if either
    /// half of `slot` is outside `0..=31`.
    pub fn with_epoch(slot: Slot, epoch: Duration, time: T) -> Result<Self> {
        slot.validate()?;
        let raw = SlotflakeId::from_components(0, slot.datacenter_id, slot.worker_id, 0).to_raw();
        Ok(Self {
            #[cfg(feature = "cache-padded")]
            state: crossbeam_utils::CachePadded::new(AtomicU64::new(raw)),
            #[cfg(not(feature = "cache-padded"))]
            state: AtomicU64::new(raw),
            slot,
            epoch: epoch.as_millis() as u64,
            time,
        })
    }

    /// Attempts to generate the next available ID with a single CAS.
    ///
    /// # Errors
    /// - [`Error::ClockRegression`](crate::Error::ClockRegression) if the
    ///   clock went backwards
    /// - [`Error::ClockBeforeEpoch`](crate::Error::ClockBeforeEpoch) /
    ///   [`Error::TimestampOverflow`](crate::Error::TimestampOverflow) if the
    ///   clock is outside the representable range
    pub fn try_poll_id(&self) -> Result<IdGenStatus> {
        let current_raw = self.state.load(Ordering::Acquire);
        let now = offset_millis(&self.time, self.epoch)?;

        let current_id = SlotflakeId::from_raw(current_raw);
        let current_ts = current_id.timestamp();

        let next_id = match now.cmp(&current_ts) {
            cmp::Ordering::Equal => {
                if current_id.has_sequence_room() {
                    current_id.increment_sequence()
                } else {
                    return Ok(IdGenStatus::Pending { yield_for: 1 });
                }
            }
            cmp::Ordering::Greater => current_id.rollover_to_timestamp(now),
            cmp::Ordering::Less => {
                return Err(cold_clock_behind(now, current_ts, self.epoch));
            }
        };

        if self
            .state
            .compare_exchange(
                current_raw,
                next_id.to_raw(),
                Ordering::AcqRel,
                Ordering::Relaxed,
            )
            .is_ok()
        {
            Ok(IdGenStatus::Ready { id: next_id })
        } else {
            // Another thread won the race; retry immediately.
            Ok(IdGenStatus::Pending { yield_for: 0 })
        }
    }
}

impl<T> SlotflakeGenerator for AtomicSlotflakeGenerator<T>
where
    T: TimeSource,
{
    fn slot(&self) -> Slot {
        self.slot
    }

    fn epoch_millis(&self) -> u64 {
        self.epoch
    }

    fn try_poll_id(&self) -> Result<IdGenStatus> {
        self.try_poll_id()
    }
}
