use core::{cmp::Ordering, time::Duration};

use crate::{
    IdGenStatus, Result, Slot, SlotflakeGenerator, SlotflakeId, TWITTER_EPOCH, TimeSource,
    generator::interface::{cold_clock_behind, offset_millis},
    mutex::Mutex,
};

/// A lock-based ID generator suitable for multi-threaded environments.
///
/// The last timestamp and sequence live in a single packed [`SlotflakeId`]
/// behind a [`Mutex`]. The clock is sampled while the lock is held, so the
/// whole read-modify-compose step is one critical section and concurrent
/// callers can never observe each other's later timestamps as a regression.
///
/// ## Features
/// - ✅ Thread-safe
/// - ✅ Fair access across threads (with `parking-lot`)
///
/// ## See Also
/// - [`AtomicSlotflakeGenerator`]
///
/// [`AtomicSlotflakeGenerator`]: crate::AtomicSlotflakeGenerator
pub struct LockSlotflakeGenerator<T>
where
    T: TimeSource,
{
    #[cfg(feature = "cache-padded")]
    state: crossbeam_utils::CachePadded<Mutex<SlotflakeId>>,
    #[cfg(not(feature = "cache-padded"))]
    state: Mutex<SlotflakeId>,
    slot: Slot,
    epoch: u64,
    time: T,
}

impl<T> LockSlotflakeGenerator<T>
where
    T: TimeSource,
{
    /// Creates a generator for `slot` measuring time from [`TWITTER_EPOCH`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSlot`] if either half of `slot` is outside
    /// `0..=31`.
    ///
    /// # Example
    /// ```
    /// use slotflake::{LockSlotflakeGenerator, Slot, SlotflakeGenerator, SystemClock};
    ///
    /// let generator = LockSlotflakeGenerator::new(Slot::new(1, 2), SystemClock).unwrap();
    /// let id = generator.next_id().unwrap();
    /// assert_eq!((id.datacenter_id(), id.worker_id()), (1, 2));
    /// ```
    ///
    /// [`Error::InvalidSlot`]: crate::Error::InvalidSlot
    pub fn new(slot: Slot, time: T) -> Result<Self> {
        Self::with_epoch(slot, TWITTER_EPOCH, time)
    }

    /// Creates a generator for `slot` measuring time from `epoch` (a
    /// [`Duration`] since 1970-01-01 UTC).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSlot`] if either half of `slot` is outside
    /// `0..=31`.
    ///
    /// [`Error::InvalidSlot`]: crate::Error::InvalidSlot
    pub fn with_epoch(slot: Slot, epoch: Duration, time: T) -> Result<Self> {
        slot.validate()?;
        let id = SlotflakeId::from_components(0, slot.datacenter_id, slot.worker_id, 0);
        Ok(Self {
            #[cfg(feature = "cache-padded")]
            state: crossbeam_utils::CachePadded::new(Mutex::new(id)),
            #[cfg(not(feature = "cache-padded"))]
            state: Mutex::new(id),
            slot,
            epoch: epoch.as_millis() as u64,
            time,
        })
    }

    /// Attempts to generate the next available ID.
    ///
    /// Returns [`IdGenStatus::Pending`] when all 4096 sequence values of the
    /// current millisecond are used.
    ///
    /// # Errors
    /// - [`Error::ClockRegression`] if the clock went backwards
    /// - [`Error::ClockBeforeEpoch`] / [`Error::TimestampOverflow`] if the
    ///   clock is outside the representable range
    /// - [`Error::LockPoisoned`] if the lock was poisoned (std mutex only)
    ///
    /// [`Error::ClockRegression`]: crate::Error::ClockRegression
    /// [`Error::ClockBeforeEpoch`]: crate::Error::ClockBeforeEpoch
    /// [`Error::TimestampOverflow`]: crate::Error::TimestampOverflow
    /// [`Error::LockPoisoned`]: crate::Error
    pub fn try_poll_id(&self) -> Result<IdGenStatus> {
        let mut id = {
            #[cfg(feature = "parking-lot")]
            {
                self.state.lock()
            }
            #[cfg(not(feature = "parking-lot"))]
            {
                self.state.lock()?
            }
        };

        let now = offset_millis(&self.time, self.epoch)?;
        let current_ts = id.timestamp();
        match now.cmp(&current_ts) {
            Ordering::Equal => {
                if id.has_sequence_room() {
                    *id = id.increment_sequence();
                    Ok(IdGenStatus::Ready { id: *id })
                } else {
                    Ok(IdGenStatus::Pending { yield_for: 1 })
                }
            }
            Ordering::Greater => {
                *id = id.rollover_to_timestamp(now);
                Ok(IdGenStatus::Ready { id: *id })
            }
            Ordering::Less => Err(cold_clock_behind(now, current_ts, self.epoch)),
        }
    }
}

impl<T> SlotflakeGenerator for LockSlotflakeGenerator<T>
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
