use crate::{Error, IdGenStatus, Result, Slot, SlotflakeId, TimeSource};

/// A minimal interface for generating slot-scoped Snowflake IDs.
pub trait SlotflakeGenerator {
    /// The leased slot encoded into every ID.
    fn slot(&self) -> Slot;

    /// The epoch, in milliseconds since 1970-01-01 UTC, that timestamps are
    /// measured from.
    fn epoch_millis(&self) -> u64;

    /// Attempts to generate the next ID without waiting.
    ///
    /// # Errors
    ///
    /// - [`Error::ClockRegression`] if the clock reads earlier than the last
    ///   issued ID.
    /// - [`Error::ClockBeforeEpoch`] / [`Error::TimestampOverflow`] if the
    ///   clock cannot be expressed in the 41-bit timestamp field.
    /// - [`Error::LockPoisoned`] if a lock-based implementation was poisoned.
    fn try_poll_id(&self) -> Result<IdGenStatus>;

    /// Generates the next ID, spinning until the millisecond advances when
    /// 4096 IDs were already issued in the current one.
    ///
    /// # Errors
    ///
    /// Same as [`Self::try_poll_id`]; a clock regression is surfaced
    /// immediately rather than waited out.
    fn next_id(&self) -> Result<SlotflakeId> {
        loop {
            match self.try_poll_id()? {
                IdGenStatus::Ready { id } => break Ok(id),
                IdGenStatus::Pending { .. } => core::hint::spin_loop(),
            }
        }
    }

    /// Returns the wall-clock millisecond at which `id` was minted.
    fn decode_generation_time(&self, id: SlotflakeId) -> u64 {
        id.generation_time(self.epoch_millis())
    }
}

/// Reads `time` and converts it into a 41-bit timestamp offset from `epoch`.
#[inline]
pub(crate) fn offset_millis<T: TimeSource>(time: &T, epoch: u64) -> Result<u64> {
    let now = time.current_millis();
    let offset = now
        .checked_sub(epoch)
        .ok_or(Error::ClockBeforeEpoch { now, epoch })?;
    if offset > SlotflakeId::max_timestamp() {
        return Err(Error::TimestampOverflow { offset });
    }
    Ok(offset)
}

#[cold]
#[inline(never)]
pub(crate) fn cold_clock_behind(now: u64, last: u64, epoch: u64) -> Error {
    let (last, now) = (last + epoch, now + epoch);
    tracing::error!(last, now, "clock moved backwards, refusing to issue an ID");
    Error::ClockRegression { last, now }
}
