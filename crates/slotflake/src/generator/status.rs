use crate::SlotflakeId;

/// Represents the result of a single, non-spinning generation attempt.
///
/// This type models the outcome of
/// [`SlotflakeGenerator::try_poll_id`](crate::SlotflakeGenerator::try_poll_id):
///
/// - [`IdGenStatus::Ready`] indicates a new ID was successfully generated.
/// - [`IdGenStatus::Pending`] means the generator cannot produce an ID right
///   now: the sequence for the current millisecond is used up, or (for the
///   atomic generator) another thread won the race for the state.
///
/// [`SlotflakeGenerator::next_id`](crate::SlotflakeGenerator::next_id) spins
/// over this until it sees `Ready`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdGenStatus {
    /// A unique ID was generated and is ready to use.
    Ready {
        /// The generated ID.
        id: SlotflakeId,
    },
    /// No ID could be generated on this attempt.
    Pending {
        /// Milliseconds to wait before the next attempt can succeed. Zero
        /// means retry immediately.
        yield_for: u64,
    },
}
