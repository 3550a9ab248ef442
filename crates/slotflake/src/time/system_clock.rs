use crate::TimeSource;
use std::time::{SystemTime, UNIX_EPOCH};

/// The system wall clock.
///
/// Unlike a monotonic timer this follows NTP steps and manual adjustments,
/// which is what lets generators notice the clock moving backwards instead of
/// silently papering over it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn current_millis(&self) -> u64 {
        // A clock set before 1970 reads as 0 and trips the epoch check.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_millis() as u64)
    }
}
