use core::{str::FromStr, time::Duration};

use chrono::{DateTime, TimeDelta, Utc};
use cron::Schedule;

use crate::{Error, Result};

/// When a lease is renewed, as a cron expression evaluated in UTC.
///
/// Uses the 6-field (or 7-field, with year) format with seconds first:
///
/// ```text
/// sec  min  hour  day  month  weekday
/// 0    0    *     *    *      *        hourly, on the hour
/// 0    */10 *     *    *      *        every ten minutes
/// ```
#[derive(Debug, Clone)]
pub struct RenewalSchedule {
    expression: String,
    schedule: Schedule,
}

impl FromStr for RenewalSchedule {
    type Err = Error;

    fn from_str(expression: &str) -> Result<Self> {
        let schedule = Schedule::from_str(expression).map_err(|e| Error::InvalidConfig {
            field: "renewal_schedule",
            reason: format!("invalid cron expression '{expression}': {e}"),
        })?;
        Ok(Self {
            expression: expression.to_owned(),
            schedule,
        })
    }
}

impl RenewalSchedule {
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// The first fire time strictly after `now`.
    pub fn next_after(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule.after(&now).next()
    }

    /// How long to wait from `now` until the next fire time, or `None` if the
    /// schedule never fires again.
    pub fn delay_from(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.next_after(now)
            .map(|next| (next - now).to_std().unwrap_or(Duration::ZERO))
    }

    /// Walks the fire times from `now` until `horizon` has been covered and
    /// returns the first stretch of `limit` or longer with no firing.
    ///
    /// Jumps from each fire time to the latest one less than `limit` later,
    /// so it stays cheap for dense schedules while still catching the long
    /// pause after a burst (e.g. every minute on the 1st of the month).
    pub fn find_gap(
        &self,
        now: DateTime<Utc>,
        limit: Duration,
        horizon: Duration,
    ) -> Option<RenewalGap> {
        // Nothing can stay silent for longer than chrono can express.
        let limit = TimeDelta::from_std(limit).ok()?;
        let end = TimeDelta::from_std(horizon)
            .ok()
            .and_then(|horizon| now.checked_add_signed(horizon))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        let mut from = now;
        while from < end {
            let latest = from
                .checked_add_signed(limit)
                .and_then(|window_end| self.schedule.after(&window_end).next_back());
            match latest {
                Some(fire) if fire > from => from = fire,
                _ => {
                    return Some(RenewalGap {
                        from,
                        until: self.next_after(from),
                    });
                }
            }
        }
        None
    }
}

/// A stretch of time during which a [`RenewalSchedule`] never fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenewalGap {
    pub from: DateTime<Utc>,
    /// The next fire time, or `None` if the schedule never fires again.
    pub until: Option<DateTime<Utc>>,
}

impl RenewalGap {
    pub fn length(&self) -> Option<Duration> {
        self.until
            .map(|until| (until - self.from).to_std().unwrap_or(Duration::ZERO))
    }
}

impl core::fmt::Display for RenewalSchedule {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.expression)
    }
}
