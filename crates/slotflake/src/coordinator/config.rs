use core::time::Duration;
use std::thread::sleep;

use chrono::Utc;

use crate::{Error, KeySpace, RenewalSchedule, Result, StoreError, TWITTER_EPOCH};

/// Settings consumed by [`SlotCoordinator`](crate::SlotCoordinator).
///
/// Deserializable with every field optional, so it can be embedded in a
/// larger application config:
///
/// ```
/// let config: slotflake::CoordinatorConfig =
///     serde_json::from_str(r#"{ "lease_ttl_hours": 6, "renewal_schedule": "0 */10 * * * *" }"#)
///         .unwrap();
/// assert_eq!(config.lease_ttl().as_secs(), 6 * 3600);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// How long a lease survives without renewal.
    pub lease_ttl_hours: u64,
    /// Cron expression (seconds first) driving lease renewal.
    pub renewal_schedule: String,
    /// First key segment of lease keys.
    pub key_prefix: String,
    /// Second key segment of lease keys.
    pub key_subject: String,
    /// Origin of the 41-bit timestamp, in ms since 1970-01-01 UTC.
    pub epoch_millis: u64,
    /// Retry budget for store calls made while acquiring a slot.
    pub retry: RetryPolicy,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            lease_ttl_hours: 24,
            renewal_schedule: "0 0 * * * *".to_owned(),
            key_prefix: KeySpace::DEFAULT_PREFIX.to_owned(),
            key_subject: KeySpace::DEFAULT_SUBJECT.to_owned(),
            epoch_millis: TWITTER_EPOCH.as_millis() as u64,
            retry: RetryPolicy::default(),
        }
    }
}

impl CoordinatorConfig {
    /// Longest lease accepted: one (leap) year.
    pub const MAX_LEASE_TTL_HOURS: u64 = 366 * 24;

    // A year and then some, so monthly and yearly patterns are walked
    // through at least once.
    const SCHEDULE_HORIZON: Duration = Duration::from_secs(400 * 24 * 3600);

    pub fn lease_ttl(&self) -> Duration {
        Duration::from_secs(self.lease_ttl_hours.saturating_mul(3600))
    }

    pub fn epoch(&self) -> Duration {
        Duration::from_millis(self.epoch_millis)
    }

    pub fn key_space(&self) -> KeySpace {
        KeySpace::new(&self.key_prefix, &self.key_subject)
    }

    /// Checks the settings and returns the parsed renewal schedule.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the TTL is zero or longer than
    /// [`Self::MAX_LEASE_TTL_HOURS`], the retry budget is zero, the key
    /// segments are empty or contain `:`, the cron expression does not parse
    /// or never fires, or the schedule can leave the lease unrenewed for as
    /// long as its TTL at any point in the coming year.
    pub fn validate(&self) -> Result<RenewalSchedule> {
        if self.lease_ttl_hours == 0 {
            return Err(invalid("lease_ttl_hours", "must be at least 1 hour"));
        }
        if self.lease_ttl_hours > Self::MAX_LEASE_TTL_HOURS {
            return Err(invalid(
                "lease_ttl_hours",
                format!("must be at most {} hours", Self::MAX_LEASE_TTL_HOURS),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(invalid("retry.max_attempts", "must be at least 1"));
        }
        for (field, value) in [
            ("key_prefix", &self.key_prefix),
            ("key_subject", &self.key_subject),
        ] {
            if value.is_empty() || value.contains(crate::SEPARATOR) {
                return Err(invalid(field, "must be non-empty and free of ':'"));
            }
        }

        let schedule: RenewalSchedule = self.renewal_schedule.parse()?;
        let ttl = self.lease_ttl();
        let horizon = Self::SCHEDULE_HORIZON.max(ttl * 2);
        if let Some(gap) = schedule.find_gap(Utc::now(), ttl, horizon) {
            let reason = match gap.length() {
                Some(length) => format!(
                    "goes {}s without firing after {}, which is not shorter than the {}h lease TTL",
                    length.as_secs(),
                    gap.from.to_rfc3339(),
                    self.lease_ttl_hours
                ),
                None => "must fire repeatedly to keep the lease alive".to_owned(),
            };
            return Err(invalid("renewal_schedule", reason));
        }
        Ok(schedule)
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> Error {
    Error::InvalidConfig {
        field,
        reason: reason.into(),
    }
}

/// Bounded retries with capped exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff_ms: 100,
            max_backoff_ms: 2_000,
        }
    }
}

impl RetryPolicy {
    /// A single attempt with no waiting.
    pub const fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff_ms: 0,
            max_backoff_ms: 0,
        }
    }

    /// Runs `f` until it succeeds or the attempt budget is spent.
    pub(crate) fn run<T>(
        &self,
        operation: &'static str,
        mut f: impl FnMut() -> Result<T, StoreError>,
    ) -> Result<T> {
        let attempts = self.max_attempts.max(1);
        let mut backoff = Duration::from_millis(self.initial_backoff_ms);
        let max_backoff = Duration::from_millis(self.max_backoff_ms);
        let mut attempt = 1;
        loop {
            match f() {
                Ok(value) => return Ok(value),
                Err(source) if attempt >= attempts => {
                    return Err(Error::StoreUnavailable {
                        operation,
                        attempts,
                        source,
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        operation,
                        attempt,
                        error = %e,
                        "coordination store call failed, retrying"
                    );
                    sleep(backoff);
                    backoff = (backoff * 2).min(max_backoff);
                    attempt += 1;
                }
            }
        }
    }
}
