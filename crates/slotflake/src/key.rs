//! Lease key layout.
//!
//! Keys are uppercase, `:`-separated paths: `PREFIX:SUBJECT:field1:field2...`.
//! Slot leases use `SNOWFLAKE:NODE:<datacenter>:<worker>`, which lets the
//! datacenter and worker be recovered from a listed key by position.

use core::fmt;

use crate::Slot;

/// Separator between key segments.
pub const SEPARATOR: char = ':';

/// Joins `prefix` and `parts` into an uppercase, `:`-separated key.
///
/// ```
/// assert_eq!(slotflake::compose_key("snowflake", &[&"node", &3, &7]), "SNOWFLAKE:NODE:3:7");
/// ```
pub fn compose_key(prefix: &str, parts: &[&dyn fmt::Display]) -> String {
    let mut key = prefix.to_uppercase();
    for part in parts {
        key.push(SEPARATOR);
        key.push_str(&part.to_string().to_uppercase());
    }
    key
}

/// The namespace slot leases live under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySpace {
    prefix: String,
    subject: String,
}

impl Default for KeySpace {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PREFIX, Self::DEFAULT_SUBJECT)
    }
}

impl KeySpace {
    pub const DEFAULT_PREFIX: &'static str = "SNOWFLAKE";
    pub const DEFAULT_SUBJECT: &'static str = "NODE";

    const DATACENTER_INDEX: usize = 2;
    const WORKER_INDEX: usize = 3;
    const ITEM_COUNT: usize = 4;

    pub fn new(prefix: &str, subject: &str) -> Self {
        Self {
            prefix: prefix.to_uppercase(),
            subject: subject.to_uppercase(),
        }
    }

    /// The key holding the lease for `slot`.
    pub fn lease_key(&self, slot: Slot) -> String {
        compose_key(
            &self.prefix,
            &[&self.subject, &slot.datacenter_id, &slot.worker_id],
        )
    }

    /// The prefix every lease key in this space starts with, for
    /// [`CoordinationStore::list_keys`](crate::CoordinationStore::list_keys).
    pub fn scan_prefix(&self) -> String {
        let mut prefix = compose_key(&self.prefix, &[&self.subject]);
        prefix.push(SEPARATOR);
        prefix
    }

    /// Recovers the slot named by a listed key, or `None` if the key does not
    /// belong to this space or its indices are not numbers.
    pub fn parse(&self, key: &str) -> Option<Slot> {
        let parts: Vec<&str> = key.split(SEPARATOR).collect();
        if parts.len() < Self::ITEM_COUNT || parts[0] != self.prefix || parts[1] != self.subject {
            return None;
        }
        let datacenter_id = parts[Self::DATACENTER_INDEX].parse().ok()?;
        let worker_id = parts[Self::WORKER_INDEX].parse().ok()?;
        Some(Slot::new(datacenter_id, worker_id))
    }
}
