use core::time::Duration;
use std::{collections::BTreeMap, time::Instant};

use crate::{
    CoordinationStore, StoreError,
    mutex::{Mutex, lock_recover},
};

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// An in-process [`CoordinationStore`].
///
/// Coordinates every [`SlotCoordinator`](crate::SlotCoordinator) sharing one
/// instance (typically behind an `Arc`), which makes it the store of choice
/// for tests and for single-process deployments running several generators.
/// Expired entries are evicted lazily on access.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns when `key` will expire, if it is live.
    pub fn expires_at(&self, key: &str) -> Option<Instant> {
        let now = Instant::now();
        lock_recover(&self.entries)
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.expires_at)
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        lock_recover(&self.entries)
            .values()
            .filter(|entry| entry.is_live(now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn live<R>(&self, key: &str, f: impl FnOnce(Option<&mut Entry>) -> R) -> R {
        let now = Instant::now();
        let mut entries = lock_recover(&self.entries);
        if entries.get(key).is_some_and(|entry| !entry.is_live(now)) {
            entries.remove(key);
        }
        f(entries.get_mut(key))
    }
}

impl CoordinationStore for MemoryStore {
    fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let now = Instant::now();
        let mut entries = lock_recover(&self.entries);
        entries.retain(|_, entry| entry.is_live(now));
        Ok(entries
            .range(prefix.to_owned()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect())
    }

    fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.live(key, |entry| entry.is_some()))
    }

    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.live(key, |entry| entry.map(|entry| entry.value.clone())))
    }

    fn set_with_expiry(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let entry = Entry {
            value: value.to_owned(),
            expires_at: deadline(ttl)?,
        };
        lock_recover(&self.entries).insert(key.to_owned(), entry);
        Ok(())
    }

    fn refresh_expiry(&self, key: &str, ttl: Duration) -> Result<bool, StoreError> {
        let expires_at = deadline(ttl)?;
        Ok(self.live(key, |entry| match entry {
            Some(entry) => {
                entry.expires_at = expires_at;
                true
            }
            None => false,
        }))
    }

    fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let now = Instant::now();
        Ok(lock_recover(&self.entries)
            .remove(key)
            .is_some_and(|entry| entry.is_live(now)))
    }
}

fn deadline(ttl: Duration) -> Result<Instant, StoreError> {
    Instant::now()
        .checked_add(ttl)
        .ok_or(StoreError::TtlOutOfRange { ttl })
}
