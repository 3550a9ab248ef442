use core::time::Duration;
use std::sync::{
    OnceLock,
    atomic::{AtomicBool, Ordering},
};

use crate::{
    CoordinationStore, CoordinatorConfig, Error, IdGenStatus, KeySpace, LockSlotflakeGenerator,
    RenewalSchedule, Result, RetryPolicy, Slot, SlotState, SlotflakeGenerator, SlotflakeId,
    StoreError, SystemClock, TimeSource,
    coordinator::allocate::{SLOTS_PER_FIELD, find_free_slot, occupancy},
    mutex::{Mutex, lock_recover},
};

/// Leases a unique (datacenter, worker) slot from a shared
/// [`CoordinationStore`] and mints IDs with it.
///
/// One coordinator per process (or per logical generator). It is `Sync`:
/// share it behind an `Arc` between the threads minting IDs and a
/// [`LeaseKeeper`](crate::LeaseKeeper) renewing the lease. Lease bookkeeping
/// sits behind its own lock, so renewal never blocks [`Self::next_id`].
pub struct SlotCoordinator<S, T = SystemClock>
where
    S: CoordinationStore,
    T: TimeSource,
{
    store: S,
    keys: KeySpace,
    lease_ttl: Duration,
    epoch: Duration,
    retry: RetryPolicy,
    schedule: RenewalSchedule,
    clock: T,
    state: Mutex<SlotState>,
    issuing: AtomicBool,
    generator: OnceLock<LockSlotflakeGenerator<T>>,
}

impl<S, T> SlotCoordinator<S, T>
where
    S: CoordinationStore,
    T: TimeSource,
{
    /// Validates `config` and builds an unbound coordinator. Nothing is read
    /// from or written to `store` until [`Self::acquire_slot`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `config` fails
    /// [`CoordinatorConfig::validate`].
    pub fn new(store: S, config: CoordinatorConfig, clock: T) -> Result<Self> {
        let schedule = config.validate()?;
        Ok(Self {
            store,
            keys: config.key_space(),
            lease_ttl: config.lease_ttl(),
            epoch: config.epoch(),
            retry: config.retry,
            schedule,
            clock,
            state: Mutex::new(SlotState::Unbound),
            issuing: AtomicBool::new(false),
            generator: OnceLock::new(),
        })
    }

    /// Reserves the first free slot and builds the generator for it.
    ///
    /// Idempotent once bound: later calls return the same slot without
    /// touching the store. Store calls are retried per the configured
    /// [`RetryPolicy`].
    ///
    /// The listing, existence checks and write are not atomic, so two processes racing
    /// for the same slot can both believe they hold it. Use
    /// [`Self::verify_lease`] after acquisition to detect that.
    ///
    /// # Errors
    ///
    /// - [`Error::SlotsExhausted`] if every slot is leased; no lease is
    ///   written.
    /// - [`Error::StoreUnavailable`] if the store kept failing.
    /// - [`Error::LeaseEnded`] if this coordinator already released or lost
    ///   its lease.
    pub fn acquire_slot(&self) -> Result<Slot>
    where
        T: Clone,
    {
        let mut state = lock_recover(&self.state);
        match *state {
            SlotState::Bound(slot) => return Ok(slot),
            SlotState::Released(slot) | SlotState::Expired(slot) => {
                return Err(Error::LeaseEnded { slot });
            }
            SlotState::Unbound => {}
        }

        let slot = self.reserve()?;
        let generator = LockSlotflakeGenerator::with_epoch(slot, self.epoch, self.clock.clone())?;
        // Only the first successful acquisition reaches here.
        let _ = self.generator.set(generator);
        *state = SlotState::Bound(slot);
        self.issuing.store(true, Ordering::Release);
        tracing::info!(
            %slot,
            key = %self.keys.lease_key(slot),
            ttl_secs = self.lease_ttl.as_secs(),
            "acquired slot"
        );
        Ok(slot)
    }

    fn reserve(&self) -> Result<Slot> {
        let prefix = self.keys.scan_prefix();
        let listed = self.retry.run("list_keys", || self.store.list_keys(&prefix))?;

        let slot = if listed.is_empty() {
            Some(Slot::new(0, 0))
        } else {
            let occupied = occupancy(&self.keys, listed.iter().map(String::as_str));
            tracing::debug!(
                leases = listed.len(),
                datacenters = occupied.len(),
                "searching for a free slot"
            );
            find_free_slot(&occupied, |slot| {
                let key = self.keys.lease_key(slot);
                self.retry.run("exists", || self.store.exists(&key))
            })?
        };
        let Some(slot) = slot else {
            tracing::warn!(leases = listed.len(), "no free slot left");
            return Err(Error::SlotsExhausted {
                capacity: SLOTS_PER_FIELD,
            });
        };

        let key = self.keys.lease_key(slot);
        let value = serde_json::to_string(&slot).map_err(|e| StoreError::Corrupt {
            key: key.clone(),
            reason: e.to_string(),
        })?;
        self.retry.run("set_with_expiry", || {
            self.store.set_with_expiry(&key, &value, self.lease_ttl)
        })?;
        Ok(slot)
    }

    /// Pushes the lease's expiry out by a full TTL.
    ///
    /// Returns `Ok(false)` without touching the store when nothing is bound.
    /// If the lease key has vanished the coordinator moves to
    /// [`SlotState::Expired`], stops issuing IDs and returns `Ok(false)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Store`] if the store call failed. The state is left
    /// unchanged so the next scheduled renewal can try again.
    pub fn renew_lease(&self) -> Result<bool> {
        let mut state = lock_recover(&self.state);
        let SlotState::Bound(slot) = *state else {
            tracing::debug!(state = %*state, "no bound slot to renew");
            return Ok(false);
        };

        let key = self.keys.lease_key(slot);
        match self.store.refresh_expiry(&key, self.lease_ttl) {
            Ok(true) => {
                tracing::debug!(%slot, %key, "renewed lease");
                Ok(true)
            }
            Ok(false) => {
                *state = SlotState::Expired(slot);
                self.issuing.store(false, Ordering::Release);
                tracing::error!(
                    %slot,
                    %key,
                    "lease vanished before renewal; the slot may already be reused, no longer issuing IDs"
                );
                Ok(false)
            }
            Err(e) => {
                tracing::warn!(%slot, %key, error = %e, "failed to renew lease");
                Err(e.into())
            }
        }
    }

    /// Deletes the lease so another process can take the slot, and stops
    /// issuing IDs.
    ///
    /// Returns whether a lease was deleted. Calling it while unbound or
    /// after a previous release is a no-op returning `Ok(false)`; after the
    /// lease expired the coordinator is marked released without touching the
    /// store.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Store`] if the delete failed. The coordinator is
    /// released locally regardless and the lease is left to expire on its
    /// own.
    pub fn release_slot(&self) -> Result<bool> {
        let mut state = lock_recover(&self.state);
        let slot = match *state {
            SlotState::Bound(slot) => slot,
            // The key may belong to another process by now.
            SlotState::Expired(slot) => {
                *state = SlotState::Released(slot);
                return Ok(false);
            }
            SlotState::Unbound | SlotState::Released(_) => return Ok(false),
        };
        *state = SlotState::Released(slot);
        self.issuing.store(false, Ordering::Release);

        let key = self.keys.lease_key(slot);
        match self.store.delete(&key) {
            Ok(deleted) => {
                tracing::info!(%slot, %key, deleted, "released slot");
                Ok(deleted)
            }
            Err(e) => {
                tracing::warn!(
                    %slot,
                    %key,
                    error = %e,
                    ttl_secs = self.lease_ttl.as_secs(),
                    "failed to delete lease; it will expire on its own"
                );
                Err(e.into())
            }
        }
    }

    /// Reads the lease back and checks it still names this coordinator's
    /// slot.
    ///
    /// # Errors
    ///
    /// - [`Error::Unbound`] if no slot is bound.
    /// - [`Error::LeaseMismatch`] if the lease is missing or holds another
    ///   value.
    /// - [`Error::Store`] if the read failed.
    pub fn verify_lease(&self) -> Result<()> {
        let Some(slot) = self.state().slot().filter(|_| self.is_issuing()) else {
            return Err(Error::Unbound);
        };
        let key = self.keys.lease_key(slot);
        let stored = self.store.get(&key)?;
        let matches = stored
            .as_deref()
            .and_then(|value| serde_json::from_str::<Slot>(value).ok())
            == Some(slot);
        if matches {
            return Ok(());
        }
        let found = stored.unwrap_or_else(|| "nothing".to_owned());
        tracing::warn!(%slot, %key, %found, "lease does not name this slot");
        Err(Error::LeaseMismatch {
            key,
            expected: slot.to_string(),
            found,
        })
    }

    /// Mints the next ID, spinning through sequence exhaustion.
    ///
    /// # Errors
    ///
    /// - [`Error::Unbound`] before [`Self::acquire_slot`] succeeded.
    /// - [`Error::LeaseEnded`] after the lease was released or lost.
    /// - Any generator error, e.g. [`Error::ClockRegression`].
    pub fn next_id(&self) -> Result<SlotflakeId> {
        self.active_generator()?.next_id()
    }

    /// Attempts to mint an ID without spinning; see
    /// [`SlotflakeGenerator::try_poll_id`].
    ///
    /// # Errors
    ///
    /// Same as [`Self::next_id`].
    pub fn try_next_id(&self) -> Result<IdGenStatus> {
        self.active_generator()?.try_poll_id()
    }

    /// Like [`Self::next_id`], with the ID as a signed integer suitable for a
    /// `BIGINT` primary key. Always non-negative.
    pub fn next_i64(&self) -> Result<i64> {
        self.next_id().map(SlotflakeId::to_i64)
    }

    fn active_generator(&self) -> Result<&LockSlotflakeGenerator<T>> {
        let generator = self.generator.get().ok_or(Error::Unbound)?;
        if !self.is_issuing() {
            return Err(Error::LeaseEnded {
                slot: generator.slot(),
            });
        }
        Ok(generator)
    }

    fn is_issuing(&self) -> bool {
        self.issuing.load(Ordering::Acquire)
    }

    /// Wall-clock millisecond (since 1970-01-01 UTC) at which `id` was
    /// minted under this coordinator's epoch.
    pub fn decode_generation_time(&self, id: SlotflakeId) -> u64 {
        id.generation_time(self.epoch.as_millis() as u64)
    }

    pub fn state(&self) -> SlotState {
        *lock_recover(&self.state)
    }

    /// The bound slot, if currently leased.
    pub fn slot(&self) -> Option<Slot> {
        match self.state() {
            SlotState::Bound(slot) => Some(slot),
            _ => None,
        }
    }

    /// The generator built at acquisition, if any.
    pub fn generator(&self) -> Option<&LockSlotflakeGenerator<T>> {
        self.generator.get()
    }

    pub fn lease_key(&self) -> Option<String> {
        self.slot().map(|slot| self.keys.lease_key(slot))
    }

    pub fn schedule(&self) -> &RenewalSchedule {
        &self.schedule
    }

    pub fn lease_ttl(&self) -> Duration {
        self.lease_ttl
    }

    pub fn key_space(&self) -> &KeySpace {
        &self.keys
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S, T> core::fmt::Debug for SlotCoordinator<S, T>
where
    S: CoordinationStore,
    T: TimeSource,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SlotCoordinator")
            .field("state", &self.state())
            .field("keys", &self.keys)
            .field("lease_ttl", &self.lease_ttl)
            .field("schedule", &self.schedule.expression())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;
    use std::sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize},
    };

    /// Wraps a [`MemoryStore`], counting writes and optionally failing every
    /// call.
    #[derive(Default)]
    struct TestStore {
        inner: MemoryStore,
        down: AtomicBool,
        calls: AtomicUsize,
        writes: AtomicUsize,
        /// Keys reported as existing even though they are never listed.
        hidden: Vec<String>,
    }

    impl TestStore {
        fn check(&self) -> Result<(), StoreError> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            if self.down.load(Ordering::Relaxed) {
                Err(StoreError::Unavailable {
                    reason: "connection refused".to_owned(),
                })
            } else {
                Ok(())
            }
        }

        fn set_down(&self, down: bool) {
            self.down.store(down, Ordering::Relaxed);
        }

        fn writes(&self) -> usize {
            self.writes.load(Ordering::Relaxed)
        }
    }

    impl CoordinationStore for TestStore {
        fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
            self.check()?;
            self.inner.list_keys(prefix)
        }

        fn exists(&self, key: &str) -> Result<bool, StoreError> {
            self.check()?;
            Ok(self.hidden.iter().any(|k| k == key) || self.inner.exists(key)?)
        }

        fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            self.check()?;
            self.inner.get(key)
        }

        fn set_with_expiry(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
            self.check()?;
            self.writes.fetch_add(1, Ordering::Relaxed);
            self.inner.set_with_expiry(key, value, ttl)
        }

        fn refresh_expiry(&self, key: &str, ttl: Duration) -> Result<bool, StoreError> {
            self.check()?;
            self.inner.refresh_expiry(key, ttl)
        }

        fn delete(&self, key: &str) -> Result<bool, StoreError> {
            self.check()?;
            self.inner.delete(key)
        }
    }

    const HOUR: Duration = Duration::from_secs(3600);

    fn config() -> CoordinatorConfig {
        CoordinatorConfig {
            retry: RetryPolicy {
                max_attempts: 3,
                initial_backoff_ms: 0,
                max_backoff_ms: 0,
            },
            ..Default::default()
        }
    }

    fn coordinator<S: CoordinationStore>(store: S) -> SlotCoordinator<S> {
        SlotCoordinator::new(store, config(), SystemClock).unwrap()
    }

    fn lease(store: &impl CoordinationStore, d: u64, w: u64) {
        let key = KeySpace::default().lease_key(Slot::new(d, w));
        store
            .set_with_expiry(&key, &format!("[{d},{w}]"), HOUR)
            .unwrap();
    }

    #[test]
    fn empty_store_bootstraps_first_slot() {
        let store = Arc::new(TestStore::default());
        let coordinator = coordinator(store.clone());

        assert_eq!(coordinator.acquire_slot().unwrap(), Slot::new(0, 0));
        assert_eq!(coordinator.state(), SlotState::Bound(Slot::new(0, 0)));
        assert_eq!(
            store.inner.get("SNOWFLAKE:NODE:0:0").unwrap().as_deref(),
            Some("[0,0]")
        );
        let expires_in = store
            .inner
            .expires_at("SNOWFLAKE:NODE:0:0")
            .unwrap()
            .duration_since(std::time::Instant::now());
        assert!(expires_in > Duration::from_secs(23 * 3600));
    }

    #[test]
    fn takes_next_worker_in_used_datacenter() {
        let store = Arc::new(TestStore::default());
        lease(&store.inner, 0, 0);
        lease(&store.inner, 0, 1);

        assert_eq!(coordinator(store).acquire_slot().unwrap(), Slot::new(0, 2));
    }

    #[test]
    fn full_datacenter_spills_into_next() {
        let store = Arc::new(TestStore::default());
        for w in 0..SLOTS_PER_FIELD {
            lease(&store.inner, 0, w);
        }
        assert_eq!(coordinator(store).acquire_slot().unwrap(), Slot::new(1, 0));
    }

    #[test]
    fn checks_existence_before_claiming_listed_gap() {
        let store = Arc::new(TestStore {
            hidden: vec!["SNOWFLAKE:NODE:0:1".to_owned()],
            ..Default::default()
        });
        lease(&store.inner, 0, 0);

        assert_eq!(coordinator(store).acquire_slot().unwrap(), Slot::new(0, 2));
    }

    #[test]
    fn exhausted_store_fails_without_writing() {
        let store = Arc::new(TestStore::default());
        // includes legacy keys just past the encodable range
        for d in 0..=SLOTS_PER_FIELD {
            for w in 0..=SLOTS_PER_FIELD {
                lease(&store.inner, d, w);
            }
        }
        let coordinator = coordinator(store.clone());

        assert!(matches!(
            coordinator.acquire_slot(),
            Err(Error::SlotsExhausted { capacity: 32 })
        ));
        assert_eq!(store.writes(), 0);
        assert_eq!(coordinator.state(), SlotState::Unbound);
        assert!(matches!(coordinator.next_id(), Err(Error::Unbound)));
    }

    #[test]
    fn out_of_range_leases_do_not_block_allocation() {
        let store = Arc::new(TestStore::default());
        lease(&store.inner, 40, 0);
        lease(&store.inner, 0, 99);

        assert_eq!(coordinator(store).acquire_slot().unwrap(), Slot::new(0, 0));
    }

    #[test]
    fn acquire_is_idempotent() {
        let store = Arc::new(TestStore::default());
        let coordinator = coordinator(store.clone());
        let slot = coordinator.acquire_slot().unwrap();
        let calls = store.calls.load(Ordering::Relaxed);

        assert_eq!(coordinator.acquire_slot().unwrap(), slot);
        assert_eq!(store.calls.load(Ordering::Relaxed), calls);
        assert_eq!(store.writes(), 1);
    }

    #[test]
    fn unreachable_store_is_retried_then_reported() {
        let store = Arc::new(TestStore::default());
        store.set_down(true);
        let coordinator = coordinator(store.clone());

        assert!(matches!(
            coordinator.acquire_slot(),
            Err(Error::StoreUnavailable {
                operation: "list_keys",
                attempts: 3,
                ..
            })
        ));
        assert_eq!(store.calls.load(Ordering::Relaxed), 3);
        assert_eq!(coordinator.state(), SlotState::Unbound);

        // a later attempt succeeds once the store is back
        store.set_down(false);
        assert_eq!(coordinator.acquire_slot().unwrap(), Slot::new(0, 0));
    }

    #[test]
    fn single_attempt_policy_fails_fast() {
        let store = Arc::new(TestStore::default());
        store.set_down(true);
        let coordinator = SlotCoordinator::new(
            store.clone(),
            CoordinatorConfig {
                retry: RetryPolicy::no_retry(),
                ..Default::default()
            },
            SystemClock,
        )
        .unwrap();

        assert!(matches!(
            coordinator.acquire_slot(),
            Err(Error::StoreUnavailable { attempts: 1, .. })
        ));
        assert_eq!(store.calls.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn oversized_ttl_is_rejected_before_touching_the_store() {
        let store = Arc::new(TestStore::default());
        let result = SlotCoordinator::new(
            store.clone(),
            CoordinatorConfig {
                lease_ttl_hours: u64::MAX / 3600,
                ..Default::default()
            },
            SystemClock,
        );
        assert!(matches!(
            result,
            Err(Error::InvalidConfig {
                field: "lease_ttl_hours",
                ..
            })
        ));
        assert_eq!(store.calls.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn ids_require_a_slot() {
        let coordinator = coordinator(MemoryStore::new());
        assert!(matches!(coordinator.next_id(), Err(Error::Unbound)));
        assert!(coordinator.generator().is_none());

        let slot = coordinator.acquire_slot().unwrap();
        assert!(matches!(
            coordinator.try_next_id(),
            Ok(IdGenStatus::Ready { .. } | IdGenStatus::Pending { .. })
        ));
        let id = coordinator.next_id().unwrap();
        assert_eq!((id.datacenter_id(), id.worker_id()), (0, 0));
        assert_eq!(coordinator.generator().map(SlotflakeGenerator::slot), Some(slot));
        assert!(coordinator.next_i64().unwrap() > id.to_i64());
    }

    #[test]
    fn renew_while_unbound_touches_nothing() {
        let store = Arc::new(TestStore::default());
        let coordinator = coordinator(store.clone());
        assert!(!coordinator.renew_lease().unwrap());
        assert_eq!(store.calls.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn renew_extends_expiry_and_keeps_value() {
        let store = Arc::new(TestStore::default());
        let coordinator = coordinator(store.clone());
        coordinator.acquire_slot().unwrap();
        let before = store.inner.expires_at("SNOWFLAKE:NODE:0:0").unwrap();
        std::thread::sleep(Duration::from_millis(5));

        assert!(coordinator.renew_lease().unwrap());
        assert!(store.inner.expires_at("SNOWFLAKE:NODE:0:0").unwrap() > before);
        assert_eq!(
            store.inner.get("SNOWFLAKE:NODE:0:0").unwrap().as_deref(),
            Some("[0,0]")
        );
        assert_eq!(store.writes(), 1);
    }

    #[test]
    fn renew_failure_keeps_binding() {
        let store = Arc::new(TestStore::default());
        let coordinator = coordinator(store.clone());
        coordinator.acquire_slot().unwrap();

        store.set_down(true);
        assert!(matches!(coordinator.renew_lease(), Err(Error::Store(_))));
        assert!(coordinator.state().is_bound());
        assert!(coordinator.next_id().is_ok());
    }

    #[test]
    fn vanished_lease_is_detected_as_expired() {
        let store = Arc::new(TestStore::default());
        let coordinator = coordinator(store.clone());
        let slot = coordinator.acquire_slot().unwrap();
        store.inner.delete("SNOWFLAKE:NODE:0:0").unwrap();

        assert!(!coordinator.renew_lease().unwrap());
        assert_eq!(coordinator.state(), SlotState::Expired(slot));
        assert_eq!(coordinator.slot(), None);
        assert!(matches!(coordinator.next_id(), Err(Error::LeaseEnded { .. })));
        assert!(matches!(
            coordinator.acquire_slot(),
            Err(Error::LeaseEnded { .. })
        ));

        // someone else took the slot meanwhile; releasing must not delete it
        lease(&store.inner, 0, 0);
        assert!(!coordinator.release_slot().unwrap());
        assert_eq!(coordinator.state(), SlotState::Released(slot));
        assert!(store.inner.exists("SNOWFLAKE:NODE:0:0").unwrap());
    }

    #[test]
    fn release_frees_slot_for_others() {
        let store = Arc::new(MemoryStore::new());
        let first = coordinator(store.clone());
        let slot = first.acquire_slot().unwrap();

        assert!(first.release_slot().unwrap());
        assert_eq!(first.state(), SlotState::Released(slot));
        assert!(store.list_keys("SNOWFLAKE:NODE:").unwrap().is_empty());
        assert!(matches!(first.next_id(), Err(Error::LeaseEnded { .. })));
        assert!(!first.release_slot().unwrap());

        let second = coordinator(store);
        assert_eq!(second.acquire_slot().unwrap(), slot);
    }

    #[test]
    fn release_while_unbound_is_noop() {
        let store = Arc::new(TestStore::default());
        let coordinator = coordinator(store.clone());
        assert!(!coordinator.release_slot().unwrap());
        assert_eq!(coordinator.state(), SlotState::Unbound);
        assert_eq!(store.calls.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn release_with_store_down_still_releases_locally() {
        let store = Arc::new(TestStore::default());
        let coordinator = coordinator(store.clone());
        let slot = coordinator.acquire_slot().unwrap();

        store.set_down(true);
        assert!(matches!(coordinator.release_slot(), Err(Error::Store(_))));
        assert_eq!(coordinator.state(), SlotState::Released(slot));
        assert!(store.inner.exists("SNOWFLAKE:NODE:0:0").unwrap());
    }

    #[test]
    fn verify_detects_overwritten_lease() {
        let store = Arc::new(MemoryStore::new());
        let coordinator = coordinator(store.clone());
        assert!(matches!(coordinator.verify_lease(), Err(Error::Unbound)));

        coordinator.acquire_slot().unwrap();
        coordinator.verify_lease().unwrap();

        store
            .set_with_expiry("SNOWFLAKE:NODE:0:0", "[5,5]", HOUR)
            .unwrap();
        assert!(matches!(
            coordinator.verify_lease(),
            Err(Error::LeaseMismatch { found, .. }) if found == "[5,5]"
        ));

        store.delete("SNOWFLAKE:NODE:0:0").unwrap();
        assert!(matches!(
            coordinator.verify_lease(),
            Err(Error::LeaseMismatch { .. })
        ));
    }

    #[test]
    fn coordinators_sharing_a_store_get_distinct_slots() {
        let store = Arc::new(MemoryStore::new());
        let slots: Vec<Slot> = (0..40)
            .map(|_| {
                let c = coordinator(store.clone());
                c.acquire_slot().unwrap()
            })
            .collect();

        let unique: std::collections::BTreeSet<_> = slots.iter().copied().collect();
        assert_eq!(unique.len(), slots.len());
        assert_eq!(slots[31], Slot::new(0, 31));
        assert_eq!(slots[32], Slot::new(1, 0));
    }

    #[test]
    fn custom_key_space_and_epoch() {
        let store = Arc::new(MemoryStore::new());
        let config = CoordinatorConfig {
            key_prefix: "orders".to_owned(),
            key_subject: "gen".to_owned(),
            epoch_millis: crate::CUSTOM_EPOCH.as_millis() as u64,
            ..config()
        };
        let coordinator = SlotCoordinator::new(store.clone(), config, SystemClock).unwrap();
        coordinator.acquire_slot().unwrap();

        assert!(store.exists("ORDERS:GEN:0:0").unwrap());
        assert_eq!(coordinator.lease_key().as_deref(), Some("ORDERS:GEN:0:0"));

        let id = coordinator.next_id().unwrap();
        let minted = coordinator.decode_generation_time(id);
        let now = SystemClock.current_millis();
        assert!(minted <= now && now - minted < 5_000);
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let config = CoordinatorConfig {
            lease_ttl_hours: 0,
            ..config()
        };
        assert!(matches!(
            SlotCoordinator::new(MemoryStore::new(), config, SystemClock),
            Err(Error::InvalidConfig { .. })
        ));
    }
}
