use std::sync::Arc;

use crate::{
    AtomicSlotflakeGenerator, CoordinationStore, LockSlotflakeGenerator, Result, SlotCoordinator,
    SlotflakeGenerator, SlotflakeId, TimeSource,
};

/// Assigns primary keys to new records.
///
/// A persistence layer calls [`Self::next_key`] once per inserted record
/// that does not already carry a key. Keys are positive `i64` values that
/// grow with time, so they fit a signed `BIGINT` column and keep B-tree
/// inserts mostly append-only.
///
/// ```
/// use std::sync::Arc;
/// use slotflake::{CoordinatorConfig, MemoryStore, PrimaryKeySource, SlotCoordinator, SystemClock};
///
/// struct Order {
///     id: Option<i64>,
/// }
///
/// fn insert(keys: &dyn PrimaryKeySource, order: &mut Order) -> slotflake::Result<()> {
///     if order.id.is_none() {
///         order.id = Some(keys.next_key()?);
///     }
///     Ok(())
/// }
///
/// let coordinator = SlotCoordinator::new(
///     Arc::new(MemoryStore::new()),
///     CoordinatorConfig::default(),
///     SystemClock,
/// )
/// .unwrap();
/// coordinator.acquire_slot().unwrap();
///
/// let mut order = Order { id: None };
/// insert(&coordinator, &mut order).unwrap();
/// assert!(order.id.unwrap() > 0);
/// ```
pub trait PrimaryKeySource: Send + Sync {
    /// Returns a fresh key.
    ///
    /// # Errors
    ///
    /// Whatever the underlying generator reports, e.g.
    /// [`Error::Unbound`](crate::Error::Unbound) before a slot is leased.
    fn next_key(&self) -> Result<i64>;
}

impl<T> PrimaryKeySource for LockSlotflakeGenerator<T>
where
    T: TimeSource + Send + Sync,
{
    fn next_key(&self) -> Result<i64> {
        self.next_id().map(SlotflakeId::to_i64)
    }
}

impl<T> PrimaryKeySource for AtomicSlotflakeGenerator<T>
where
    T: TimeSource + Send + Sync,
{
    fn next_key(&self) -> Result<i64> {
        self.next_id().map(SlotflakeId::to_i64)
    }
}

impl<S, T> PrimaryKeySource for SlotCoordinator<S, T>
where
    S: CoordinationStore,
    T: TimeSource + Send + Sync,
{
    fn next_key(&self) -> Result<i64> {
        self.next_i64()
    }
}

impl<K: PrimaryKeySource + ?Sized> PrimaryKeySource for Arc<K> {
    fn next_key(&self) -> Result<i64> {
        (**self).next_key()
    }
}
