use core::time::Duration;
use std::sync::Arc;

/// Errors raised by a [`CoordinationStore`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum StoreError {
    /// The store could not be reached or refused the request.
    #[error("store unavailable: {reason}")]
    Unavailable { reason: String },

    /// A local I/O failure, e.g. in a directory-backed store.
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An entry exists but could not be decoded.
    #[error("corrupt entry `{key}`: {reason}")]
    Corrupt { key: String, reason: String },

    /// The expiry `ttl` from now cannot be represented by the store's clock.
    #[error("expiry of {}s from now is out of range", ttl.as_secs())]
    TtlOutOfRange { ttl: Duration },
}

/// The primitives slot coordination needs from a shared key/value store with
/// expiring entries.
///
/// Implementations are shared by many processes; nothing here is
/// transactional, and callers must assume other writers interleave between
/// any two calls.
pub trait CoordinationStore: Send + Sync {
    /// Lists every live key starting with `prefix`.
    fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError>;

    /// Returns whether `key` currently holds a live entry.
    fn exists(&self, key: &str) -> Result<bool, StoreError>;

    /// Returns the value stored under `key`, if it is live.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Stores `value` under `key`, replacing any previous entry, expiring
    /// after `ttl`.
    fn set_with_expiry(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError>;

    /// Resets the expiry of `key` to `ttl` from now. Returns `false` if the
    /// key no longer exists.
    fn refresh_expiry(&self, key: &str, ttl: Duration) -> Result<bool, StoreError>;

    /// Deletes `key`. Returns `false` if it did not exist.
    fn delete(&self, key: &str) -> Result<bool, StoreError>;
}

macro_rules! forward_store {
    ($($ty:ty),*) => {$(
        impl<S: CoordinationStore + ?Sized> CoordinationStore for $ty {
            fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
                (**self).list_keys(prefix)
            }

            fn exists(&self, key: &str) -> Result<bool, StoreError> {
                (**self).exists(key)
            }

            fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
                (**self).get(key)
            }

            fn set_with_expiry(
                &self,
                key: &str,
                value: &str,
                ttl: Duration,
            ) -> Result<(), StoreError> {
                (**self).set_with_expiry(key, value, ttl)
            }

            fn refresh_expiry(&self, key: &str, ttl: Duration) -> Result<bool, StoreError> {
                (**self).refresh_expiry(key, ttl)
            }

            fn delete(&self, key: &str) -> Result<bool, StoreError> {
                (**self).delete(key)
            }
        }
    )*};
}

forward_store!(&S, Arc<S>, Box<S>);
