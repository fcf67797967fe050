use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

use super::sweeper::Sweeper;
use crate::error::{CacheError, Result};

/// Lifetime requested for a single write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Expiration {
    /// Use the store's default lifetime.
    #[default]
    Default,
    /// Never expire.
    Never,
    /// Expire after the given duration. A zero duration means `Default`.
    After(Duration),
}

impl From<Duration> for Expiration {
    fn from(ttl: Duration) -> Self {
        Self::After(ttl)
    }
}

/// A stored value with its absolute expiration instant.
#[derive(Clone, Debug)]
pub struct Entry<V> {
    pub value: V,
    /// `None` means the entry never expires.
    pub expires_at: Option<Instant>,
}

impl<V> Entry<V> {
    /// Check if this entry has expired.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    #[inline]
    fn is_expired_at(&self, now: Instant) -> bool {
        matches!(self.expires_at, Some(at) if now > at)
    }
}

/// State shared between a store handle and its sweeper task.
pub(crate) struct Inner<V> {
    default_ttl: Duration,
    items: RwLock<HashMap<String, Entry<V>>>,
}

impl<V> Inner<V> {
    /// Remove every entry that is expired at the instant of the scan.
    pub(crate) fn delete_expired(&self) -> usize {
        let now = Instant::now();
        let mut items = self.items.write();
        let before = items.len();
        items.retain(|_, entry| !entry.is_expired_at(now));
        before - items.len()
    }

    fn expires_at(&self, ttl: Expiration) -> Option<Instant> {
        let ttl = match ttl {
            Expiration::Never => return None,
            Expiration::Default => self.default_ttl,
            Expiration::After(d) if d.is_zero() => self.default_ttl,
            Expiration::After(d) => d,
        };
        if ttl.is_zero() {
            return None;
        }
        Instant::now().checked_add(ttl)
    }

    /// Live lookup without taking the lock; callers hold it.
    fn live<'a>(items: &'a HashMap<String, Entry<V>>, key: &str) -> Option<&'a Entry<V>> {
        items.get(key).filter(|entry| !entry.is_expired())
    }
}

/// Thread-safe in-memory key/value store with per-entry expiration.
///
/// Cloneable values are returned by copy; wrap large payloads in `Arc` to
/// keep hits cheap.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use tiercache::memory::{Expiration, ExpiringStore};
///
/// let store = ExpiringStore::new(Duration::from_secs(60), Duration::ZERO);
/// store.set("greeting", "hello".to_string(), Expiration::Default);
/// assert_eq!(store.get("greeting").as_deref(), Some("hello"));
/// ```
pub struct ExpiringStore<V> {
    inner: Arc<Inner<V>>,
    sweeper: Option<Sweeper>,
}

impl<V> ExpiringStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Create an empty store.
    ///
    /// # Arguments
    ///
    /// * `default_ttl` - Lifetime for writes using [`Expiration::Default`].
    ///   Zero means such entries never expire.
    /// * `sweep_interval` - How often expired entries are physically
    ///   removed. Zero disables the sweeper.
    pub fn new(default_ttl: Duration, sweep_interval: Duration) -> Self {
        Self::from_items(default_ttl, sweep_interval, HashMap::new())
    }

    /// Create a store pre-populated with `items`.
    pub fn from_items(
        default_ttl: Duration,
        sweep_interval: Duration,
        items: HashMap<String, Entry<V>>,
    ) -> Self {
        let inner = Arc::new(Inner {
            default_ttl,
            items: RwLock::new(items),
        });

        let sweeper = if sweep_interval.is_zero() {
            None
        } else {
            Sweeper::spawn(Arc::downgrade(&inner), sweep_interval)
        };

        Self { inner, sweeper }
    }

    /// Insert or overwrite `key`.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: impl Into<Expiration>) {
        let expires_at = self.inner.expires_at(ttl.into());
        self.inner
            .items
            .write()
            .insert(key.into(), Entry { value, expires_at });
    }

    /// Insert or overwrite `key` using the default lifetime.
    pub fn set_default(&self, key: impl Into<String>, value: V) {
        self.set(key, value, Expiration::Default);
    }

    /// Insert `key` only if it has no live entry.
    ///
    /// Fails with [`CacheError::AlreadyExists`] otherwise. The check and the
    /// write happen under one exclusive lock.
    pub fn set_if_absent(
        &self,
        key: impl Into<String>,
        value: V,
        ttl: impl Into<Expiration>,
    ) -> Result<()> {
        let key = key.into();
        let expires_at = self.inner.expires_at(ttl.into());

        let mut items = self.inner.items.write();
        if Inner::live(&items, &key).is_some() {
            return Err(CacheError::already_exists(key));
        }
        items.insert(key, Entry { value, expires_at });
        Ok(())
    }

    /// Overwrite `key` only if it has a live entry.
    ///
    /// Fails with [`CacheError::NotFound`] otherwise and creates nothing.
    pub fn replace(
        &self,
        key: impl Into<String>,
        value: V,
        ttl: impl Into<Expiration>,
    ) -> Result<()> {
        let key = key.into();
        let expires_at = self.inner.expires_at(ttl.into());

        let mut items = self.inner.items.write();
        if Inner::live(&items, &key).is_none() {
            return Err(CacheError::not_found(key));
        }
        items.insert(key, Entry { value, expires_at });
        Ok(())
    }

    /// Get a live value. Expired entries are reported as missing but are
    /// left in place for the sweeper.
    pub fn get(&self, key: &str) -> Option<V> {
        let items = self.inner.items.read();
        Inner::live(&items, key).map(|entry| entry.value.clone())
    }

    /// Get a live value together with its expiration instant.
    pub fn get_with_expiration(&self, key: &str) -> Option<(V, Option<Instant>)> {
        let items = self.inner.items.read();
        Inner::live(&items, key).map(|entry| (entry.value.clone(), entry.expires_at))
    }

    /// Remove `key` if present.
    pub fn delete(&self, key: &str) {
        self.inner.items.write().remove(key);
    }

    /// Remove every expired entry. Returns the number of entries removed.
    pub fn delete_expired(&self) -> usize {
        self.inner.delete_expired()
    }

    /// Snapshot of all live entries.
    pub fn items(&self) -> HashMap<String, Entry<V>> {
        let now = Instant::now();
        self.inner
            .items
            .read()
            .iter()
            .filter(|(_, entry)| !entry.is_expired_at(now))
            .map(|(key, entry)| (key.clone(), entry.clone()))
            .collect()
    }

    /// Number of physically present entries, including expired ones the
    /// sweeper has not reached yet.
    pub fn count(&self) -> usize {
        self.inner.items.read().len()
    }

    /// Drop every entry.
    pub fn flush(&self) {
        let old = std::mem::take(&mut *self.inner.items.write());
        drop(old);
    }

    pub fn default_ttl(&self) -> Duration {
        self.inner.default_ttl
    }

    /// Whether a sweeper task is currently running for this store.
    pub fn is_sweeping(&self) -> bool {
        self.sweeper.as_ref().is_some_and(Sweeper::is_running)
    }

    /// Stop the background sweeper. The store stays usable; expired entries
    /// are then only removed by explicit [`delete_expired`](Self::delete_expired)
    /// calls. Dropping the store has the same effect.
    pub fn shutdown(&self) {
        if let Some(sweeper) = &self.sweeper {
            sweeper.stop();
        }
    }
}

impl<V> std::fmt::Debug for ExpiringStore<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpiringStore")
            .field("default_ttl", &self.inner.default_ttl)
            .field("entries", &self.inner.items.read().len())
            .field("sweeper", &self.sweeper.is_some())
            .finish()
    }
}
