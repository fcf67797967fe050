//! Two-tier cache coordinator: L1 (in-process) in front of L2 (remote).
//!
//! ## Lookup Order
//!
//! ```text
//! get(key) → L1 (ExpiringStore) → L2 (RemoteStore)
//!                 ↓                    ↓
//!             hit: return         hit: backfill L1 with a derived TTL
//! ```
//!
//! ## Write Ordering
//!
//! Writes go to L2 first. L1 is only written once L2 has accepted the value,
//! so L1 never holds something the shared store rejected.
//!
//! ## L1 Lifetimes
//!
//! An L1 copy always lives for at most as long as its L2 counterpart and
//! never longer than 30 minutes; see [`derive_l1_ttl`]. Keeping L1 short
//! matters when callers build `SET NX` style locks on the same namespace: a
//! long-lived L1 copy would keep reporting a lock as held after it was
//! released remotely.
//!
//! Cancellation and timeouts belong to the remote store: dropping a pending
//! future abandons the remote call, and pool timeouts come from
//! [`RedisConfig`](crate::config::RedisConfig).

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::TieredCacheConfig;
use crate::error::{CacheError, Result};
use crate::memory::ExpiringStore;
use crate::metrics;
use crate::remote::{RedisStore, RemoteStore};

const MINUTE: u64 = 60;

/// Derive the L1 lifetime for a value whose L2 lifetime is `remote_ttl`.
///
/// | L2 lifetime   | L1 lifetime |
/// |---------------|-------------|
/// | ≥ 35 min      | 30 min      |
/// | [15, 35) min  | 10 min      |
/// | [10, 15) min  | 5 min       |
/// | [5, 10) min   | 1 min       |
/// | < 5 min       | unchanged   |
pub fn derive_l1_ttl(remote_ttl: Duration) -> Duration {
    let minutes = |m: u64| Duration::from_secs(m * MINUTE);

    if remote_ttl >= minutes(35) {
        minutes(30)
    } else if remote_ttl >= minutes(15) {
        minutes(10)
    } else if remote_ttl >= minutes(10) {
        minutes(5)
    } else if remote_ttl >= minutes(5) {
        minutes(1)
    } else {
        remote_ttl
    }
}

/// L1 values are shared so hits are a reference-count bump.
pub type L1Store = ExpiringStore<Arc<Vec<u8>>>;

/// Read-through / write-through cache over an [`ExpiringStore`] and a
/// [`RemoteStore`], with every key namespaced as `<prefix>:<key>`.
///
/// Construct it once and share it (`Arc<TieredCache>`) with every consumer.
/// [`crate::global`] offers a process-wide handle on top of that.
pub struct TieredCache {
    l1: L1Store,
    remote: Arc<dyn RemoteStore>,
    prefix: String,
    l1_hits: AtomicU64,
    l2_hits: AtomicU64,
    misses: AtomicU64,
}

impl TieredCache {
    /// Assemble a cache from already-built tiers.
    pub fn new(l1: L1Store, remote: Arc<dyn RemoteStore>, prefix: impl Into<String>) -> Self {
        Self {
            l1,
            remote,
            prefix: prefix.into(),
            l1_hits: AtomicU64::new(0),
            l2_hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Connect to Redis and build the L1 store from `config`.
    ///
    /// Fails if the configuration is invalid or Redis does not answer the
    /// liveness check.
    pub async fn connect(config: &TieredCacheConfig) -> Result<Self> {
        config.validate().map_err(CacheError::configuration)?;

        let remote = RedisStore::connect(&config.redis).await?;
        let l1 = ExpiringStore::new(config.default_ttl(), config.sweep_interval());

        tracing::info!(
            prefix = %config.prefix,
            default_ttl_secs = config.default_ttl_secs,
            sweep_interval_secs = config.sweep_interval_secs,
            "Tiered cache ready"
        );

        Ok(Self::new(l1, Arc::new(remote), config.prefix.clone()))
    }

    pub fn l1(&self) -> &L1Store {
        &self.l1
    }

    pub fn remote(&self) -> &Arc<dyn RemoteStore> {
        &self.remote
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Full key as stored in both tiers.
    #[inline]
    pub fn namespaced(&self, key: &str) -> String {
        format!("{}:{key}", self.prefix)
    }

    /// Write `value` to L2 with `ttl`, then to L1 with the derived TTL.
    ///
    /// A zero `ttl` stores without expiration in L2; the L1 copy then uses
    /// the store default. If the L2 write fails, L1 is left untouched and
    /// the error is returned.
    pub async fn set(&self, key: &str, value: impl Into<Vec<u8>>, ttl: Duration) -> Result<()> {
        let key = self.namespaced(key);
        let value = value.into();

        if let Err(e) = self.remote.set(&key, &value, ttl).await {
            tracing::warn!(key = %key, error = %e, "Remote SET failed, L1 not written");
            return Err(e);
        }

        let l1_ttl = derive_l1_ttl(ttl);
        self.l1.set(key.as_str(), Arc::new(value), l1_ttl);
        metrics::set_l1_entries(self.l1.count());

        tracing::debug!(
            key = %key,
            ttl_ms = ttl.as_millis() as u64,
            l1_ttl_ms = l1_ttl.as_millis() as u64,
            "cache set (L2+L1)"
        );
        Ok(())
    }

    /// Read `key`, preferring L1.
    ///
    /// On an L1 miss the value is read from L2 and, when L2 reports a
    /// positive remaining lifetime, copied into L1. A missing key yields
    /// [`CacheError::NotFound`]; L2 failures are returned as-is.
    pub async fn get(&self, key: &str) -> Result<Arc<Vec<u8>>> {
        let key = self.namespaced(key);

        if let Some(value) = self.l1.get(&key) {
            tracing::debug!(key = %key, "cache hit (L1)");
            self.l1_hits.fetch_add(1, Ordering::Relaxed);
            metrics::record_cache_hit("L1");
            return Ok(value);
        }

        let value = match self.remote.get(&key).await {
            Ok(value) => Arc::new(value),
            Err(e) => {
                if e.is_not_found() {
                    tracing::debug!(key = %key, "cache miss");
                    self.misses.fetch_add(1, Ordering::Relaxed);
                    metrics::record_cache_miss();
                } else {
                    tracing::warn!(key = %key, error = %e, "Remote GET failed");
                }
                return Err(e);
            }
        };

        tracing::debug!(key = %key, "cache hit (L2)");
        self.l2_hits.fetch_add(1, Ordering::Relaxed);
        metrics::record_cache_hit("L2");

        match self.remote.ttl(&key).await {
            Ok(Some(remaining)) => {
                let l1_ttl = derive_l1_ttl(remaining);
                self.l1.set(key.as_str(), Arc::clone(&value), l1_ttl);
                metrics::record_backfill();
                metrics::set_l1_entries(self.l1.count());
                tracing::debug!(
                    key = %key,
                    remaining_ms = remaining.as_millis() as u64,
                    l1_ttl_ms = l1_ttl.as_millis() as u64,
                    "backfilled L1"
                );
            }
            Ok(None) => {
                tracing::debug!(key = %key, "no remote TTL, L1 not backfilled");
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Remote TTL failed, L1 not backfilled");
            }
        }

        Ok(value)
    }

    /// Remove `key` from L1, then from L2. Only the L2 result is reported.
    pub async fn delete(&self, key: &str) -> Result<()> {
        let key = self.namespaced(key);
        self.l1.delete(&key);
        metrics::set_l1_entries(self.l1.count());

        self.remote.del(std::slice::from_ref(&key)).await?;
        tracing::debug!(key = %key, "cache deleted (L1+L2)");
        Ok(())
    }

    /// Clear L1 entirely and delete every L2 key under `<prefix>:`.
    ///
    /// The L2 side enumerates then deletes, so it is not atomic: a key
    /// written concurrently may survive.
    pub async fn flush(&self) -> Result<()> {
        self.l1.flush();
        metrics::set_l1_entries(0);

        let scope = format!("{}:", self.prefix);
        let deleted = self.remote.delete_by_prefix(&[scope.as_str()]).await?;
        tracing::info!(prefix = %self.prefix, deleted, "cache flushed (L1+L2)");
        Ok(())
    }

    /// Serialize `value` as MessagePack and [`set`](Self::set) it.
    pub async fn set_value<T>(&self, key: &str, value: &T, ttl: Duration) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let bytes = rmp_serde::to_vec(value)?;
        self.set(key, bytes, ttl).await
    }

    /// [`get`](Self::get) a value and decode it from MessagePack.
    pub async fn get_value<T>(&self, key: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let bytes = self.get(key).await?;
        Ok(rmp_serde::from_slice(&bytes)?)
    }

    /// Stop the L1 sweeper. Dropping the cache does the same.
    pub fn shutdown(&self) {
        self.l1.shutdown();
    }

    /// Get cache statistics.
    pub fn stats(&self) -> TieredStats {
        TieredStats {
            l1_entries: self.l1.count(),
            l1_hits: self.l1_hits.load(Ordering::Relaxed),
            l2_hits: self.l2_hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for TieredCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TieredCache")
            .field("prefix", &self.prefix)
            .field("l1", &self.l1)
            .finish_non_exhaustive()
    }
}

/// Tiered cache statistics.
#[derive(Debug, Clone, Default)]
pub struct TieredStats {
    /// Physically present L1 entries (may include unswept expired ones).
    pub l1_entries: usize,
    /// Reads served from L1.
    pub l1_hits: u64,
    /// Reads served from L2 after an L1 miss.
    pub l2_hits: u64,
    /// Reads that found the key in neither tier.
    pub misses: u64,
}

impl TieredStats {
    /// Calculate hit rate (either tier) as a percentage.
    pub fn hit_rate(&self) -> f64 {
        let hits = self.l1_hits + self.l2_hits;
        let total = hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (hits as f64 / total as f64) * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mins(m: u64) -> Duration {
        Duration::from_secs(m * 60)
    }

    fn mins_secs(m: u64, s: u64) -> Duration {
        Duration::from_secs(m * 60 + s)
    }

    #[test]
    fn test_derive_boundaries() {
        assert_eq!(derive_l1_ttl(mins(35)), mins(30));
        assert_eq!(derive_l1_ttl(mins_secs(34, 59)), mins(10));
        assert_eq!(derive_l1_ttl(mins(15)), mins(10));
        assert_eq!(derive_l1_ttl(mins_secs(14, 59)), mins(5));
        assert_eq!(derive_l1_ttl(mins(10)), mins(5));
        assert_eq!(derive_l1_ttl(mins_secs(9, 59)), mins(1));
        assert_eq!(derive_l1_ttl(mins(5)), mins(1));
        assert_eq!(derive_l1_ttl(mins_secs(4, 59)), mins_secs(4, 59));
    }

    #[test]
    fn test_derive_never_exceeds_remote() {
        for secs in [0, 1, 59, 299, 300, 600, 900, 2100, 86_400] {
            let remote = Duration::from_secs(secs);
            assert!(derive_l1_ttl(remote) <= remote, "remote ttl {secs}s");
        }
        assert_eq!(derive_l1_ttl(Duration::from_secs(86_400 * 30)), mins(30));
        assert_eq!(derive_l1_ttl(Duration::ZERO), Duration::ZERO);
    }

    #[test]
    fn test_hit_rate_calculation() {
        let stats = TieredStats {
            l1_entries: 3,
            l1_hits: 60,
            l2_hits: 15,
            misses: 25,
        };
        assert!((stats.hit_rate() - 75.0).abs() < 0.001);
        assert!((TieredStats::default().hit_rate() - 0.0).abs() < 0.001);
    }
}
