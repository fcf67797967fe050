//! Remote (L2) store abstraction.
//!
//! The coordinator only needs a small capability set from the shared store,
//! so it talks to it through [`RemoteStore`]. [`RedisStore`] is the
//! production implementation; tests plug in in-memory fakes.

pub mod redis;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

pub use self::redis::RedisStore;

/// Capability set the tiered cache consumes from the shared store.
///
/// Values are opaque byte payloads. Every failure is reported as
/// [`CacheError::RemoteUnavailable`](crate::CacheError::RemoteUnavailable),
/// except a missing key on [`get`](RemoteStore::get), which is
/// [`CacheError::NotFound`](crate::CacheError::NotFound).
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Store `value` under `key`. A zero `ttl` stores without expiration.
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()>;

    /// Fetch the value stored under `key`.
    async fn get(&self, key: &str) -> Result<Vec<u8>>;

    /// Remaining lifetime of `key`.
    ///
    /// Returns `None` when the key has no expiration, does not exist, or has
    /// already expired.
    async fn ttl(&self, key: &str) -> Result<Option<Duration>>;

    /// Delete `keys`, returning how many existed.
    async fn del(&self, keys: &[String]) -> Result<u64>;

    /// Enumerate every key starting with the literal `prefix`.
    async fn keys_by_prefix(&self, prefix: &str) -> Result<Vec<String>>;

    /// Liveness check.
    async fn ping(&self) -> Result<()>;

    /// Delete every key under each of `prefixes`.
    ///
    /// Enumerates, then deletes; keys written between the two steps survive.
    async fn delete_by_prefix(&self, prefixes: &[&str]) -> Result<u64> {
        let mut deleted = 0;
        for prefix in prefixes {
            let keys = self.keys_by_prefix(prefix).await?;
            if keys.is_empty() {
                continue;
            }
            deleted += self.del(&keys).await?;
        }
        Ok(deleted)
    }
}
