//! Redis-backed remote store on a deadpool connection pool.

use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::{Pool, PoolConfig, Runtime, Timeouts};
use redis::AsyncCommands;

use super::RemoteStore;
use crate::config::RedisConfig;
use crate::error::{CacheError, Result};

/// Keys requested per `SCAN` round trip.
const SCAN_BATCH: usize = 500;

/// [`RemoteStore`] implementation backed by Redis.
#[derive(Clone, Debug)]
pub struct RedisStore {
    pool: Pool,
}

impl RedisStore {
    /// Wrap an existing pool. No liveness check is performed.
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Build a pool from `config` and verify the server answers `PING`.
    ///
    /// An unreachable server is an error; callers are expected to treat it
    /// as fatal at startup rather than retry.
    pub async fn connect(config: &RedisConfig) -> Result<Self> {
        tracing::info!(url = %config.url, pool_size = config.pool_size, "Connecting to Redis");

        let timeout = Some(config.timeout());
        let mut pool_config = PoolConfig::new(config.pool_size);
        pool_config.timeouts = Timeouts {
            wait: timeout,
            create: timeout,
            recycle: timeout,
        };

        let mut redis_config = deadpool_redis::Config::from_url(&config.url);
        redis_config.pool = Some(pool_config);

        let pool = redis_config.create_pool(Some(Runtime::Tokio1))?;
        let store = Self::new(pool);

        if let Err(e) = store.ping().await {
            tracing::error!(url = %config.url, error = %e, "Redis liveness check failed");
            return Err(e);
        }

        tracing::info!("Connected to Redis");
        Ok(store)
    }

    /// Check if Redis is reachable (for health checks).
    pub async fn is_available(&self) -> bool {
        self.ping().await.is_ok()
    }

    async fn conn(&self) -> Result<deadpool_redis::Connection> {
        Ok(self.pool.get().await?)
    }
}

#[async_trait]
impl RemoteStore for RedisStore {
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        let mut conn = self.conn().await?;
        if ttl.is_zero() {
            conn.set::<_, _, ()>(key, value).await?;
        } else {
            let millis = expiry_millis(ttl)?;
            conn.pset_ex::<_, _, ()>(key, value, millis).await?;
        }
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let mut conn = self.conn().await?;
        conn.get::<_, Option<Vec<u8>>>(key)
            .await?
            .ok_or_else(|| CacheError::not_found(key))
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>> {
        let mut conn = self.conn().await?;
        // -1: no expiration, -2: missing key
        let millis: i64 = conn.pttl(key).await?;
        Ok((millis > 0).then(|| Duration::from_millis(millis as u64)))
    }

    async fn del(&self, keys: &[String]) -> Result<u64> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn().await?;
        Ok(conn.del::<_, u64>(keys).await?)
    }

    async fn keys_by_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let pattern = format!("{}*", escape_glob(prefix));
        let mut conn = self.conn().await?;
        let mut keys = Vec::new();
        let mut cursor: u64 = 0;

        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await?;
            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }

        // SCAN may return a key more than once
        keys.sort_unstable();
        keys.dedup();
        tracing::debug!(prefix = %prefix, count = keys.len(), "Scanned keys by prefix");
        Ok(keys)
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.conn().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

/// Millisecond lifetime for `PSETEX`.
///
/// Sub-millisecond lifetimes round up so they still expire. Lifetimes past
/// what Redis can store are rejected instead of truncated, so the key can
/// never end up living shorter than the caller asked for.
fn expiry_millis(ttl: Duration) -> Result<u64> {
    let millis = ttl.as_millis().max(1);
    i64::try_from(millis)
        .map(i64::unsigned_abs)
        .map_err(|_| {
            CacheError::precondition(format!(
                "ttl of {}s exceeds the Redis expiry range",
                ttl.as_secs()
            ))
        })
}

/// Escape Redis glob metacharacters so `prefix` matches literally.
fn escape_glob(prefix: &str) -> String {
    let mut escaped = String::with_capacity(prefix.len());
    for c in prefix.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\' | '^') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_millis_rounds_up_sub_millisecond() {
        assert_eq!(expiry_millis(Duration::from_micros(10)).unwrap(), 1);
        assert_eq!(expiry_millis(Duration::from_millis(1500)).unwrap(), 1500);
    }

    #[test]
    fn test_expiry_millis_rejects_out_of_range() {
        let max = Duration::from_millis(i64::MAX as u64);
        assert_eq!(expiry_millis(max).unwrap(), i64::MAX as u64);

        let over = Duration::from_millis(i64::MAX as u64 + 1);
        assert!(matches!(
            expiry_millis(over),
            Err(CacheError::Precondition(_))
        ));

        // 18446744073709552000 ms would wrap to 384 ms as a u64 cast
        let wrapping = Duration::from_secs(18_446_744_073_709_552);
        assert!(matches!(
            expiry_millis(wrapping),
            Err(CacheError::Precondition(_))
        ));
    }

    #[test]
    fn test_escape_glob_plain_prefix() {
        assert_eq!(escape_glob("l2:"), "l2:");
        assert_eq!(escape_glob("app:user:"), "app:user:");
    }

    #[test]
    fn test_escape_glob_metacharacters() {
        assert_eq!(escape_glob("a*b"), "a\\*b");
        assert_eq!(escape_glob("q?[x]"), "q\\?\\[x\\]");
        assert_eq!(escape_glob("back\\slash"), "back\\\\slash");
    }
}
