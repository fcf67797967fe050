use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tiered cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TieredCacheConfig {
    /// Redis (L2) connection settings
    #[serde(default)]
    pub redis: RedisConfig,

    /// Default L1 lifetime in seconds, used by writes that ask for the
    /// store default. Zero means such entries never expire.
    #[serde(default = "default_default_ttl_secs")]
    pub default_ttl_secs: u64,

    /// How often expired L1 entries are swept, in seconds. Zero disables
    /// background sweeping.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Namespace prepended to every key as `<prefix>:<key>`
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

fn default_default_ttl_secs() -> u64 {
    3600
}

fn default_sweep_interval_secs() -> u64 {
    300
}

fn default_prefix() -> String {
    "l2".to_string()
}

impl Default for TieredCacheConfig {
    fn default() -> Self {
        Self {
            redis: RedisConfig::default(),
            default_ttl_secs: default_default_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            prefix: default_prefix(),
        }
    }
}

impl TieredCacheConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.prefix.is_empty() {
            return Err("prefix must not be empty".into());
        }
        if self.prefix.contains(['*', '?', '[', ']']) {
            return Err("prefix must not contain glob characters (*, ?, [, ])".into());
        }
        if self.redis.url.is_empty() {
            return Err("redis.url must not be empty".into());
        }
        if self.redis.pool_size == 0 {
            return Err("redis.pool_size must be > 0".into());
        }
        if self.redis.timeout_ms == 0 {
            return Err("redis.timeout_ms must be > 0".into());
        }
        Ok(())
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

/// Redis connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Redis connection URL (e.g., "redis://:password@localhost:6379/0").
    /// Credentials and database index travel in the URL.
    #[serde(default = "default_redis_url")]
    pub url: String,

    /// Connection pool size
    #[serde(default = "default_redis_pool_size")]
    pub pool_size: usize,

    /// Connection timeout in milliseconds
    #[serde(default = "default_redis_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_redis_pool_size() -> usize {
    10
}

fn default_redis_timeout_ms() -> u64 {
    5000
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            pool_size: default_redis_pool_size(),
            timeout_ms: default_redis_timeout_ms(),
        }
    }
}

impl RedisConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

pub mod loader {
    use super::TieredCacheConfig;
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    /// Default config file looked up when no path is given.
    pub const DEFAULT_CONFIG_FILE: &str = "tiercache.toml";

    /// Load configuration from an optional TOML file plus environment
    /// overrides, e.g. `TIERCACHE__REDIS__URL=redis://cache:6379`.
    pub fn load_config(path: Option<&str>) -> Result<TieredCacheConfig, String> {
        load_from(path, Some(environment()))
    }

    /// `TIERCACHE__SECTION__KEY` overrides.
    pub(crate) fn environment() -> Environment {
        Environment::with_prefix("TIERCACHE")
            .try_parsing(true)
            .separator("__")
    }

    /// Merge the file (if any) and `env` on top of the defaults, then validate.
    pub(crate) fn load_from(
        path: Option<&str>,
        env: Option<Environment>,
    ) -> Result<TieredCacheConfig, String> {
        let mut builder = Config::builder();
        let pathbuf = PathBuf::from(path.unwrap_or(DEFAULT_CONFIG_FILE));
        if pathbuf.exists() {
            builder = builder.add_source(File::from(pathbuf));
        } else if path.is_some() {
            tracing::warn!(path = %pathbuf.display(), "Config file not found, using defaults");
        }
        if let Some(env) = env {
            builder = builder.add_source(env);
        }
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: TieredCacheConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        merged.validate()?;
        Ok(merged)
    }
}
