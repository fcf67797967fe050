//! Two-tier cache for horizontally scaled services.
//!
//! ## Architecture
//!
//! - **L1 ([`ExpiringStore`])**: in-process map with per-entry expiration and
//!   a background sweeper, microsecond latency, per-instance
//! - **L2 ([`RemoteStore`], Redis)**: shared, persistent, authoritative for
//!   expiration
//!
//! Reads are served from L1 when possible and backfilled from L2 on a miss.
//! Writes go to L2 first and only then to L1. L1 copies always live shorter
//! than their L2 counterparts (see [`derive_l1_ttl`]), which bounds how long
//! one instance can serve a value another instance already replaced.

pub mod config;
pub mod error;
pub mod global;
pub mod memory;
pub mod metrics;
pub mod remote;
pub mod tiered;

pub use self::config::{RedisConfig, TieredCacheConfig};
pub use self::error::{CacheError, ErrorCategory, Result};
pub use self::global::{global, global_l1, global_remote, init_global, install_global};
pub use self::memory::{Entry, Expiration, ExpiringStore};
pub use self::remote::{RedisStore, RemoteStore};
pub use self::tiered::{L1Store, TieredCache, TieredStats, derive_l1_ttl};
