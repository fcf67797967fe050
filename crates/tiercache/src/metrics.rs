//! Cache metrics emitted through the `metrics` facade.
//!
//! Nothing is recorded unless the host application installs a recorder
//! (e.g. a Prometheus exporter).

use metrics::{counter, gauge};

/// Metric names as constants for consistency.
pub mod names {
    pub const CACHE_HITS_TOTAL: &str = "tiercache_hits_total";
    pub const CACHE_MISSES_TOTAL: &str = "tiercache_misses_total";
    pub const CACHE_BACKFILLS_TOTAL: &str = "tiercache_backfills_total";
    pub const L1_ENTRIES: &str = "tiercache_l1_entries";
}

/// Record a cache hit on `tier` ("L1" or "L2").
pub fn record_cache_hit(tier: &'static str) {
    counter!(names::CACHE_HITS_TOTAL, "tier" => tier).increment(1);
}

/// Record a miss in both tiers.
pub fn record_cache_miss() {
    counter!(names::CACHE_MISSES_TOTAL).increment(1);
}

/// Record an L2 value copied into L1.
pub fn record_backfill() {
    counter!(names::CACHE_BACKFILLS_TOTAL).increment(1);
}

/// Set the number of physically present L1 entries.
pub fn set_l1_entries(count: usize) {
    gauge!(names::L1_ENTRIES).set(count as f64);
}
