//! Shared test fixtures: an in-memory `RemoteStore` with call counters and
//! failure injection, plus a recorder that keeps the last gauge values.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use tiercache::{CacheError, ExpiringStore, RemoteStore, Result, TieredCache};

#[derive(Default)]
pub struct CallCounts {
    pub set: AtomicUsize,
    pub get: AtomicUsize,
    pub ttl: AtomicUsize,
    pub del: AtomicUsize,
    pub scan: AtomicUsize,
}

impl CallCounts {
    pub fn total(&self) -> usize {
        self.set.load(Ordering::SeqCst)
            + self.get.load(Ordering::SeqCst)
            + self.ttl.load(Ordering::SeqCst)
            + self.del.load(Ordering::SeqCst)
            + self.scan.load(Ordering::SeqCst)
    }
}

/// Remote store double that keeps values in memory and honours TTLs.
#[derive(Default)]
pub struct MockRemote {
    items: Mutex<HashMap<String, (Vec<u8>, Option<Instant>)>>,
    pub calls: CallCounts,
    failing: AtomicBool,
}

impl MockRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make every subsequent call fail with `RemoteUnavailable`.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Write directly, bypassing counters (simulates another instance).
    pub fn put_raw(&self, key: &str, value: &[u8], ttl: Option<Duration>) {
        let expires_at = ttl.map(|ttl| Instant::now() + ttl);
        self.items
            .lock()
            .insert(key.to_string(), (value.to_vec(), expires_at));
    }

    /// Read directly, bypassing counters.
    pub fn get_raw(&self, key: &str) -> Option<Vec<u8>> {
        self.live(key).map(|(value, _)| value)
    }

    /// Remaining lifetime, bypassing counters.
    pub fn ttl_raw(&self, key: &str) -> Option<Duration> {
        self.live(key)
            .and_then(|(_, expires_at)| expires_at)
            .map(|at| at.saturating_duration_since(Instant::now()))
    }

    pub fn keys_raw(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.items.lock().keys().cloned().collect();
        keys.sort();
        keys
    }

    fn live(&self, key: &str) -> Option<(Vec<u8>, Option<Instant>)> {
        let items = self.items.lock();
        items
            .get(key)
            .filter(|(_, expires_at)| expires_at.is_none_or(|at| at > Instant::now()))
            .cloned()
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(CacheError::remote("connection refused"));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for MockRemote {
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        self.calls.set.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.put_raw(key, value, (!ttl.is_zero()).then_some(ttl));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        self.calls.get.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.get_raw(key).ok_or_else(|| CacheError::not_found(key))
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>> {
        self.calls.ttl.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.ttl_raw(key).filter(|remaining| !remaining.is_zero()))
    }

    async fn del(&self, keys: &[String]) -> Result<u64> {
        self.calls.del.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let mut items = self.items.lock();
        Ok(keys.iter().filter(|key| items.remove(*key).is_some()).count() as u64)
    }

    async fn keys_by_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        self.calls.scan.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self
            .keys_raw()
            .into_iter()
            .filter(|key| key.starts_with(prefix))
            .collect())
    }

    async fn ping(&self) -> Result<()> {
        self.check()
    }
}

/// Tiered cache over a fresh mock remote, no sweeper, prefix "l2".
pub fn cache_with_mock() -> (TieredCache, Arc<MockRemote>) {
    let remote = MockRemote::new();
    let l1 = ExpiringStore::new(Duration::from_secs(3600), Duration::ZERO);
    let cache = TieredCache::new(l1, remote.clone(), "l2");
    (cache, remote)
}

pub fn mins(m: u64) -> Duration {
    Duration::from_secs(m * 60)
}

/// Metrics recorder that remembers the latest value of every gauge and
/// ignores counters and histograms.
#[derive(Default)]
pub struct GaugeRecorder {
    gauges: Mutex<HashMap<String, Arc<GaugeCell>>>,
}

#[derive(Default)]
pub struct GaugeCell(std::sync::atomic::AtomicU64);

impl GaugeCell {
    fn load(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::SeqCst))
    }

    fn store(&self, value: f64) {
        self.0.store(value.to_bits(), Ordering::SeqCst);
    }
}

impl metrics::GaugeFn for GaugeCell {
    fn increment(&self, value: f64) {
        self.store(self.load() + value);
    }

    fn decrement(&self, value: f64) {
        self.store(self.load() - value);
    }

    fn set(&self, value: f64) {
        self.store(value);
    }
}

impl GaugeRecorder {
    pub fn gauge(&self, name: &str) -> Option<f64> {
        self.gauges.lock().get(name).map(|cell| cell.load())
    }
}

impl metrics::Recorder for GaugeRecorder {
    fn describe_counter(
        &self,
        _: metrics::KeyName,
        _: Option<metrics::Unit>,
        _: metrics::SharedString,
    ) {
    }

    fn describe_gauge(
        &self,
        _: metrics::KeyName,
        _: Option<metrics::Unit>,
        _: metrics::SharedString,
    ) {
    }

    fn describe_histogram(
        &self,
        _: metrics::KeyName,
        _: Option<metrics::Unit>,
        _: metrics::SharedString,
    ) {
    }

    fn register_counter(&self, _: &metrics::Key, _: &metrics::Metadata<'_>) -> metrics::Counter {
        metrics::Counter::noop()
    }

    fn register_gauge(&self, key: &metrics::Key, _: &metrics::Metadata<'_>) -> metrics::Gauge {
        let cell = Arc::clone(self.gauges.lock().entry(key.name().to_string()).or_default());
        metrics::Gauge::from_arc(cell)
    }

    fn register_histogram(
        &self,
        _: &metrics::Key,
        _: &metrics::Metadata<'_>,
    ) -> metrics::Histogram {
        metrics::Histogram::noop()
    }
}
