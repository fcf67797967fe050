//! Optional process-wide cache handle.
//!
//! Prefer building a [`TieredCache`] once and passing `Arc<TieredCache>` to
//! consumers. When a global is more convenient, initialise it here once;
//! every later initialisation returns the first instance, and accessors
//! fail with [`CacheError::Precondition`] until it exists.

use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::config::TieredCacheConfig;
use crate::error::{CacheError, Result};
use crate::remote::RemoteStore;
use crate::tiered::{L1Store, TieredCache};

static GLOBAL: OnceCell<Arc<TieredCache>> = OnceCell::const_new();

/// Connect using `config` unless a global cache already exists.
///
/// Concurrent callers wait for the first initialisation; if it fails the
/// next caller tries again.
pub async fn init_global(config: &TieredCacheConfig) -> Result<Arc<TieredCache>> {
    GLOBAL
        .get_or_try_init(|| async { TieredCache::connect(config).await.map(Arc::new) })
        .await
        .cloned()
}

/// Install an already-built cache unless one exists. Returns the winner,
/// which is `cache` only on the first call.
pub async fn install_global(cache: TieredCache) -> Arc<TieredCache> {
    let installed = GLOBAL
        .get_or_init(|| async move { Arc::new(cache) })
        .await;
    Arc::clone(installed)
}

/// The global cache.
pub fn global() -> Result<Arc<TieredCache>> {
    GLOBAL
        .get()
        .cloned()
        .ok_or_else(|| CacheError::precondition("global cache used before init_global/install_global"))
}

/// The global cache's L1 store.
pub fn global_l1() -> Result<&'static L1Store> {
    GLOBAL
        .get()
        .map(|cache| cache.l1())
        .ok_or_else(|| CacheError::precondition("global L1 used before init_global/install_global"))
}

/// The global cache's remote store.
pub fn global_remote() -> Result<Arc<dyn RemoteStore>> {
    GLOBAL
        .get()
        .map(|cache| Arc::clone(cache.remote()))
        .ok_or_else(|| {
            CacheError::precondition("global remote store used before init_global/install_global")
        })
}
