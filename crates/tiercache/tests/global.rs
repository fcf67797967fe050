//! Process-wide handle tests.
//!
//! Kept in their own test binary because the global is set once per process.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::MockRemote;
use tiercache::{
    CacheError, ExpiringStore, RemoteStore, TieredCache, global, global_l1, global_remote,
    install_global,
};

fn build(prefix: &str) -> (TieredCache, Arc<MockRemote>) {
    let remote = MockRemote::new();
    let l1 = ExpiringStore::new(Duration::from_secs(60), Duration::ZERO);
    (TieredCache::new(l1, remote.clone(), prefix), remote)
}

#[tokio::test]
async fn test_global_lifecycle() {
    // Before initialisation every accessor reports a precondition failure
    assert!(matches!(global(), Err(CacheError::Precondition(_))));
    assert!(matches!(global_l1(), Err(CacheError::Precondition(_))));
    assert!(matches!(global_remote(), Err(CacheError::Precondition(_))));

    let (first, remote) = build("first");
    let installed = install_global(first).await;
    assert_eq!(installed.prefix(), "first");

    // A second construction returns the existing instance
    let (second, _) = build("second");
    let again = install_global(second).await;
    assert!(Arc::ptr_eq(&installed, &again));
    assert_eq!(again.prefix(), "first");

    let handle = global().unwrap();
    assert!(Arc::ptr_eq(&installed, &handle));

    handle.set("k", "v", Duration::from_secs(60)).await.unwrap();
    assert!(global_l1().unwrap().get("first:k").is_some());
    assert_eq!(
        global_remote().unwrap().get("first:k").await.unwrap(),
        b"v".to_vec()
    );
    assert!(remote.get_raw("first:k").is_some());
}
