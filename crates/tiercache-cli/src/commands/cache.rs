use std::time::Duration;

use anyhow::{Context, Result};
use colored::Colorize;
use tiercache::{RemoteStore, TieredCache, derive_l1_ttl};

use crate::output::{format_duration, print_payload, print_success};

pub async fn ping(cache: &TieredCache) -> Result<()> {
    cache.remote().ping().await.context("Redis did not answer PING")?;
    print_success("Redis is reachable");
    Ok(())
}

pub async fn get(cache: &TieredCache, key: &str) -> Result<()> {
    match cache.get(key).await {
        Ok(value) => {
            print_payload(&value);
            Ok(())
        }
        Err(e) if e.is_not_found() => {
            anyhow::bail!("Key not found: {}", cache.namespaced(key))
        }
        Err(e) => Err(e).with_context(|| format!("Failed to read {}", cache.namespaced(key))),
    }
}

pub async fn set(cache: &TieredCache, key: &str, value: &str, ttl_secs: u64) -> Result<()> {
    let ttl = Duration::from_secs(ttl_secs);
    cache
        .set(key, value, ttl)
        .await
        .with_context(|| format!("Failed to write {}", cache.namespaced(key)))?;

    let lifetime = if ttl.is_zero() {
        "no expiration".to_string()
    } else {
        format!(
            "ttl {}, L1 ttl {}",
            format_duration(ttl),
            format_duration(derive_l1_ttl(ttl))
        )
    };
    print_success(&format!("Set {} ({lifetime})", cache.namespaced(key).cyan()));
    Ok(())
}

pub async fn del(cache: &TieredCache, key: &str) -> Result<()> {
    cache
        .delete(key)
        .await
        .with_context(|| format!("Failed to delete {}", cache.namespaced(key)))?;
    print_success(&format!("Deleted {}", cache.namespaced(key).cyan()));
    Ok(())
}

pub async fn flush(cache: &TieredCache) -> Result<()> {
    cache
        .flush()
        .await
        .with_context(|| format!("Failed to flush namespace {}", cache.prefix()))?;
    print_success(&format!("Flushed namespace {}", format!("{}:*", cache.prefix()).cyan()));
    Ok(())
}

pub fn derive(ttl_secs: u64) {
    let remote = Duration::from_secs(ttl_secs);
    let local = derive_l1_ttl(remote);
    println!(
        "{}: {}  →  {}: {}",
        "L2".cyan(),
        format_duration(remote),
        "L1".cyan(),
        format_duration(local)
    );
}
