//! In-process expiring key/value store (the L1 tier).
//!
//! ## Expiration
//!
//! Expiration is checked lazily on every read, so an expired entry is never
//! returned even if it is still physically present. A background sweeper
//! physically removes expired entries on a fixed interval to bound memory
//! growth; correctness never depends on when it runs.
//!
//! ## Locking
//!
//! The whole map sits behind a single reader/writer lock. Reads share the
//! lock, every mutation takes it exclusively, and compound operations
//! (`set_if_absent`, `replace`) hold it across the check and the write.

mod store;
mod sweeper;

pub use store::{Entry, Expiration, ExpiringStore};
