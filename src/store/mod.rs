//! Key-value storage with expiry.
//!
//! Both the fingerprint cache and the usage counters sit on a [`KvStore`].
//! The trait asks for exactly four primitives; everything else is built on
//! top of them in [`crate::cache`] and [`crate::usage`].
//!
//! Two backends are provided:
//!
//! - [`MemoryStore`]: moka-backed, per-process. The default.
//! - `RedisStore` (feature `redis`): shared between processes.
//!
//! Neither guarantees that values survive a restart.

mod memory;
#[cfg(feature = "redis")]
mod redis;

pub use memory::MemoryStore;
#[cfg(feature = "redis")]
pub use self::redis::RedisStore;

use std::time::Duration;

use async_trait::async_trait;

use crate::Result;

/// Key-value store with per-key expiry.
///
/// Implementations must make [`incr_with_ttl`](KvStore::incr_with_ttl)
/// atomic: concurrent increments of the same key are all reflected in the
/// final value.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Read a value. Expired and absent keys both read as `None`.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value with a TTL, replacing any previous value and expiry.
    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// Remove a key. Returns whether it existed.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Atomically increment an integer counter and return the new value.
    ///
    /// A missing key starts from zero and gets `ttl` as its expiry; later
    /// increments leave the expiry untouched.
    async fn incr_with_ttl(&self, key: &str, ttl: Duration) -> Result<u64>;
}
