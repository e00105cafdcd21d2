//! In-process [`KvStore`] on top of moka.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;
use moka::ops::compute::{CompResult, Op};

use super::KvStore;
use crate::{RelayError, Result};

/// Default maximum number of keys held by a [`MemoryStore`].
const DEFAULT_MAX_ENTRIES: u64 = 100_000;

#[derive(Debug, Clone)]
enum Slot {
    Value { data: String, ttl: Duration },
    Counter { count: u64, ttl: Duration },
}

impl Slot {
    fn ttl(&self) -> Duration {
        match self {
            Slot::Value { ttl, .. } | Slot::Counter { ttl, .. } => *ttl,
        }
    }

    fn render(self) -> String {
        match self {
            Slot::Value { data, .. } => data,
            Slot::Counter { count, .. } => count.to_string(),
        }
    }
}

/// Per-entry expiry: plain values restart their TTL on every write,
/// counters keep the expiry set by their first increment.
struct SlotExpiry;

impl Expiry<String, Slot> for SlotExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &Slot,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl())
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Slot,
        _updated_at: Instant,
        duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        match value {
            Slot::Value { ttl, .. } => Some(*ttl),
            Slot::Counter { .. } => duration_until_expiry,
        }
    }
}

/// Thread-safe in-memory store with per-key TTL.
///
/// Bounded (default capacity: 100,000 keys); at capacity moka evicts the
/// least useful entries, which for a counter means it restarts from zero.
pub struct MemoryStore {
    entries: Cache<String, Slot>,
}

impl MemoryStore {
    /// Create an empty store with the default capacity.
    pub fn new() -> Self {
        Self::with_max_entries(DEFAULT_MAX_ENTRIES)
    }

    /// Create a store with a custom capacity.
    pub fn with_max_entries(max: u64) -> Self {
        let entries = Cache::builder()
            .max_capacity(max)
            .expire_after(SlotExpiry)
            .build();
        Self { entries }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).await.map(Slot::render))
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        self.entries
            .insert(
                key.to_owned(),
                Slot::Value {
                    data: value.to_owned(),
                    ttl,
                },
            )
            .await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.entries.remove(key).await.is_some())
    }

    async fn incr_with_ttl(&self, key: &str, ttl: Duration) -> Result<u64> {
        // and_compute_with serialises computations on the same key.
        let outcome = self
            .entries
            .entry(key.to_owned())
            .and_compute_with(|current| {
                let op = match current.map(|entry| entry.into_value()) {
                    None => Op::Put(Slot::Counter { count: 1, ttl }),
                    Some(Slot::Counter { count, ttl }) => Op::Put(Slot::Counter {
                        count: count + 1,
                        ttl,
                    }),
                    Some(Slot::Value { .. }) => Op::Nop,
                };
                std::future::ready(op)
            })
            .await;

        match outcome {
            CompResult::Inserted(entry) | CompResult::ReplacedWith(entry) => {
                match entry.into_value() {
                    Slot::Counter { count, .. } => Ok(count),
                    Slot::Value { .. } => Err(not_a_counter(key)),
                }
            }
            _ => Err(not_a_counter(key)),
        }
    }
}

fn not_a_counter(key: &str) -> RelayError {
    RelayError::Store(format!("value at '{key}' is not a counter"))
}
