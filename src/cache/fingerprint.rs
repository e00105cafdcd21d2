//! Fingerprint keys, cache entries and the store-backed response cache.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::clock::Clock;
use crate::store::KvStore;
use crate::telemetry;
use crate::{RelayError, Result};

/// Key namespace for cached responses inside the shared store.
const KEY_PREFIX: &str = "response:";

/// Configuration for the fingerprint cache.
///
/// ```rust
/// # use relaygate::CacheConfig;
/// # use std::time::Duration;
/// let config = CacheConfig::new().ttl(Duration::from_secs(600));
/// assert_eq!(config.ttl, Duration::from_secs(600));
/// ```
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Time-to-live for cached entries. Default: 1 hour.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(3600),
        }
    }
}

impl CacheConfig {
    /// Create a new config with sensible defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the time-to-live for cached entries.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

/// A previously generated response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Provider that generated `content`.
    pub provider: String,
    pub content: String,
    /// Unix seconds at which the entry was written.
    pub created_at: u64,
}

/// Deterministic digest of a prompt: lowercase hex SHA-256 of its UTF-8 bytes.
///
/// Stable across processes and restarts, so a shared backend sees the same
/// keys from every instance.
pub fn fingerprint(prompt: &str) -> String {
    hex::encode(Sha256::digest(prompt.as_bytes()))
}

fn cache_key(prompt: &str) -> String {
    format!("{KEY_PREFIX}{}", fingerprint(prompt))
}

/// Prompt-fingerprint → response cache over a [`KvStore`].
///
/// Writes are last-writer-wins: two concurrent stores for the same prompt
/// are not coordinated.
pub struct FingerprintCache {
    store: Arc<dyn KvStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl FingerprintCache {
    pub fn new(store: Arc<dyn KvStore>, clock: Arc<dyn Clock>, config: &CacheConfig) -> Self {
        Self {
            store,
            clock,
            ttl: config.ttl,
        }
    }

    /// Configured time-to-live.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Look up the cached response for a prompt.
    ///
    /// Returns `None` when absent, expired, unreadable, or when the store is
    /// failing. Emits cache hit/miss metrics.
    pub async fn lookup(&self, prompt: &str) -> Option<CacheEntry> {
        let key = cache_key(prompt);
        let entry = match self.store.get(&key).await {
            Ok(Some(raw)) => match serde_json::from_str::<CacheEntry>(&raw) {
                Ok(entry) if self.is_expired(&entry) => None,
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(key = %key, error = %e, "discarding unreadable cache entry");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(key = %key, error = %e, "cache lookup failed, treating as miss");
                None
            }
        };

        if entry.is_some() {
            metrics::counter!(telemetry::CACHE_HITS_TOTAL).increment(1);
        } else {
            metrics::counter!(telemetry::CACHE_MISSES_TOTAL).increment(1);
        }
        entry
    }

    /// An entry is stale once `ttl` has elapsed on the injected clock, even
    /// if the store has not evicted it yet. Sub-second TTLs round up.
    fn is_expired(&self, entry: &CacheEntry) -> bool {
        let ttl_secs = self.ttl.as_secs() + u64::from(self.ttl.subsec_nanos() > 0);
        entry.created_at.saturating_add(ttl_secs) <= self.clock.unix_time()
    }

    /// Store a response, overwriting any existing entry for the prompt.
    pub async fn store(&self, prompt: &str, provider: &str, content: &str) -> Result<()> {
        let entry = CacheEntry {
            provider: provider.to_owned(),
            content: content.to_owned(),
            created_at: self.clock.unix_time(),
        };
        let raw = serde_json::to_string(&entry).map_err(RelayError::from)?;
        self.store
            .set_with_ttl(&cache_key(prompt), &raw, self.ttl)
            .await
    }
}
