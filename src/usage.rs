//! Windowed per-provider usage counters.
//!
//! Each counter is keyed by `(provider, granularity, window index)` where the
//! window index is `floor(now / window_length)`. A counter is never reset:
//! when the window index moves on, reads and writes land on a fresh key, and
//! the stale one expires on its own after one window length.
//!
//! Only the minute window gates provider availability; hour and day are
//! informational and surface through [`ProviderStats`].
//!
//! Store failures are soft. A failed read counts as zero and a failed
//! increment is logged and reported as zero, so a broken store never blocks
//! generation.

use std::sync::Arc;

use tracing::warn;

use crate::clock::Clock;
use crate::store::KvStore;
use crate::types::{Granularity, ProviderStats};

/// Key namespace for usage counters inside the shared store.
const KEY_PREFIX: &str = "usage:";

/// Per-provider, per-window request counters over a [`KvStore`].
pub struct UsageCounters {
    store: Arc<dyn KvStore>,
    clock: Arc<dyn Clock>,
}

impl UsageCounters {
    pub fn new(store: Arc<dyn KvStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Count for the current window. Zero when unset, expired, or unreadable.
    pub async fn get_count(&self, provider: &str, granularity: Granularity) -> u64 {
        let key = self.key(provider, granularity);
        match self.store.get(&key).await {
            Ok(Some(raw)) => raw.parse().unwrap_or_else(|_| {
                warn!(key = %key, value = %raw, "usage counter is not an integer, reading as 0");
                0
            }),
            Ok(None) => 0,
            Err(e) => {
                warn!(key = %key, error = %e, "usage counter read failed, reading as 0");
                0
            }
        }
    }

    /// Atomically increment the current window's counter and return the new
    /// value. The first increment of a window sets its expiry to the window
    /// length.
    pub async fn increment(&self, provider: &str, granularity: Granularity) -> u64 {
        let key = self.key(provider, granularity);
        match self.store.incr_with_ttl(&key, granularity.window()).await {
            Ok(count) => count,
            Err(e) => {
                warn!(key = %key, error = %e, "usage counter increment failed");
                0
            }
        }
    }

    /// Charge one request to a provider across every window granularity.
    ///
    /// Returns the new minute count.
    pub async fn charge(&self, provider: &str) -> u64 {
        let minute = self.increment(provider, Granularity::Minute).await;
        self.increment(provider, Granularity::Hour).await;
        self.increment(provider, Granularity::Day).await;
        minute
    }

    /// Read-only snapshot of all windows for one provider.
    pub async fn stats(&self, provider: &str, minute_limit: u32) -> ProviderStats {
        ProviderStats {
            provider: provider.to_owned(),
            minute: self.get_count(provider, Granularity::Minute).await,
            hour: self.get_count(provider, Granularity::Hour).await,
            day: self.get_count(provider, Granularity::Day).await,
            minute_limit,
        }
    }

    fn key(&self, provider: &str, granularity: Granularity) -> String {
        counter_key(provider, granularity, self.clock.unix_time())
    }
}

fn counter_key(provider: &str, granularity: Granularity, unix_time: u64) -> String {
    format!(
        "{KEY_PREFIX}{provider}:{granularity}:{}",
        granularity.window_index(unix_time)
    )
}
