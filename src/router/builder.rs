//! Builder for configuring router instances

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use super::Router;
use crate::cache::{CacheConfig, FingerprintCache};
use crate::clock::{Clock, SystemClock};
use crate::providers::{DEFAULT_TIMEOUT, HttpProvider, Provider, ProviderConfig, RetryConfig};
use crate::store::{KvStore, MemoryStore};
use crate::usage::UsageCounters;
use crate::{RelayError, Result};

/// Builder for a [`Router`] over HTTP providers.
///
/// Providers are tried in the order they are added.
///
/// ```rust
/// # use relaygate::{Dialect, ProviderConfig, Router};
/// let router = Router::builder()
///     .provider(
///         ProviderConfig::new("gemini", "https://example.com/gemini", 60, Dialect::Gemini)
///             .credential("key"),
///     )
///     .build()
///     .unwrap();
/// assert_eq!(router.provider_names(), vec!["gemini"]);
/// ```
pub struct RouterBuilder {
    providers: Vec<ProviderConfig>,
    store: Option<Arc<dyn KvStore>>,
    clock: Arc<dyn Clock>,
    cache: CacheConfig,
    retry: RetryConfig,
    timeout: Duration,
}

impl Default for RouterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RouterBuilder {
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
            store: None,
            clock: Arc::new(SystemClock),
            cache: CacheConfig::default(),
            retry: RetryConfig::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Append a provider at the lowest priority so far.
    pub fn provider(mut self, config: ProviderConfig) -> Self {
        self.providers.push(config);
        self
    }

    /// Append several providers, keeping their order.
    pub fn providers(mut self, configs: impl IntoIterator<Item = ProviderConfig>) -> Self {
        self.providers.extend(configs);
        self
    }

    /// Backing store for both the cache and the usage counters.
    /// Default: a fresh [`MemoryStore`].
    pub fn store(mut self, store: Arc<dyn KvStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Time source for usage windows and cache timestamps.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn cache_config(mut self, config: CacheConfig) -> Self {
        self.cache = config;
        self
    }

    pub fn retry_config(mut self, config: RetryConfig) -> Self {
        self.retry = config;
        self
    }

    /// Per-attempt HTTP timeout. Default: 30s.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Validate the configuration and build the router.
    pub fn build(self) -> Result<Router> {
        if self.providers.is_empty() {
            return Err(RelayError::NoProvider);
        }

        let mut seen = HashSet::new();
        for config in &self.providers {
            config.validate()?;
            if !seen.insert(config.name.as_str()) {
                return Err(RelayError::Configuration(format!(
                    "duplicate provider name '{}'",
                    config.name
                )));
            }
        }

        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStore::new()) as Arc<dyn KvStore>);
        let usage = Arc::new(UsageCounters::new(store.clone(), self.clock.clone()));
        let cache = FingerprintCache::new(store, self.clock, &self.cache);

        let http = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| RelayError::Configuration(format!("failed to build HTTP client: {e}")))?;

        let providers = self
            .providers
            .into_iter()
            .map(|config| {
                Arc::new(HttpProvider::with_http_client(
                    config,
                    usage.clone(),
                    self.retry.clone(),
                    self.timeout,
                    http.clone(),
                )) as Arc<dyn Provider>
            })
            .collect();

        Ok(Router::new(providers, cache, usage))
    }
}
