//! Cache-first, fixed-priority failover routing.
//!
//! # Routing Flow
//!
//! ```text
//! route(request)
//!     │
//!     ├── forced provider? ──► that provider only ──► ok: cache + return
//!     │                                          └──► err: ForcedProviderUnavailable
//!     ▼
//! FingerprintCache::lookup ──► hit: return cached=true
//!     │ miss
//!     ▼
//! for provider in priority order:
//!     is_usable()? ── no ──► skip (no quota charged)
//!     generate()   ── ok ──► cache (best-effort) + return cached=false
//!                  └─ err ─► next provider
//!     │
//!     ▼
//! AllProvidersUnavailable
//! ```
//!
//! Priority is the order providers were configured in and never changes at
//! runtime. The router holds no per-request state; concurrent calls share
//! only the cache and the usage counters.

mod builder;

pub use builder::RouterBuilder;

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, instrument, warn};

use crate::cache::FingerprintCache;
use crate::providers::Provider;
use crate::telemetry;
use crate::types::{GenerationRequest, GenerationResult, ProviderStats};
use crate::usage::UsageCounters;
use crate::{RelayError, Result};

/// Label used for requests answered from the cache.
const CACHE_LABEL: &str = "cache";

/// Failover router over an ordered list of providers.
pub struct Router {
    providers: Vec<Arc<dyn Provider>>,
    cache: FingerprintCache,
    usage: Arc<UsageCounters>,
}

impl Router {
    /// Create a builder for a router over HTTP providers.
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    /// Assemble a router from already-built parts.
    ///
    /// `providers` is in priority order (index 0 = highest). The usage
    /// counters must be the same instance the providers charge against,
    /// otherwise [`stats`](Self::stats) reports nothing useful.
    pub fn new(
        providers: Vec<Arc<dyn Provider>>,
        cache: FingerprintCache,
        usage: Arc<UsageCounters>,
    ) -> Self {
        Self {
            providers,
            cache,
            usage,
        }
    }

    /// Provider names in priority order.
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Providers in priority order.
    pub fn providers(&self) -> &[Arc<dyn Provider>] {
        &self.providers
    }

    /// Serve a generation request.
    #[instrument(skip(self, request), fields(forced = request.forced_provider.as_deref()))]
    pub async fn route(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        let start = Instant::now();

        if let Some(name) = request.forced_provider.as_deref() {
            return self.route_forced(name, request, start).await;
        }

        if let Some(entry) = self.cache.lookup(&request.prompt).await {
            debug!(provider = %entry.provider, "served from cache");
            Self::record_request(CACHE_LABEL, start, true);
            return Ok(GenerationResult {
                content: entry.content,
                provider: entry.provider,
                cached: true,
                latency_ms: 0.0,
            }
            .with_latency(start.elapsed()));
        }

        for provider in &self.providers {
            if !provider.is_usable().await {
                debug!(provider = provider.name(), "skipping unusable provider");
                metrics::counter!(telemetry::PROVIDER_SKIPS_TOTAL, "provider" => provider.name().to_owned())
                    .increment(1);
                continue;
            }
            match provider.generate(request).await {
                Ok(result) => {
                    self.cache_result(request, &result).await;
                    Self::record_request(provider.name(), start, true);
                    return Ok(result.with_latency(start.elapsed()));
                }
                Err(e) => {
                    warn!(provider = provider.name(), error = %e, "provider failed, falling back");
                    Self::record_request(provider.name(), start, false);
                }
            }
        }

        Self::record_request("none", start, false);
        Err(RelayError::AllProvidersUnavailable)
    }

    /// Forced routing: one provider, no cache read, no fallback.
    async fn route_forced(
        &self,
        name: &str,
        request: &GenerationRequest,
        start: Instant,
    ) -> Result<GenerationResult> {
        let unavailable = || RelayError::ForcedProviderUnavailable {
            provider: name.to_owned(),
        };

        let Some(provider) = self.find(name) else {
            warn!(provider = name, "forced provider is not configured");
            Self::record_request("none", start, false);
            return Err(unavailable());
        };
        if !provider.is_usable().await {
            debug!(provider = name, "forced provider is unusable");
            metrics::counter!(telemetry::PROVIDER_SKIPS_TOTAL, "provider" => name.to_owned())
                .increment(1);
            Self::record_request(name, start, false);
            return Err(unavailable());
        }

        match provider.generate(request).await {
            Ok(result) => {
                self.cache_result(request, &result).await;
                Self::record_request(name, start, true);
                Ok(result.with_latency(start.elapsed()))
            }
            Err(e) => {
                warn!(provider = name, error = %e, "forced provider failed");
                Self::record_request(name, start, false);
                Err(unavailable())
            }
        }
    }

    /// Read-only usage snapshot for one provider.
    pub async fn provider_stats(&self, name: &str) -> Result<ProviderStats> {
        let provider = self
            .find(name)
            .ok_or_else(|| RelayError::UnknownProvider(name.to_owned()))?;
        Ok(self.usage.stats(provider.name(), provider.rate_limit()).await)
    }

    /// Usage snapshots for every provider, in priority order.
    pub async fn stats(&self) -> Vec<ProviderStats> {
        let mut stats = Vec::with_capacity(self.providers.len());
        for provider in &self.providers {
            stats.push(self.usage.stats(provider.name(), provider.rate_limit()).await);
        }
        stats
    }

    fn find(&self, name: &str) -> Option<&Arc<dyn Provider>> {
        self.providers.iter().find(|p| p.name() == name)
    }

    async fn cache_result(&self, request: &GenerationRequest, result: &GenerationResult) {
        if let Err(e) = self
            .cache
            .store(&request.prompt, &result.provider, &result.content)
            .await
        {
            warn!(provider = %result.provider, error = %e, "failed to cache response");
        }
    }

    fn record_request(provider: &str, start: Instant, ok: bool) {
        let status = if ok { "ok" } else { "error" };
        metrics::counter!(telemetry::REQUESTS_TOTAL,
            "provider" => provider.to_owned(),
            "status" => status,
        )
        .increment(1);
        metrics::histogram!(telemetry::REQUEST_DURATION_SECONDS,
            "provider" => provider.to_owned(),
        )
        .record(start.elapsed().as_secs_f64());
    }
}
