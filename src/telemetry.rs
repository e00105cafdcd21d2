//! Telemetry metric name constants.
//!
//! Centralised metric names for relaygate operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `relaygate_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `provider`: provider name (e.g. "gemini", "deepseek"), or "cache" /
//!   "none" for routes answered from cache or not answered at all
//! - `status`: outcome: "ok" or "error"

/// Total routed requests.
///
/// Labels: `provider`, `status` ("ok" | "error").
pub const REQUESTS_TOTAL: &str = "relaygate_requests_total";

/// Whole-route duration in seconds, failed attempts included.
///
/// Labels: `provider`.
pub const REQUEST_DURATION_SECONDS: &str = "relaygate_request_duration_seconds";

/// Total retry attempts inside an adapter (not counting the initial request).
///
/// Labels: `provider`.
pub const RETRIES_TOTAL: &str = "relaygate_retries_total";

/// Total fingerprint cache hits.
pub const CACHE_HITS_TOTAL: &str = "relaygate_cache_hits_total";

/// Total fingerprint cache misses.
pub const CACHE_MISSES_TOTAL: &str = "relaygate_cache_misses_total";

/// Providers passed over because they were unusable (no credential or over quota).
///
/// Labels: `provider`.
pub const PROVIDER_SKIPS_TOTAL: &str = "relaygate_provider_skips_total";
