//! Routing results and usage statistics.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::RelayError;

/// Outcome of a successful route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    /// Generated text.
    pub content: String,
    /// Name of the provider that produced `content` (for cache hits, the
    /// provider that originally produced it).
    pub provider: String,
    /// True only when served from the fingerprint cache without contacting
    /// any provider.
    pub cached: bool,
    /// Milliseconds spent on the whole routing decision, failed attempts included.
    pub latency_ms: f64,
}

impl GenerationResult {
    /// A freshly generated (uncached) result.
    pub fn generated(provider: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            provider: provider.into(),
            cached: false,
            latency_ms: 0.0,
        }
    }

    /// Set the latency from an elapsed duration.
    pub fn with_latency(mut self, elapsed: Duration) -> Self {
        self.latency_ms = elapsed.as_secs_f64() * 1000.0;
        self
    }
}

/// Width of a usage-counter window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Minute,
    Hour,
    Day,
}

impl Granularity {
    /// All granularities, narrowest first.
    pub const ALL: [Granularity; 3] = [Granularity::Minute, Granularity::Hour, Granularity::Day];

    /// Window length in seconds.
    pub fn window_secs(self) -> u64 {
        match self {
            Granularity::Minute => 60,
            Granularity::Hour => 3_600,
            Granularity::Day => 86_400,
        }
    }

    /// Window length as a duration (also the counter's TTL).
    pub fn window(self) -> Duration {
        Duration::from_secs(self.window_secs())
    }

    /// Index of the window containing `unix_time`.
    pub fn window_index(self, unix_time: u64) -> u64 {
        unix_time / self.window_secs()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Granularity::Minute => "minute",
            Granularity::Hour => "hour",
            Granularity::Day => "day",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "minute" => Ok(Granularity::Minute),
            "hour" => Ok(Granularity::Hour),
            "day" => Ok(Granularity::Day),
            other => Err(RelayError::Configuration(format!(
                "unknown window granularity '{other}'"
            ))),
        }
    }
}

/// Read-only usage snapshot for one provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderStats {
    pub provider: String,
    pub minute: u64,
    pub hour: u64,
    pub day: u64,
    /// Requests allowed per minute window.
    pub minute_limit: u32,
}
