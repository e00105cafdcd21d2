//! Types for inbound generation requests.

use serde::{Deserialize, Serialize};

/// A single text-generation request.
///
/// Sampling parameters are provider-agnostic and optional; each provider
/// dialect fills in its own defaults for the ones left unset.
///
/// ```rust
/// # use relaygate::GenerationRequest;
/// let request = GenerationRequest::new("Summarise the Iliad in one line")
///     .temperature(0.2)
///     .max_tokens(64);
/// assert!(request.forced_provider.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Prompt text. Also the sole input to the cache fingerprint.
    pub prompt: String,

    /// Sampling temperature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Maximum number of output tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Nucleus sampling threshold.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    /// Top-k sampling: only consider the k most likely tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,

    /// Route to this provider only, bypassing the cache and the fallback chain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forced_provider: Option<String>,
}

impl GenerationRequest {
    /// Create a request for the given prompt with no sampling overrides.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            temperature: None,
            max_tokens: None,
            top_p: None,
            top_k: None,
            forced_provider: None,
        }
    }

    /// Set temperature.
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set max output tokens.
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set top_p.
    pub fn top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    /// Set top-k sampling.
    pub fn top_k(mut self, k: u32) -> Self {
        self.top_k = Some(k);
        self
    }

    /// Force a specific provider by name.
    pub fn force_provider(mut self, provider: impl Into<String>) -> Self {
        self.forced_provider = Some(provider.into());
        self
    }
}
