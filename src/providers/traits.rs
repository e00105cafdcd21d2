//! The provider contract.
//!
//! Every provider, whatever its wire format, exposes the same two operations
//! to the [`Router`](crate::Router):
//!
//! - `is_usable()`: credential present and minute quota not exhausted.
//!   Checking never consumes quota.
//! - `generate()`: charges quota, performs the call with bounded retry, and
//!   reports a single pass/fail outcome.
//!
//! The router never looks at *why* a provider failed; any `Err` from
//! `generate()` advances the fallback chain.

use async_trait::async_trait;

use crate::Result;
use crate::types::{GenerationRequest, GenerationResult};

/// A text-generation provider.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Unique provider name, used for forced routing, logging and counters.
    fn name(&self) -> &str;

    /// Requests allowed per minute window.
    fn rate_limit(&self) -> u32;

    /// Whether this provider may be called right now. Must not mutate anything.
    async fn is_usable(&self) -> bool;

    /// Generate a completion for `request`.
    ///
    /// On success the result carries this provider's name and `cached = false`.
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult>;
}
