//! relaygate - Failover request router for text-generation providers
//!
//! A [`Router`] sits in front of several interchangeable providers, each with
//! its own endpoint, credential and per-minute rate limit. For every request
//! it checks a prompt-fingerprint cache, then walks the providers in a fixed
//! priority order, skipping those without a credential or over quota, and
//! returns the first successful answer.
//!
//! # Example
//!
//! ```rust,no_run
//! use relaygate::{Dialect, GenerationRequest, ProviderConfig, Router};
//!
//! #[tokio::main]
//! async fn main() -> relaygate::Result<()> {
//!     let router = Router::builder()
//!         .provider(
//!             ProviderConfig::new(
//!                 "gemini",
//!                 "https://generativelanguage.googleapis.com/v1beta/models/gemini-pro:generateContent",
//!                 60,
//!                 Dialect::Gemini,
//!             )
//!             .credential("your-gemini-key"),
//!         )
//!         .provider(
//!             ProviderConfig::new(
//!                 "deepseek",
//!                 "https://api.deepseek.com/v1/chat/completions",
//!                 20,
//!                 Dialect::chat_completions("deepseek-chat"),
//!             )
//!             .credential("sk-your-deepseek-key"),
//!         )
//!         .build()?;
//!
//!     let result = router
//!         .route(&GenerationRequest::new("What is the capital of France?"))
//!         .await?;
//!
//!     println!("{} (via {}, cached: {})", result.content, result.provider, result.cached);
//!     Ok(())
//! }
//! ```
//!
//! # Loading from configuration
//!
//! ```rust,no_run
//! use relaygate::config::{Config, Secrets};
//!
//! # async fn run() -> relaygate::Result<()> {
//! let config = Config::load(None)?;
//! let router = config.router(&Secrets::load()?).await?;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod providers;
pub mod router;
pub mod store;
pub mod telemetry;
pub mod types;
pub mod usage;

// Re-export main types at crate root
pub use error::{RelayError, Result};
pub use router::{Router, RouterBuilder};

pub use cache::{CacheConfig, CacheEntry, FingerprintCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use providers::{Dialect, HttpProvider, Provider, ProviderConfig, RetryConfig};
pub use store::{KvStore, MemoryStore};
pub use types::{GenerationRequest, GenerationResult, Granularity, ProviderStats};
pub use usage::UsageCounters;

#[cfg(feature = "redis")]
pub use store::RedisStore;
