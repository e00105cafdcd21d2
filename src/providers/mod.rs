//! Provider adapters.
//!
//! Every provider is an [`HttpProvider`] configured with a [`ProviderConfig`];
//! the only per-provider logic is the [`Dialect`] that shapes payloads.
//! The [`Provider`] trait is the seam the router depends on, so tests can
//! substitute their own implementations.

pub mod config;
pub mod dialect;
pub mod http;
pub mod retry;
pub mod traits;

pub use config::ProviderConfig;
pub use dialect::Dialect;
pub use http::{DEFAULT_TIMEOUT, HttpProvider};
pub use retry::RetryConfig;
pub use traits::Provider;
