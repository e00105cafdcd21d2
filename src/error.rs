//! relaygate error types

use std::time::Duration;

/// relaygate error types
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    // Provider/network errors
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Provider has no credential configured. Normally filtered out by
    /// `is_usable()`, but `generate()` still refuses to run without one.
    #[error("no credential configured for provider '{0}'")]
    MissingCredential(String),

    // Backing store errors
    #[error("store error: {0}")]
    Store(String),

    // Data errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("no provider configured")]
    NoProvider,

    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    // Routing outcomes
    /// The caller forced a provider and it could not serve the request.
    /// Never falls back to another provider.
    #[error("forced provider '{provider}' is not available")]
    ForcedProviderUnavailable { provider: String },

    /// Every configured provider was unusable or failed.
    #[error("all providers are currently unavailable")]
    AllProvidersUnavailable,
}

impl RelayError {
    /// Whether an adapter should retry the attempt that produced this error.
    ///
    /// Transport failures, timeouts and every non-2xx status are retried.
    /// Bodies that cannot be parsed and missing credentials are not: a retry
    /// would produce the same outcome.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            RelayError::Http(_) | RelayError::Timeout(_) | RelayError::Api { .. }
        )
    }
}

impl From<reqwest::Error> for RelayError {
    fn from(err: reqwest::Error) -> Self {
        RelayError::Http(err.to_string())
    }
}

/// Result type alias for relaygate operations
pub type Result<T> = std::result::Result<T, RelayError>;
