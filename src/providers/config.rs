//! Static per-provider configuration.

use std::fmt;

use super::dialect::Dialect;
use crate::{RelayError, Result};

/// Everything needed to reach one provider.
///
/// Built once at startup and never mutated afterwards.
///
/// ```rust
/// # use relaygate::{Dialect, ProviderConfig};
/// let config = ProviderConfig::new(
///     "deepseek",
///     "https://api.deepseek.com/v1/chat/completions",
///     20,
///     Dialect::chat_completions("deepseek-chat"),
/// )
/// .credential("sk-test");
/// assert!(config.has_credential());
/// ```
#[derive(Clone, PartialEq)]
pub struct ProviderConfig {
    /// Unique provider name.
    pub name: String,
    /// Bearer credential. `None` makes the provider permanently unusable.
    pub credential: Option<String>,
    /// URL the JSON request is POSTed to.
    pub endpoint: String,
    /// Requests allowed per minute window. Must be positive.
    pub rate_limit: u32,
    /// Request/response shape spoken by the endpoint.
    pub dialect: Dialect,
    /// Extra headers sent with every request.
    pub headers: Vec<(String, String)>,
}

impl ProviderConfig {
    pub fn new(
        name: impl Into<String>,
        endpoint: impl Into<String>,
        rate_limit: u32,
        dialect: Dialect,
    ) -> Self {
        Self {
            name: name.into(),
            credential: None,
            endpoint: endpoint.into(),
            rate_limit,
            dialect,
            headers: Vec::new(),
        }
    }

    /// Set the credential. Empty strings count as no credential.
    pub fn credential(mut self, credential: impl Into<String>) -> Self {
        let credential = credential.into();
        self.credential = (!credential.is_empty()).then_some(credential);
        self
    }

    /// Add an extra request header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn has_credential(&self) -> bool {
        self.credential.is_some()
    }

    /// Check the invariants the router relies on.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(RelayError::Configuration(
                "provider name must not be empty".to_string(),
            ));
        }
        if self.rate_limit == 0 {
            return Err(RelayError::Configuration(format!(
                "provider '{}': rate_limit must be positive",
                self.name
            )));
        }
        reqwest::Url::parse(&self.endpoint).map_err(|e| {
            RelayError::Configuration(format!(
                "provider '{}': invalid endpoint '{}': {e}",
                self.name, self.endpoint
            ))
        })?;
        Ok(())
    }
}

// Hand-written so the credential never ends up in logs.
impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("name", &self.name)
            .field("credential", &self.credential.as_ref().map(|_| "<redacted>"))
            .field("endpoint", &self.endpoint)
            .field("rate_limit", &self.rate_limit)
            .field("dialect", &self.dialect)
            .field("headers", &self.headers)
            .finish()
    }
}
