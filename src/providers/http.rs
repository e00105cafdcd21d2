//! HTTP provider shared by every configured endpoint.
//!
//! One `HttpProvider` per [`ProviderConfig`]. The [`Dialect`] decides the
//! JSON shapes; everything else (bearer auth, quota, retry, timeouts) is
//! identical across providers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};

use super::config::ProviderConfig;
use super::dialect::Dialect;
use super::retry::{RetryConfig, with_retry};
use super::traits::Provider;
use crate::types::{GenerationRequest, GenerationResult, Granularity};
use crate::usage::UsageCounters;
use crate::{RelayError, Result};

/// Default per-attempt request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A provider reached over HTTP with a bearer credential.
pub struct HttpProvider {
    config: ProviderConfig,
    http: Client,
    usage: Arc<UsageCounters>,
    retry: RetryConfig,
    timeout: Duration,
}

impl HttpProvider {
    /// Create a provider with its own HTTP client.
    pub fn new(
        config: ProviderConfig,
        usage: Arc<UsageCounters>,
        retry: RetryConfig,
        timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RelayError::Configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::with_http_client(config, usage, retry, timeout, http))
    }

    /// Create a provider sharing an existing HTTP client.
    ///
    /// `timeout` is still applied per request.
    pub fn with_http_client(
        config: ProviderConfig,
        usage: Arc<UsageCounters>,
        retry: RetryConfig,
        timeout: Duration,
        http: Client,
    ) -> Self {
        Self {
            config,
            http,
            usage,
            retry,
            timeout,
        }
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn dialect(&self) -> &Dialect {
        &self.config.dialect
    }

    /// One physical attempt: POST the payload and return the raw body.
    async fn send(&self, credential: &str, payload: &serde_json::Value) -> Result<String> {
        let mut request = self
            .http
            .post(&self.config.endpoint)
            .timeout(self.timeout)
            .header("Authorization", format!("Bearer {credential}"))
            .json(payload);
        for (name, value) in &self.config.headers {
            request = request.header(name, value);
        }

        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            return Err(RelayError::Api {
                status: status.as_u16(),
                message: body,
            });
        }
        Ok(body)
    }

    fn transport_error(&self, err: reqwest::Error) -> RelayError {
        if err.is_timeout() {
            RelayError::Timeout(self.timeout)
        } else {
            RelayError::from(err)
        }
    }
}

#[async_trait]
impl Provider for HttpProvider {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn rate_limit(&self) -> u32 {
        self.config.rate_limit
    }

    async fn is_usable(&self) -> bool {
        if !self.config.has_credential() {
            return false;
        }
        let used = self
            .usage
            .get_count(&self.config.name, Granularity::Minute)
            .await;
        used < u64::from(self.config.rate_limit)
    }

    #[instrument(name = "provider.generate", skip(self, request), fields(provider = %self.config.name))]
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        let credential = self
            .config
            .credential
            .as_deref()
            .ok_or_else(|| RelayError::MissingCredential(self.config.name.clone()))?;

        // Quota is charged per logical call, not per physical attempt.
        let minute = self.usage.charge(&self.config.name).await;
        debug!(minute_count = minute, limit = self.config.rate_limit, "quota charged");

        let payload = self.config.dialect.build_payload(request)?;
        let start = Instant::now();
        let body = with_retry(&self.retry, &self.config.name, || {
            self.send(credential, &payload)
        })
        .await?;
        let content = self.config.dialect.parse_content(&body)?;

        Ok(GenerationResult::generated(&self.config.name, content).with_latency(start.elapsed()))
    }
}
