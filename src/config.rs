//! Configuration loading.
//!
//! Configuration is loaded from TOML files with the following resolution order:
//! 1. Explicit path (e.g. `--config <path>`)
//! 2. `~/.relaygate/config.toml` (user)
//! 3. `/etc/relaygate/config.toml` (system)
//!
//! Credentials live apart from the main config, with mandatory permission checks:
//! 1. `~/.relaygate/secrets.toml` (user, must be 0600)
//! 2. `/etc/relaygate/secrets.toml` (system, must be 0600)
//!
//! Any credential missing from the secrets file is looked up in the
//! `<NAME>_API_KEY` environment variable.
//!
//! ```toml
//! [cache]
//! ttl_secs = 3600
//!
//! [[providers]]
//! name = "gemini"
//! endpoint = "https://generativelanguage.googleapis.com/v1beta/models/gemini-pro:generateContent"
//! rate_limit = 60
//! dialect = "gemini"
//!
//! [[providers]]
//! name = "openrouter"
//! endpoint = "https://openrouter.ai/api/v1/chat/completions"
//! rate_limit = 50
//! dialect = "chat_completions"
//! model = "openai/gpt-4o-mini"
//!
//! [providers.headers]
//! "X-Title" = "relaygate"
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::cache::CacheConfig;
use crate::providers::{Dialect, ProviderConfig, RetryConfig};
use crate::router::{Router, RouterBuilder};
use crate::store::{KvStore, MemoryStore};
use crate::{RelayError, Result};

/// Directory name under the home directory and `/etc`.
const CONFIG_DIR: &str = "relaygate";

/// Router configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub cache: CacheSection,
    #[serde(default)]
    pub retry: RetrySection,
    #[serde(default)]
    pub http: HttpSection,
    #[serde(default)]
    pub store: StoreSection,
    /// Providers in priority order.
    #[serde(default)]
    pub providers: Vec<ProviderSection>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSection {
    /// Cached response lifetime in seconds (default: 3600).
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            ttl_secs: default_cache_ttl(),
        }
    }
}

fn default_cache_ttl() -> u64 {
    3600
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetrySection {
    /// Attempts per `generate()` call, including the first (default: 3).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay before the first retry in milliseconds (default: 2000).
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    /// Backoff multiplier (default: 2.0).
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    /// Upper bound on a single backoff delay in seconds (default: 30).
    #[serde(default = "default_max_delay_secs")]
    pub max_delay_secs: u64,
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            multiplier: default_multiplier(),
            max_delay_secs: default_max_delay_secs(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    2000
}

fn default_multiplier() -> f64 {
    2.0
}

fn default_max_delay_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpSection {
    /// Per-attempt request timeout in seconds (default: 30).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for HttpSection {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

/// Which key-value backend to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    #[default]
    Memory,
    Redis,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreSection {
    #[serde(default)]
    pub backend: StoreBackend,
    /// Connection URL, required for the redis backend.
    #[serde(default)]
    pub redis_url: Option<String>,
    /// Capacity of the in-memory backend (default: 100 000).
    #[serde(default = "default_max_entries")]
    pub max_entries: u64,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            redis_url: None,
            max_entries: default_max_entries(),
        }
    }
}

fn default_max_entries() -> u64 {
    100_000
}

/// Wire format name as written in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialectKind {
    Gemini,
    ChatCompletions,
}

/// One `[[providers]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSection {
    pub name: String,
    pub endpoint: String,
    pub rate_limit: u32,
    pub dialect: DialectKind,
    /// Model id, required for `chat_completions`.
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl ProviderSection {
    /// Convert to a [`ProviderConfig`], attaching the credential if any.
    pub fn to_provider_config(&self, credential: Option<String>) -> Result<ProviderConfig> {
        let dialect = match (self.dialect, &self.model) {
            (DialectKind::Gemini, _) => Dialect::Gemini,
            (DialectKind::ChatCompletions, Some(model)) => Dialect::chat_completions(model),
            (DialectKind::ChatCompletions, None) => {
                return Err(RelayError::Configuration(format!(
                    "provider '{}': chat_completions dialect requires a model",
                    self.name
                )));
            }
        };
        let mut config =
            ProviderConfig::new(&self.name, &self.endpoint, self.rate_limit, dialect);
        if let Some(credential) = credential {
            config = config.credential(credential);
        }
        for (name, value) in &self.headers {
            config = config.header(name, value);
        }
        Ok(config)
    }
}

/// Secrets configuration (API keys), one table per provider.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct Secrets {
    pub providers: HashMap<String, ApiKeySecret>,
}

/// A single API key secret.
#[derive(Clone, Deserialize)]
pub struct ApiKeySecret {
    pub api_key: String,
}

impl std::fmt::Debug for ApiKeySecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeySecret")
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl Config {
    /// Load configuration from the standard locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let path = Self::resolve_config_path(explicit_path)?;
        let content = fs::read_to_string(&path).map_err(|e| {
            RelayError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            RelayError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })
    }

    /// Resolve the config file path.
    fn resolve_config_path(explicit: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(path.to_path_buf());
            }
            return Err(RelayError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        // User config
        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(format!(".{CONFIG_DIR}")).join("config.toml");
            if user_config.exists() {
                return Ok(user_config);
            }
        }

        // System config
        let system_config = Path::new("/etc").join(CONFIG_DIR).join("config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }

        Err(RelayError::Configuration(
            "No config file found. Create ~/.relaygate/config.toml or /etc/relaygate/config.toml"
                .to_string(),
        ))
    }

    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig::new().ttl(Duration::from_secs(self.cache.ttl_secs))
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig::new()
            .max_attempts(self.retry.max_attempts)
            .initial_delay(Duration::from_millis(self.retry.initial_delay_ms))
            .multiplier(self.retry.multiplier)
            .max_delay(Duration::from_secs(self.retry.max_delay_secs))
    }

    /// Provider configs in priority order, with credentials resolved.
    pub fn provider_configs(&self, secrets: &Secrets) -> Result<Vec<ProviderConfig>> {
        self.providers
            .iter()
            .map(|p| p.to_provider_config(secrets.api_key(&p.name)))
            .collect()
    }

    /// A router builder with everything but the store filled in.
    ///
    /// The builder defaults to an in-memory store; use [`Config::router`]
    /// to honour the `[store]` section.
    pub fn router_builder(&self, secrets: &Secrets) -> Result<RouterBuilder> {
        Ok(Router::builder()
            .providers(self.provider_configs(secrets)?)
            .cache_config(self.cache_config())
            .retry_config(self.retry_config())
            .timeout(Duration::from_secs(self.http.timeout_secs)))
    }

    /// Open the configured key-value backend.
    pub async fn open_store(&self) -> Result<Arc<dyn KvStore>> {
        match self.store.backend {
            StoreBackend::Memory => Ok(Arc::new(MemoryStore::with_max_entries(
                self.store.max_entries,
            ))),
            StoreBackend::Redis => self.open_redis().await,
        }
    }

    #[cfg(feature = "redis")]
    async fn open_redis(&self) -> Result<Arc<dyn KvStore>> {
        let url = self.store.redis_url.as_deref().ok_or_else(|| {
            RelayError::Configuration("store.redis_url is required for the redis backend".into())
        })?;
        Ok(Arc::new(crate::store::RedisStore::connect(url).await?))
    }

    #[cfg(not(feature = "redis"))]
    async fn open_redis(&self) -> Result<Arc<dyn KvStore>> {
        Err(RelayError::Configuration(
            "redis backend requested but relaygate was built without the `redis` feature".into(),
        ))
    }

    /// Build a router from this configuration, including its store.
    pub async fn router(&self, secrets: &Secrets) -> Result<Router> {
        let store = self.open_store().await?;
        self.router_builder(secrets)?.store(store).build()
    }
}

impl Secrets {
    /// Load secrets from the standard locations with permission checks.
    ///
    /// Returns empty secrets if no file exists (providers may use env vars).
    pub fn load() -> Result<Self> {
        // Try user secrets first
        if let Some(home) = dirs::home_dir() {
            let user_secrets = home.join(format!(".{CONFIG_DIR}")).join("secrets.toml");
            if user_secrets.exists() {
                return Self::from_path(&user_secrets);
            }
        }

        // Try system secrets
        let system_secrets = Path::new("/etc").join(CONFIG_DIR).join("secrets.toml");
        if system_secrets.exists() {
            return Self::from_path(&system_secrets);
        }

        Ok(Secrets::default())
    }

    /// Load a specific secrets file, enforcing its permissions.
    pub fn from_path(path: &Path) -> Result<Self> {
        Self::check_permissions(path)?;
        let content = fs::read_to_string(path).map_err(|e| {
            RelayError::Configuration(format!("Failed to read secrets file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            RelayError::Configuration(format!("Failed to parse secrets file {path:?}: {e}"))
        })
    }

    /// Check that the secrets file has secure permissions (0600 or 0400).
    #[cfg(unix)]
    fn check_permissions(path: &Path) -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let metadata = fs::metadata(path).map_err(|e| {
            RelayError::Configuration(format!("Failed to stat secrets file {path:?}: {e}"))
        })?;

        let mode = metadata.permissions().mode();
        // Reject if group or other bits are set
        if mode & 0o077 != 0 {
            return Err(RelayError::Configuration(format!(
                "Secrets file {path:?} has insecure permissions {:o}. Must be 0600 or 0400.",
                mode & 0o777
            )));
        }

        Ok(())
    }

    #[cfg(not(unix))]
    fn check_permissions(_path: &Path) -> Result<()> {
        Ok(())
    }

    /// Get the API key for a provider, falling back to `<NAME>_API_KEY`.
    ///
    /// Empty keys are treated as absent.
    pub fn api_key(&self, provider: &str) -> Option<String> {
        self.providers
            .get(provider)
            .map(|s| s.api_key.clone())
            .filter(|k| !k.is_empty())
            .or_else(|| {
                std::env::var(env_var_name(provider))
                    .ok()
                    .filter(|k| !k.is_empty())
            })
    }
}

/// `open-router` → `OPEN_ROUTER_API_KEY`.
pub fn env_var_name(provider: &str) -> String {
    format!("{}_API_KEY", provider.to_uppercase().replace('-', "_"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = Config::default();
        assert_eq!(config.cache.ttl_secs, 3600);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.initial_delay_ms, 2000);
        assert_eq!(config.http.timeout_secs, 30);
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert!(config.providers.is_empty());
    }

    #[test]
    fn parse_minimal_config() {
        let toml = r#"
            [[providers]]
            name = "gemini"
            endpoint = "https://example.com/gemini"
            rate_limit = 60
            dialect = "gemini"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.providers.len(), 1);
        assert_eq!(config.providers[0].dialect, DialectKind::Gemini);
        // Defaults preserved
        assert_eq!(config.cache.ttl_secs, 3600);
        assert_eq!(config.store.max_entries, 100_000);
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
            [cache]
            ttl_secs = 120

            [retry]
            max_attempts = 5
            initial_delay_ms = 100
            multiplier = 3.0
            max_delay_secs = 4

            [http]
            timeout_secs = 10

            [store]
            backend = "redis"
            redis_url = "redis://127.0.0.1/"

            [[providers]]
            name = "gemini"
            endpoint = "https://example.com/gemini"
            rate_limit = 60
            dialect = "gemini"

            [[providers]]
            name = "openrouter"
            endpoint = "https://example.com/chat"
            rate_limit = 50
            dialect = "chat_completions"
            model = "openai/gpt-4o-mini"

            [providers.headers]
            "HTTP-Referer" = "https://example.com"
            "X-Title" = "relaygate"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.cache_config().ttl, Duration::from_secs(120));
        let retry = config.retry_config();
        assert_eq!(retry.max_attempts, 5);
        assert_eq!(retry.delay_for_attempt(1), Duration::from_millis(300));
        assert_eq!(retry.max_delay, Duration::from_secs(4));
        assert_eq!(config.store.backend, StoreBackend::Redis);

        let names: Vec<_> = config.providers.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["gemini", "openrouter"]);
        assert_eq!(config.providers[1].headers.len(), 2);
        assert!(config.providers[0].headers.is_empty());
    }

    #[test]
    fn chat_completions_requires_model() {
        let section = ProviderSection {
            name: "deepseek".into(),
            endpoint: "https://example.com/chat".into(),
            rate_limit: 20,
            dialect: DialectKind::ChatCompletions,
            model: None,
            headers: BTreeMap::new(),
        };
        assert!(matches!(
            section.to_provider_config(None),
            Err(RelayError::Configuration(_))
        ));
    }

    #[test]
    fn parse_secrets() {
        let toml = r#"
            [gemini]
            api_key = "g-test-key"

            [deepseek]
            api_key = "sk-test-key"
        "#;
        let secrets: Secrets = toml::from_str(toml).unwrap();
        assert_eq!(secrets.api_key("gemini"), Some("g-test-key".to_string()));
        assert_eq!(secrets.api_key("deepseek"), Some("sk-test-key".to_string()));
    }

    #[test]
    fn api_key_falls_back_to_env() {
        // SAFETY: test-local variable name not read by any other test
        unsafe { std::env::set_var("RELAYGATE_ENV_TEST_API_KEY", "from-env") };
        let secrets = Secrets::default();
        assert_eq!(
            secrets.api_key("relaygate-env-test"),
            Some("from-env".to_string())
        );
        assert_eq!(secrets.api_key("nonexistent-provider"), None);
    }

    #[test]
    fn empty_api_key_is_absent() {
        let toml = r#"
            [gemini]
            api_key = ""
        "#;
        let secrets: Secrets = toml::from_str(toml).unwrap();
        assert_eq!(secrets.api_key("gemini"), None);
    }

    #[test]
    fn env_var_name_normalises() {
        assert_eq!(env_var_name("gemini"), "GEMINI_API_KEY");
        assert_eq!(env_var_name("open-router"), "OPEN_ROUTER_API_KEY");
    }

    #[test]
    fn secrets_debug_redacts_key() {
        let secret = ApiKeySecret {
            api_key: "super-secret".into(),
        };
        assert!(!format!("{secret:?}").contains("super-secret"));
    }

    #[test]
    fn config_not_found_returns_error() {
        let result = Config::load(Some(Path::new("/nonexistent/config.toml")));
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Config file not found"));
    }
}
