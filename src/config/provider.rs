//! Provider-level settings: API credentials and transport options.

use crate::error::{ConfigError, ProviderError, Result};
use tracing::debug;

/// Environment variable holding the account API key.
pub const ENV_API_KEY: &str = "BUNNY_API_KEY";
/// Environment variable overriding the API base URL.
pub const ENV_API_URL: &str = "BUNNY_API_URL";
/// Environment variable overriding the request timeout.
pub const ENV_TIMEOUT_SECS: &str = "BUNNY_TIMEOUT_SECS";

/// Default Bunny API base URL.
pub const DEFAULT_API_URL: &str = "https://api.bunny.net";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Settings needed to talk to the Bunny API.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Account API key.
    pub api_key: String,
    /// API base URL.
    pub api_url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl ProviderConfig {
    /// Creates a configuration with default URL and timeout.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_url: DEFAULT_API_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Overrides the API base URL.
    #[must_use]
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Overrides the request timeout.
    #[must_use]
    pub const fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Loads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is missing or a value is invalid.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads the configuration through `lookup`, which returns the value
    /// of an environment variable.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is missing or a value is invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_key = lookup(ENV_API_KEY)
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                ProviderError::Config(ConfigError::MissingEnvVar {
                    name: ENV_API_KEY.to_string(),
                })
            })?;

        let mut config = Self::new(api_key);

        if let Some(url) = lookup(ENV_API_URL) {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ProviderError::Config(ConfigError::InvalidValue {
                    name: ENV_API_URL.to_string(),
                    message: format!("'{url}' is not an http(s) URL"),
                }));
            }
            debug!("Overriding API URL from environment");
            config.api_url = url;
        }

        if let Some(timeout) = lookup(ENV_TIMEOUT_SECS) {
            config.timeout_secs = timeout.parse().map_err(|e| {
                ProviderError::Config(ConfigError::InvalidValue {
                    name: ENV_TIMEOUT_SECS.to_string(),
                    message: format!("'{timeout}': {e}"),
                })
            })?;
        }

        Ok(config)
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &"<redacted>")
            .field("api_url", &self.api_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}
