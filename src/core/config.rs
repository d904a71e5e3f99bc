//! Run configuration.
//!
//! [`Settings`] is built once at startup from, in order of precedence,
//! command-line overrides, the environment, the optional
//! `.secret-migrator.toml` file and built-in defaults, then passed by
//! reference to everything that needs it.

use std::path::Path;
use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;
use tracing::debug;
use zeroize::Zeroizing;

use crate::core::constants;
use crate::core::platform::{RetryPolicy, SecretKind};
use crate::error::{ConfigError, Result};

/// Contents of `.secret-migrator.toml`. Tokens are never read from it.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub api: ApiSection,
    #[serde(default)]
    pub run: RunSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiSection {
    pub url: Option<String>,
    pub kind: Option<SecretKind>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunSection {
    pub concurrency: Option<usize>,
    pub max_retries: Option<u32>,
    pub retry_base_ms: Option<u64>,
    pub key_max_age_secs: Option<u64>,
}

impl FileConfig {
    /// Load the config file if it exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ReadFile` or `ConfigError::Parse`.
    pub fn load(path: impl AsRef<Path>) -> Result<Option<Self>> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(None);
        }
        debug!(path = %path.display(), "loading config file");
        let contents = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        let config = toml::from_str(&contents).map_err(ConfigError::Parse)?;
        Ok(Some(config))
    }
}

/// Values given on the command line; `None` defers to lower layers.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub api_url: Option<String>,
    pub kind: Option<SecretKind>,
    pub concurrency: Option<usize>,
    pub max_retries: Option<u32>,
}

/// Fully resolved configuration for one run.
#[derive(Clone)]
pub struct Settings {
    pub api_url: Url,
    pub kind: SecretKind,
    /// Secrets migrated at once; also bounds repository lookups per secret.
    pub concurrency: usize,
    pub retry: RetryPolicy,
    /// Re-fetch the destination key once it is older than this.
    pub key_max_age: Duration,
    token: Zeroizing<String>,
}

impl Settings {
    /// Resolve settings from overrides, the process environment and the
    /// config file in the working directory.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if no token is set or a value is invalid.
    pub fn load(overrides: &Overrides) -> Result<Self> {
        let file = FileConfig::load(constants::CONFIG_FILE)?.unwrap_or_default();
        Self::resolve(overrides, file, |name| std::env::var(name).ok())
    }

    /// Resolve settings from explicit layers. `env` looks up a variable.
    pub fn resolve(
        overrides: &Overrides,
        file: FileConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let token = constants::TOKEN_ENV
            .iter()
            .filter_map(|name| env(name))
            .find(|t| !t.trim().is_empty())
            .ok_or(ConfigError::MissingToken)?;

        let raw_url = overrides
            .api_url
            .clone()
            .or(file.api.url)
            .unwrap_or_else(|| constants::DEFAULT_API_URL.to_string());
        let api_url = Url::parse(&raw_url).map_err(|e| ConfigError::InvalidValue {
            field: "api url",
            reason: format!("{}: {}", raw_url, e),
        })?;
        if api_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidValue {
                field: "api url",
                reason: format!("{} is not a base URL", raw_url),
            }
            .into());
        }

        let concurrency = overrides
            .concurrency
            .or(file.run.concurrency)
            .unwrap_or(constants::DEFAULT_CONCURRENCY);
        if concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                field: "concurrency",
                reason: "must be at least 1".to_string(),
            }
            .into());
        }

        let retry = RetryPolicy {
            max_retries: overrides
                .max_retries
                .or(file.run.max_retries)
                .unwrap_or(constants::DEFAULT_MAX_RETRIES),
            base: file
                .run
                .retry_base_ms
                .map(Duration::from_millis)
                .unwrap_or(constants::DEFAULT_RETRY_BASE),
            cap: constants::RETRY_CAP,
        };

        let settings = Self {
            api_url,
            kind: overrides.kind.or(file.api.kind).unwrap_or_default(),
            concurrency,
            retry,
            key_max_age: file
                .run
                .key_max_age_secs
                .map(Duration::from_secs)
                .unwrap_or(constants::DEFAULT_KEY_MAX_AGE),
            token: Zeroizing::new(token),
        };

        debug!(settings = ?settings, "resolved settings");
        Ok(settings)
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("api_url", &self.api_url.as_str())
            .field("kind", &self.kind)
            .field("concurrency", &self.concurrency)
            .field("retry", &self.retry)
            .field("key_max_age", &self.key_max_age)
            .field("token", &"<redacted>")
            .finish()
    }
}
