//! Connection configuration for `StratClient`.
//!
//! Defaults point at a local node with a 30 second timeout. `from_env`
//! layers `STRAT_`-prefixed environment variables over the defaults.

use std::fmt;
use std::time::Duration;

use figment::providers::{Env, Serialized};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "http://localhost:3000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("api_url cannot be empty")]
    EmptyApiUrl,

    #[error("timeout_secs must be at least 1")]
    ZeroTimeout,
}

/// Immutable connection settings of one client instance.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ClientConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `STRAT_API_URL`, `STRAT_API_KEY` and
    /// `STRAT_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config: ClientConfig = Figment::new()
            .merge(Serialized::defaults(ClientConfig::default()))
            .merge(Env::prefixed("STRAT_"))
            .extract()
            .map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_url.trim().is_empty() {
            return Err(ConfigError::EmptyApiUrl);
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn defaults_point_at_local_node() {
        let config = ClientConfig::default();
        assert_eq!(config.api_url, "http://localhost:3000");
        assert!(config.api_key.is_none());
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn env_overrides_defaults() {
        Jail::expect_with(|jail| {
            jail.set_env("STRAT_API_URL", "http://node.example:8080");
            jail.set_env("STRAT_API_KEY", "secret");
            jail.set_env("STRAT_TIMEOUT_SECS", "5");

            let config = ClientConfig::from_env().expect("config loads");
            assert_eq!(config.api_url, "http://node.example:8080");
            assert_eq!(config.api_key.as_deref(), Some("secret"));
            assert_eq!(config.timeout_secs, 5);
            Ok(())
        });
    }

    #[test]
    fn env_absent_keeps_defaults() {
        Jail::expect_with(|_jail| {
            let config = ClientConfig::from_env().expect("config loads");
            assert_eq!(config, ClientConfig::default());
            Ok(())
        });
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = ClientConfig::default().with_timeout_secs(0).validate().unwrap_err();
        assert!(matches!(err, ConfigError::ZeroTimeout));
    }

    #[test]
    fn empty_url_is_rejected() {
        let err = ClientConfig::default().with_api_url("  ").validate().unwrap_err();
        assert!(matches!(err, ConfigError::EmptyApiUrl));
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = ClientConfig::default().with_api_key("super-secret");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
