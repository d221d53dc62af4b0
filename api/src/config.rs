//! Server configuration
//!
//! Plain environment variables (`SERVER_PORT`, `REDIS_URL`, ...) are read
//! first through `AppConfig::from_env`. Any key can then be overridden with a
//! `PROPAUTH__`-prefixed variable using `__` as the path separator, e.g.
//! `PROPAUTH__SERVER__PORT=9090` or `PROPAUTH__OTP__TTL_SECONDS=120`.

use config::{ConfigError, Environment as EnvSource};
use serde::{Deserialize, Serialize};
use std::ops::Deref;
use std::str::FromStr;

use pa_shared::AppConfig;

/// Where OTP records, counters and identities are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// Redis for OTPs, rate limits and revocation; MySQL for identities
    #[default]
    Persistent,
    /// Process-local stores, development only
    Memory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "persistent" | "redis" | "mysql" => Ok(StorageBackend::Persistent),
            "memory" | "in_memory" => Ok(StorageBackend::Memory),
            other => Err(format!("Unknown storage backend: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(flatten)]
    pub app: AppConfig,

    #[serde(default)]
    pub storage: StorageBackend,
}

impl Config {
    /// Load configuration from the environment
    pub fn load() -> Result<Self, ConfigError> {
        let defaults = Self::from_env();
        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&defaults)?)
            .add_source(
                EnvSource::with_prefix("PROPAUTH")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        settings.try_deserialize()
    }

    /// Environment variables only, without `PROPAUTH__` overrides
    pub fn from_env() -> Self {
        Self {
            app: AppConfig::from_env(),
            storage: std::env::var("STORAGE_BACKEND")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_default(),
        }
    }
}

impl Deref for Config {
    type Target = AppConfig;

    fn deref(&self) -> &Self::Target {
        &self.app
    }
}
