//! Configuration module with business-specific sub-modules
//!
//! This module organizes configuration into logical areas:
//! - `auth` - token signing and account lockout
//! - `otp` - one-time code shape and lifetime
//! - `rate_limit` - abuse guard windows per action
//! - `cache` - Redis connection
//! - `database` - MySQL pool
//! - `sms` - SMS gateway selection and credentials
//! - `environment` - environment detection and logging
//! - `server` - HTTP server and CORS

pub mod auth;
pub mod cache;
pub mod database;
pub mod environment;
pub mod otp;
pub mod rate_limit;
pub mod server;
pub mod sms;

use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub use auth::{AuthConfig, JwtConfig};
pub use cache::CacheConfig;
pub use database::DatabaseConfig;
pub use environment::{Environment, LoggingConfig};
pub use otp::OtpConfig;
pub use rate_limit::{RateLimitConfig, RateLimitPolicy};
pub use server::{CorsConfig, ServerConfig};
pub use sms::SmsConfig;

/// Complete application configuration combining all sub-configurations
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    pub auth: AuthConfig,
    pub otp: OtpConfig,
    pub rate_limit: RateLimitConfig,
    pub sms: SmsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let environment = Environment::from_env();
        Self {
            environment,
            server: ServerConfig::from_env(),
            cors: CorsConfig::from_env(),
            database: DatabaseConfig::from_env(),
            cache: CacheConfig::from_env(),
            auth: AuthConfig::from_env(),
            otp: OtpConfig::from_env(),
            rate_limit: RateLimitConfig::from_env(),
            sms: SmsConfig::from_env(),
            logging: LoggingConfig::for_environment(environment),
        }
    }
}

/// Read and parse an environment variable, falling back to `default` when
/// the variable is missing or does not parse.
pub(crate) fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
