//! Configuration for the authentication service

use pa_shared::config::{AuthConfig, OtpConfig, RateLimitConfig};

/// Configuration for the authentication service
#[derive(Debug, Clone, Default)]
pub struct AuthServiceConfig {
    pub otp: OtpConfig,
    pub rate_limit: RateLimitConfig,
    pub auth: AuthConfig,
}

impl AuthServiceConfig {
    pub fn from_env() -> Self {
        Self {
            otp: OtpConfig::from_env(),
            rate_limit: RateLimitConfig::from_env(),
            auth: AuthConfig::from_env(),
        }
    }
}
