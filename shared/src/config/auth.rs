//! Authentication configuration

use serde::{Deserialize, Serialize};

use super::env_or;

pub const DEFAULT_SIGNING_SECRET: &str = "development-secret-please-change-in-production";

/// JWT signing configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JwtConfig {
    /// HMAC secret for signing tokens
    pub secret: String,

    /// Access token lifetime in seconds
    pub access_token_ttl: i64,

    /// Refresh token lifetime in seconds
    pub refresh_token_ttl: i64,

    /// Role-selection token lifetime in seconds
    pub selection_token_ttl: i64,

    /// `iss` claim
    pub issuer: String,

    /// `aud` claim
    pub audience: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: DEFAULT_SIGNING_SECRET.to_string(),
            access_token_ttl: 900,         // 15 minutes
            refresh_token_ttl: 2_592_000,  // 30 days
            selection_token_ttl: 300,      // 5 minutes
            issuer: String::from("propauth"),
            audience: String::from("propauth-api"),
        }
    }
}

impl JwtConfig {
    /// Create a new JWT configuration with secret
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ..Default::default()
        }
    }

    /// Check if using default secret (security warning)
    pub fn is_using_default_secret(&self) -> bool {
        self.secret == DEFAULT_SIGNING_SECRET
    }
}

/// Complete authentication configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    pub jwt: JwtConfig,

    /// Failed OTP verifications before the user is locked
    pub account_lock_threshold: u32,

    /// Lock duration once the threshold is reached
    pub account_lock_minutes: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt: JwtConfig::default(),
            account_lock_threshold: 10,
            account_lock_minutes: 30,
        }
    }
}

impl AuthConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let jwt_defaults = JwtConfig::default();

        Self {
            jwt: JwtConfig {
                secret: std::env::var("TOKEN_SIGNING_SECRET")
                    .unwrap_or_else(|_| DEFAULT_SIGNING_SECRET.to_string()),
                access_token_ttl: env_or("ACCESS_TOKEN_TTL", jwt_defaults.access_token_ttl),
                refresh_token_ttl: env_or("REFRESH_TOKEN_TTL", jwt_defaults.refresh_token_ttl),
                selection_token_ttl: env_or(
                    "SELECTION_TOKEN_TTL",
                    jwt_defaults.selection_token_ttl,
                ),
                ..jwt_defaults
            },
            account_lock_threshold: env_or(
                "ACCOUNT_LOCK_THRESHOLD",
                defaults.account_lock_threshold,
            ),
            account_lock_minutes: env_or("ACCOUNT_LOCK_MINUTES", defaults.account_lock_minutes),
        }
    }
}
