//! # Infrastructure Layer
//!
//! Concrete implementations of the PropAuth core traits:
//! - **Cache**: Redis client, the OTP store with an atomic settle script and
//!   the token denylist
//! - **Services**: the Redis sliding-window rate limiter behind the abuse guard
//! - **Database**: MySQL user and profile repositories using SQLx
//! - **SMS**: mock and Twilio gateways
//!
//! ## Features
//!
//! - `mysql`: Enable MySQL database support (default)
//! - `redis-cache`: Enable Redis caching support (default)
//! - `twilio-sms`: Enable the Twilio SMS gateway (default)

use pa_core::errors::DomainError;

/// Database module - MySQL implementations using SQLx
#[cfg(feature = "mysql")]
pub mod database;

/// SMS service module - External SMS providers
pub mod sms;

/// Cache module - Redis client and Redis-backed stores
pub mod cache;

/// Services module - Infrastructure service implementations
pub mod services;

/// Configuration re-exported from the shared crate
pub mod config {
    pub use pa_shared::config::{CacheConfig, DatabaseConfig, RateLimitConfig, SmsConfig};
}

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// Database connection error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Redis cache error
    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    /// HTTP request error for external services
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// SMS service error
    #[error("SMS service error: {0}")]
    Sms(String),

    /// Stored data that could not be decoded
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

impl From<InfrastructureError> for DomainError {
    fn from(err: InfrastructureError) -> Self {
        DomainError::Internal {
            message: err.to_string(),
        }
    }
}
