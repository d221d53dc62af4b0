//! One-time code configuration

use serde::{Deserialize, Serialize};

use super::env_or;

/// OTP shape, lifetime and attempt budget
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OtpConfig {
    /// Number of digits per code
    pub length: usize,

    /// Validity window in seconds
    pub ttl_seconds: i64,

    /// Wrong guesses allowed per record
    pub max_attempts: u32,

    /// Minimum seconds between two issuances for one key through resend
    pub resend_cooldown_seconds: i64,

    /// How long a record stays verifiable after its SMS dispatch failed
    pub delivery_grace_seconds: i64,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            length: 6,
            ttl_seconds: 300,
            max_attempts: 5,
            resend_cooldown_seconds: 30,
            delivery_grace_seconds: 120,
        }
    }
}

impl OtpConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            length: env_or("OTP_LENGTH", defaults.length).clamp(4, 10),
            ttl_seconds: env_or("OTP_TTL", defaults.ttl_seconds).max(30),
            max_attempts: env_or("OTP_MAX_ATTEMPTS", defaults.max_attempts).max(1),
            resend_cooldown_seconds: env_or(
                "OTP_RESEND_COOLDOWN",
                defaults.resend_cooldown_seconds,
            ),
            delivery_grace_seconds: env_or(
                "OTP_DELIVERY_GRACE",
                defaults.delivery_grace_seconds,
            ),
        }
    }
}
