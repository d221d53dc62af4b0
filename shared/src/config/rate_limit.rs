//! Rate limiting configuration module

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A sliding-window limit: at most `limit` events per `window_seconds`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct RateLimitPolicy {
    pub limit: u32,
    pub window_seconds: u64,
}

impl RateLimitPolicy {
    pub const fn new(limit: u32, window_seconds: u64) -> Self {
        Self {
            limit,
            window_seconds,
        }
    }

    /// Parse `"<limit>"` or `"<limit>/<window_seconds>"`, keeping this
    /// policy's window when only a limit is given
    fn parse_with_default_window(value: &str, window_seconds: u64) -> Option<Self> {
        match value.split_once('/') {
            Some(_) => value.parse().ok(),
            None => value.trim().parse().ok().map(|limit| Self::new(limit, window_seconds)),
        }
    }

    fn from_env(key: &str, default: Self) -> Self {
        std::env::var(key)
            .ok()
            .and_then(|v| Self::parse_with_default_window(&v, default.window_seconds))
            .filter(|p| p.limit > 0 && p.window_seconds > 0)
            .unwrap_or(default)
    }
}

impl FromStr for RateLimitPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (limit, window) = s
            .split_once('/')
            .ok_or_else(|| format!("expected <limit>/<window_seconds>, got '{}'", s))?;
        let limit = limit
            .trim()
            .parse()
            .map_err(|_| format!("invalid limit in '{}'", s))?;
        let window_seconds = window
            .trim()
            .parse()
            .map_err(|_| format!("invalid window in '{}'", s))?;
        Ok(Self::new(limit, window_seconds))
    }
}

/// Rate limiting configuration for the abuse guard
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Enable rate limiting
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// First-time OTP requests per phone
    pub otp_request_per_phone: RateLimitPolicy,

    /// OTP requests (including resends) per IP
    pub otp_request_per_ip: RateLimitPolicy,

    /// Resends per phone, stricter than first-time requests
    pub otp_resend_per_phone: RateLimitPolicy,

    /// Verification attempts per phone
    pub otp_verify_per_phone: RateLimitPolicy,

    /// Verification attempts per IP
    pub otp_verify_per_ip: RateLimitPolicy,

    /// General authentication traffic (refresh, role selection) per IP
    pub auth_per_ip: RateLimitPolicy,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            otp_request_per_phone: RateLimitPolicy::new(5, 3600),
            otp_request_per_ip: RateLimitPolicy::new(20, 3600),
            otp_resend_per_phone: RateLimitPolicy::new(3, 3600),
            otp_verify_per_phone: RateLimitPolicy::new(10, 900),
            otp_verify_per_ip: RateLimitPolicy::new(50, 900),
            auth_per_ip: RateLimitPolicy::new(60, 60),
        }
    }
}

impl RateLimitConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            enabled: std::env::var("RATE_LIMIT_ENABLED")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
            otp_request_per_phone: RateLimitPolicy::from_env(
                "OTP_REQUEST_RATE_LIMIT",
                d.otp_request_per_phone,
            ),
            otp_request_per_ip: RateLimitPolicy::from_env(
                "OTP_REQUEST_IP_RATE_LIMIT",
                d.otp_request_per_ip,
            ),
            otp_resend_per_phone: RateLimitPolicy::from_env(
                "OTP_RESEND_RATE_LIMIT",
                d.otp_resend_per_phone,
            ),
            otp_verify_per_phone: RateLimitPolicy::from_env(
                "OTP_VERIFY_RATE_LIMIT",
                d.otp_verify_per_phone,
            ),
            otp_verify_per_ip: RateLimitPolicy::from_env(
                "OTP_VERIFY_IP_RATE_LIMIT",
                d.otp_verify_per_ip,
            ),
            auth_per_ip: RateLimitPolicy::from_env("AUTH_IP_RATE_LIMIT", d.auth_per_ip),
        }
    }

    /// Relaxed limits for local development
    pub fn development() -> Self {
        Self {
            otp_request_per_phone: RateLimitPolicy::new(100, 3600),
            otp_resend_per_phone: RateLimitPolicy::new(50, 3600),
            ..Default::default()
        }
    }
}

fn default_enabled() -> bool {
    true
}
