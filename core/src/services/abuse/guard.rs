//! Policy table and key layout for the abuse guard

use pa_shared::config::rate_limit::{RateLimitConfig, RateLimitPolicy};
use pa_shared::utils::phone::mask_phone_number;
use std::fmt;
use std::sync::Arc;

use crate::domain::entities::otp::hash_phone;
use crate::errors::{AuthError, DomainResult};

use super::limiter::{RateLimitStatus, RateLimiterTrait};

/// Guarded operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateLimitAction {
    OtpRequest,
    OtpResend,
    OtpVerify,
    /// Any other authentication traffic (refresh, role selection)
    Auth,
}

impl RateLimitAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            RateLimitAction::OtpRequest => "otp_request",
            RateLimitAction::OtpResend => "otp_resend",
            RateLimitAction::OtpVerify => "otp_verify",
            RateLimitAction::Auth => "auth",
        }
    }
}

impl fmt::Display for RateLimitAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct AbuseGuard<R: RateLimiterTrait> {
    limiter: Arc<R>,
    config: RateLimitConfig,
}

impl<R: RateLimiterTrait> AbuseGuard<R> {
    pub fn new(limiter: Arc<R>, config: RateLimitConfig) -> Self {
        Self { limiter, config }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    fn phone_policy(&self, action: RateLimitAction) -> Option<RateLimitPolicy> {
        match action {
            RateLimitAction::OtpRequest => Some(self.config.otp_request_per_phone),
            RateLimitAction::OtpResend => Some(self.config.otp_resend_per_phone),
            RateLimitAction::OtpVerify => Some(self.config.otp_verify_per_phone),
            RateLimitAction::Auth => None,
        }
    }

    fn ip_policy(&self, action: RateLimitAction) -> RateLimitPolicy {
        match action {
            // Resends share the per-IP request budget
            RateLimitAction::OtpRequest | RateLimitAction::OtpResend => {
                self.config.otp_request_per_ip
            }
            RateLimitAction::OtpVerify => self.config.otp_verify_per_ip,
            RateLimitAction::Auth => self.config.auth_per_ip,
        }
    }

    fn phone_key(action: RateLimitAction, phone: &str) -> String {
        format!("rl:{}:phone:{}", action, hash_phone(phone))
    }

    fn ip_key(action: RateLimitAction, ip: &str) -> String {
        let bucket = match action {
            RateLimitAction::OtpResend => RateLimitAction::OtpRequest,
            other => other,
        };
        format!("rl:{}:ip:{}", bucket, ip)
    }

    /// Count an attempt against the phone and IP budgets of `action`
    ///
    /// Fails with `RateLimited` carrying the retry-after hint of the budget
    /// that is exhausted.
    pub async fn guard(
        &self,
        action: RateLimitAction,
        phone: Option<&str>,
        ip: Option<&str>,
    ) -> DomainResult<()> {
        if !self.config.enabled {
            return Ok(());
        }

        if let (Some(phone), Some(policy)) = (phone, self.phone_policy(action)) {
            let status = self
                .limiter
                .check_and_record(&Self::phone_key(action, phone), policy)
                .await?;
            if let RateLimitStatus::Exceeded { retry_after_seconds } = status {
                tracing::warn!(
                    phone = %mask_phone_number(phone),
                    action = %action,
                    retry_after_seconds,
                    event = "rate_limit_exceeded",
                    "Phone rate limit exceeded"
                );
                return Err(AuthError::RateLimited { retry_after_seconds }.into());
            }
        }

        if let Some(ip) = ip {
            let status = self
                .limiter
                .check_and_record(&Self::ip_key(action, ip), self.ip_policy(action))
                .await?;
            if let RateLimitStatus::Exceeded { retry_after_seconds } = status {
                tracing::warn!(
                    ip = ip,
                    action = %action,
                    retry_after_seconds,
                    event = "rate_limit_exceeded",
                    "IP rate limit exceeded"
                );
                return Err(AuthError::RateLimited { retry_after_seconds }.into());
            }
        }

        Ok(())
    }

    /// Clear the per-phone budget of `action`, e.g. verify attempts after a success
    pub async fn reset(&self, action: RateLimitAction, phone: &str) -> DomainResult<()> {
        self.limiter.reset(&Self::phone_key(action, phone)).await
    }
}
