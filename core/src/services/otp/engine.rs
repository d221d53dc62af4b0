//! OTP engine implementation

use chrono::{DateTime, Duration, Utc};
use constant_time_eq::constant_time_eq;
use pa_shared::config::otp::OtpConfig;
use pa_shared::utils::phone::{is_valid_e164, mask_phone_number};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::otp::{OtpKey, OtpRecord};
use crate::domain::value_objects::auth_outcome::OtpDispatch;
use crate::errors::{AuthError, DomainResult, ValidationError};
use crate::services::abuse::{AbuseGuard, RateLimitAction, RateLimiterTrait};

use super::code::{generate_salt, hash_code, CodeGenerator};
use super::traits::{OtpSettlement, OtpStore, SmsServiceTrait};

/// Proof that a code was verified, handed to the role resolver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedOtp {
    pub key: OtpKey,
    pub record_id: Uuid,
    pub verified_at: DateTime<Utc>,
}

pub struct OtpEngine<S: SmsServiceTrait, O: OtpStore, R: RateLimiterTrait> {
    sms_service: Arc<S>,
    store: Arc<O>,
    guard: Arc<AbuseGuard<R>>,
    generator: Arc<dyn CodeGenerator>,
    config: OtpConfig,
}

impl<S: SmsServiceTrait, O: OtpStore, R: RateLimiterTrait> OtpEngine<S, O, R> {
    pub fn new(
        sms_service: Arc<S>,
        store: Arc<O>,
        guard: Arc<AbuseGuard<R>>,
        generator: Arc<dyn CodeGenerator>,
        config: OtpConfig,
    ) -> Self {
        Self {
            sms_service,
            store,
            guard,
            generator,
            config,
        }
    }

    pub fn config(&self) -> &OtpConfig {
        &self.config
    }

    /// Reject anything that is not E.164 before a store is touched
    pub fn validate_phone(&self, phone: &str) -> DomainResult<()> {
        if !is_valid_e164(phone) || !self.sms_service.is_valid_phone_number(phone) {
            return Err(AuthError::InvalidPhone {
                phone: phone.to_string(),
            }
            .into());
        }
        Ok(())
    }

    fn validate_code(&self, code: &str) -> DomainResult<()> {
        if code.is_empty() {
            return Err(ValidationError::RequiredField {
                field: "code".to_string(),
            }
            .into());
        }
        if !code.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValidationError::InvalidFormat {
                field: "code".to_string(),
            }
            .into());
        }
        if code.len() != self.config.length {
            return Err(ValidationError::InvalidLength {
                field: "code".to_string(),
                expected: self.config.length,
                actual: code.len(),
            }
            .into());
        }
        Ok(())
    }

    /// Issue a fresh code for `key`, replacing any live one
    ///
    /// # Errors
    /// * `InvalidPhone` - `key.phone` is not E.164
    /// * `RateLimited` - the phone or IP request budget is spent
    /// * `DeliveryFailed` - the SMS gateway refused; the code stays verifiable
    ///   for the configured grace period
    pub async fn request(&self, key: &OtpKey, ip: Option<&str>) -> DomainResult<OtpDispatch> {
        self.validate_phone(&key.phone)?;
        self.guard
            .guard(RateLimitAction::OtpRequest, Some(&key.phone), ip)
            .await?;
        self.issue(key).await
    }

    /// Like [`request`](Self::request) but with the stricter resend budget and
    /// a minimum interval since the outstanding code was issued
    ///
    /// An exhausted code still holds the cooldown, so spending the attempt
    /// budget does not buy an immediate replacement.
    pub async fn resend(&self, key: &OtpKey, ip: Option<&str>) -> DomainResult<OtpDispatch> {
        self.validate_phone(&key.phone)?;

        let now = Utc::now();
        if let Some(existing) = self.store.get(key).await? {
            let available_at = self.resend_available_at(&existing);
            if !existing.consumed() && !existing.is_expired_at(now) && now < available_at {
                let retry_after_seconds = (available_at - now).num_seconds().max(1) as u64;
                tracing::warn!(
                    phone = %mask_phone_number(&key.phone),
                    retry_after_seconds,
                    event = "otp_resend_cooldown",
                    "Resend requested before cooldown elapsed"
                );
                return Err(AuthError::RateLimited { retry_after_seconds }.into());
            }
        }

        self.guard
            .guard(RateLimitAction::OtpResend, Some(&key.phone), ip)
            .await?;
        self.issue(key).await
    }

    fn resend_available_at(&self, record: &OtpRecord) -> DateTime<Utc> {
        record.issued_at + Duration::seconds(self.config.resend_cooldown_seconds)
    }

    async fn issue(&self, key: &OtpKey) -> DomainResult<OtpDispatch> {
        let code = self.generator.generate(self.config.length);
        let salt = generate_salt();
        let record = OtpRecord::new(
            key.clone(),
            hash_code(&salt, &code),
            salt,
            self.config.ttl_seconds,
            self.config.max_attempts,
        );

        self.store.put(&record).await?;

        match self.sms_service.send_verification_code(&key.phone, &code).await {
            Ok(message_id) => {
                tracing::info!(
                    phone = %mask_phone_number(&key.phone),
                    purpose = %key.purpose,
                    scope = key.scope.as_str(),
                    message_id = %message_id,
                    event = "otp_issued",
                    "Verification code sent"
                );
                Ok(OtpDispatch {
                    message_id,
                    expires_at: record.expires_at,
                    resend_available_at: self.resend_available_at(&record),
                    attempts_allowed: record.attempts_remaining,
                })
            }
            Err(error) => {
                let grace_until =
                    record.issued_at + Duration::seconds(self.config.delivery_grace_seconds);
                self.store.clamp_expiry(key, record.id, grace_until).await?;
                tracing::error!(
                    phone = %mask_phone_number(&key.phone),
                    error = %error,
                    event = "otp_delivery_failed",
                    "Failed to send verification code"
                );
                Err(AuthError::DeliveryFailed.into())
            }
        }
    }

    /// Check `code` against the live record for `key`
    ///
    /// A wrong code costs one attempt and leaves the record in place. Once the
    /// budget is spent every later attempt, right or wrong, fails with
    /// `TooManyAttempts` until a new code is requested, carrying the wait
    /// before a resend is accepted.
    pub async fn verify(
        &self,
        key: &OtpKey,
        code: &str,
        ip: Option<&str>,
    ) -> DomainResult<VerifiedOtp> {
        self.validate_phone(&key.phone)?;
        self.validate_code(code)?;
        self.guard
            .guard(RateLimitAction::OtpVerify, Some(&key.phone), ip)
            .await?;

        let now = Utc::now();
        let record = self
            .store
            .get(key)
            .await?
            .ok_or(AuthError::CodeExpired)?;

        let candidate = hash_code(&record.salt, code);
        let matched = constant_time_eq(candidate.as_bytes(), record.code_hash.as_bytes());

        let settlement = self.store.settle(key, record.id, matched, now).await?;
        let masked = mask_phone_number(&key.phone);

        match settlement {
            OtpSettlement::Consumed => {
                self.guard.reset(RateLimitAction::OtpVerify, &key.phone).await?;
                tracing::info!(
                    phone = %masked,
                    purpose = %key.purpose,
                    event = "otp_verified",
                    "Verification code accepted"
                );
                Ok(VerifiedOtp {
                    key: key.clone(),
                    record_id: record.id,
                    verified_at: now,
                })
            }
            OtpSettlement::Mismatch { attempts_remaining } => {
                tracing::warn!(
                    phone = %masked,
                    attempts_remaining,
                    event = "otp_mismatch",
                    "Wrong verification code"
                );
                Err(AuthError::InvalidCode {
                    remaining_attempts: Some(attempts_remaining),
                }
                .into())
            }
            OtpSettlement::Exhausted => {
                let retry_after_seconds =
                    (self.resend_available_at(&record) - now).num_seconds().max(0) as u64;
                tracing::warn!(
                    phone = %masked,
                    retry_after_seconds,
                    event = "otp_exhausted",
                    "Attempt budget spent"
                );
                Err(AuthError::TooManyAttempts { retry_after_seconds }.into())
            }
            OtpSettlement::AlreadyConsumed | OtpSettlement::Superseded => {
                Err(AuthError::InvalidCode {
                    remaining_attempts: None,
                }
                .into())
            }
            OtpSettlement::Expired | OtpSettlement::Missing => Err(AuthError::CodeExpired.into()),
        }
    }
}
