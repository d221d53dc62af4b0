//! Traits for SMS delivery and OTP persistence

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entities::otp::{OtpKey, OtpRecord};
use crate::errors::DomainError;

/// Trait for SMS service integration
#[async_trait]
pub trait SmsServiceTrait: Send + Sync {
    /// Send a verification code via SMS, returning the gateway message id
    async fn send_verification_code(&self, phone: &str, code: &str) -> Result<String, String>;
    /// Check if the phone number format is valid
    fn is_valid_phone_number(&self, phone: &str) -> bool;
}

/// Outcome of settling one verification attempt against a stored record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpSettlement {
    /// The code matched and the record is now consumed
    Consumed,
    /// Wrong code; the attempt was counted. At zero the record is exhausted.
    Mismatch { attempts_remaining: u32 },
    /// The attempt budget was already spent
    Exhausted,
    /// The record was consumed by an earlier verification
    AlreadyConsumed,
    Expired,
    /// A newer code replaced the record the attempt was checked against
    Superseded,
    /// No record under this key
    Missing,
}

/// Storage for outstanding codes, at most one per key
///
/// Implementations must make `settle` an atomic check-and-set: of several
/// concurrent matching attempts on one record, exactly one observes
/// `Consumed`.
#[async_trait]
pub trait OtpStore: Send + Sync {
    /// Store a record, replacing any prior record under the same key
    async fn put(&self, record: &OtpRecord) -> Result<(), DomainError>;

    async fn get(&self, key: &OtpKey) -> Result<Option<OtpRecord>, DomainError>;

    /// Apply the result of one comparison to record `record_id`
    async fn settle(
        &self,
        key: &OtpKey,
        record_id: Uuid,
        matched: bool,
        now: DateTime<Utc>,
    ) -> Result<OtpSettlement, DomainError>;

    /// Bring the expiry of record `record_id` forward to `until` if it is later
    async fn clamp_expiry(
        &self,
        key: &OtpKey,
        record_id: Uuid,
        until: DateTime<Utc>,
    ) -> Result<(), DomainError>;
}
