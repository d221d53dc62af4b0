//! Domain-specific error types for authentication and related operations
//!
//! Messages here are developer-facing. The presentation layer maps each
//! variant to a stable error code and HTTP status.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::value_objects::role::Role;

/// Authentication-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid phone format: {phone}")]
    InvalidPhone { phone: String },

    #[error("Invalid verification code")]
    InvalidCode { remaining_attempts: Option<u32> },

    #[error("Verification code expired")]
    CodeExpired,

    #[error("Maximum attempts exceeded, new code available in {retry_after_seconds} seconds")]
    TooManyAttempts { retry_after_seconds: u64 },

    #[error("Rate limit exceeded, retry after {retry_after_seconds} seconds")]
    RateLimited { retry_after_seconds: u64 },

    #[error("Role already registered for this phone: {role}")]
    RoleAlreadyExists { role: Role },

    #[error("No account found for this phone")]
    NoAccount,

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Account deactivated")]
    AccountDeactivated,

    #[error("Account suspended")]
    AccountSuspended { reason: Option<String> },

    #[error("Account locked")]
    AccountLocked { until: Option<DateTime<Utc>> },

    #[error("Profile suspended: {role}")]
    ProfileSuspended { role: Role },

    #[error("Profile pending approval: {role}")]
    PendingApproval { role: Role },

    #[error("Profile removed: {role}")]
    ProfileRemoved { role: Role },

    #[error("Unauthenticated: {reason}")]
    Unauthenticated { reason: String },

    #[error("Forbidden")]
    Forbidden {
        required: Vec<Role>,
        actual: Option<Role>,
    },

    #[error("SMS delivery failed")]
    DeliveryFailed,
}

impl AuthError {
    pub fn unauthenticated(reason: impl Into<String>) -> Self {
        AuthError::Unauthenticated {
            reason: reason.into(),
        }
    }
}

/// Token-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    TokenInvalid,

    #[error("Token revoked")]
    TokenRevoked,

    #[error("Token generation failed")]
    TokenGenerationFailed,
}

/// Input validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field: {field}")]
    RequiredField { field: String },

    #[error("Invalid format: {field}")]
    InvalidFormat { field: String },

    #[error("Invalid length: {field} (expected: {expected}, actual: {actual})")]
    InvalidLength {
        field: String,
        expected: usize,
        actual: usize,
    },
}
