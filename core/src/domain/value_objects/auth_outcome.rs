//! Results handed back to the HTTP layer by the auth service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::role::Role;
use crate::domain::entities::token::TokenPair;

/// Outcome of a successful OTP verification or role selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AuthOutcome {
    /// A single role was resolved and tokens were issued
    Authenticated {
        user_id: Uuid,
        role: Role,
        tokens: TokenPair,
        /// A new profile was created by this verification
        profile_created: bool,
    },
    /// Several active roles exist; the caller must pick one
    RoleSelectionRequired {
        available_roles: Vec<Role>,
        selection_token: String,
        expires_in: i64,
    },
}

impl AuthOutcome {
    pub fn tokens(&self) -> Option<&TokenPair> {
        match self {
            AuthOutcome::Authenticated { tokens, .. } => Some(tokens),
            AuthOutcome::RoleSelectionRequired { .. } => None,
        }
    }
}

/// Result of requesting or resending a code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpDispatch {
    /// SMS gateway message id
    pub message_id: String,
    pub expires_at: DateTime<Utc>,
    /// Earliest time a resend will be accepted
    pub resend_available_at: DateTime<Utc>,
    pub attempts_allowed: u32,
}
