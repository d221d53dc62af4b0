//! Token entities for JWT-based authentication.
//!
//! Tokens are not persisted. Revocation bookkeeping (denylisted token ids and
//! per-user cutoffs) lives behind the `TokenDenylist` trait.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::role::Role;
use crate::errors::TokenError;

/// What a token may be used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// Short-lived bearer credential carrying the active role
    Access,
    /// Long-lived credential carrying only the user id
    Refresh,
    /// Single-use ticket to pick a role after a role-agnostic login
    Selection,
}

/// Claims structure for JWT payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,

    /// Active role; only present on access tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,

    pub kind: TokenKind,

    /// Issued at timestamp
    pub iat: i64,

    /// Issue time in milliseconds, compared against revocation cutoffs.
    /// Missing on a token means it predates every cutoff.
    #[serde(default)]
    pub iat_ms: i64,

    /// Expiration timestamp
    pub exp: i64,

    /// Not before timestamp
    pub nbf: i64,

    pub iss: String,
    pub aud: String,

    /// JWT ID, used as the denylist key
    pub jti: String,
}

impl Claims {
    pub fn new(
        user_id: Uuid,
        role: Option<Role>,
        kind: TokenKind,
        ttl_seconds: i64,
        issuer: &str,
        audience: &str,
    ) -> Self {
        Self::issued_at_time(Utc::now(), user_id, role, kind, ttl_seconds, issuer, audience)
    }

    /// Claims issued at `issued_at` rather than the wall clock
    pub fn issued_at_time(
        issued_at: DateTime<Utc>,
        user_id: Uuid,
        role: Option<Role>,
        kind: TokenKind,
        ttl_seconds: i64,
        issuer: &str,
        audience: &str,
    ) -> Self {
        let now = issued_at.timestamp();
        Self {
            sub: user_id.to_string(),
            role,
            kind,
            iat: now,
            iat_ms: issued_at.timestamp_millis(),
            exp: now + ttl_seconds,
            nbf: now,
            iss: issuer.to_string(),
            aud: audience.to_string(),
            jti: Uuid::new_v4().to_string(),
        }
    }

    /// Parse the subject as a user id
    pub fn user_id(&self) -> Result<Uuid, TokenError> {
        Uuid::parse_str(&self.sub).map_err(|_| TokenError::TokenInvalid)
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.iat, 0).single().unwrap_or_else(Utc::now)
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0).single().unwrap_or_else(Utc::now)
    }

    /// Whether a user-wide revocation at `cutoff` covers this token.
    ///
    /// Millisecond precision and inclusive: a token minted in the same
    /// millisecond as the cutoff is revoked.
    pub fn revoked_by_cutoff(&self, cutoff: DateTime<Utc>) -> bool {
        self.iat_ms <= cutoff.timestamp_millis()
    }
}

/// Access and refresh tokens returned after authentication
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Always "Bearer"
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
    /// Refresh token lifetime in seconds
    pub refresh_expires_in: i64,
}

impl TokenPair {
    pub fn new(
        access_token: String,
        refresh_token: String,
        expires_in: i64,
        refresh_expires_in: i64,
    ) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in,
            refresh_expires_in,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_claims_user_id() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, Some(Role::Broker), TokenKind::Access, 900, "iss", "aud");

        assert_eq!(claims.user_id().unwrap(), user_id);
        assert_eq!(claims.exp - claims.iat, 900);
        assert_eq!(claims.role, Some(Role::Broker));
    }

    #[test]
    fn test_invalid_subject() {
        let mut claims = Claims::new(Uuid::new_v4(), None, TokenKind::Refresh, 60, "iss", "aud");
        claims.sub = "not-a-uuid".to_string();
        assert!(matches!(claims.user_id(), Err(TokenError::TokenInvalid)));
    }

    #[test]
    fn test_revoked_by_cutoff() {
        let claims = Claims::new(Uuid::new_v4(), None, TokenKind::Refresh, 60, "iss", "aud");
        assert!(claims.revoked_by_cutoff(Utc::now() + Duration::seconds(5)));
        assert!(!claims.revoked_by_cutoff(Utc::now() - Duration::seconds(5)));
    }

    #[test]
    fn test_cutoff_within_the_same_second() {
        let issued = Utc.timestamp_millis_opt(1_754_000_000_250).unwrap();
        let claims = Claims::issued_at_time(issued, Uuid::new_v4(), None, TokenKind::Refresh, 60, "iss", "aud");

        assert!(claims.revoked_by_cutoff(issued + Duration::milliseconds(400)));
        assert!(claims.revoked_by_cutoff(issued));
        assert!(!claims.revoked_by_cutoff(issued - Duration::milliseconds(1)));
    }

    #[test]
    fn test_missing_millisecond_issue_time_predates_cutoffs() {
        let claims = Claims::new(Uuid::new_v4(), None, TokenKind::Refresh, 60, "iss", "aud");
        let mut json = serde_json::to_value(&claims).unwrap();
        json.as_object_mut().unwrap().remove("iat_ms");

        let legacy: Claims = serde_json::from_value(json).unwrap();
        assert!(legacy.revoked_by_cutoff(Utc::now() - Duration::days(1)));
    }

    #[test]
    fn test_refresh_claims_omit_role() {
        let claims = Claims::new(Uuid::new_v4(), None, TokenKind::Refresh, 60, "iss", "aud");
        let json = serde_json::to_value(&claims).unwrap();
        assert!(json.get("role").is_none());
        assert_eq!(json["kind"], "refresh");
    }
}
