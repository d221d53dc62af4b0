//! Token revocation bookkeeping.
//!
//! Tokens themselves are stateless JWTs. The server only remembers which
//! token ids were revoked (until their natural expiry) and, per user, the
//! instant before which every issued token is void.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::DomainError;

#[async_trait]
pub trait TokenDenylist: Send + Sync {
    /// Mark a token id as revoked until `expires_at`
    ///
    /// This is an atomic set-if-absent: it returns `true` only for the caller
    /// that revoked the id first. Refresh rotation relies on this to make a
    /// token usable exactly once.
    async fn revoke(&self, jti: &str, expires_at: DateTime<Utc>) -> Result<bool, DomainError>;

    async fn is_revoked(&self, jti: &str) -> Result<bool, DomainError>;

    /// Void every token of the user issued before `at`
    async fn revoke_all_for_user(&self, user_id: Uuid, at: DateTime<Utc>)
        -> Result<(), DomainError>;

    /// The user's revocation cutoff, if one was ever set
    async fn revoked_before(&self, user_id: Uuid) -> Result<Option<DateTime<Utc>>, DomainError>;
}
