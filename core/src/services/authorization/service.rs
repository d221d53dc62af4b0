//! Request authenticator implementation

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

use crate::errors::{AuthError, DomainResult, TokenError};
use crate::repositories::{ProfileRepository, TokenDenylist, UserRepository};
use crate::services::token::TokenService;

use super::context::RequestContext;

/// Turns a bearer token into a [`RequestContext`]
///
/// Object safe so the HTTP layer can hold it as `Arc<dyn RequestAuthenticator>`.
#[async_trait]
pub trait RequestAuthenticator: Send + Sync {
    async fn authenticate(&self, bearer_token: &str) -> DomainResult<RequestContext>;
}

pub struct AuthorizationService<U: UserRepository, P: ProfileRepository, D: TokenDenylist> {
    users: Arc<U>,
    profiles: Arc<P>,
    tokens: Arc<TokenService<D>>,
}

impl<U, P, D> AuthorizationService<U, P, D>
where
    U: UserRepository,
    P: ProfileRepository,
    D: TokenDenylist,
{
    pub fn new(users: Arc<U>, profiles: Arc<P>, tokens: Arc<TokenService<D>>) -> Self {
        Self {
            users,
            profiles,
            tokens,
        }
    }
}

#[async_trait]
impl<U, P, D> RequestAuthenticator for AuthorizationService<U, P, D>
where
    U: UserRepository,
    P: ProfileRepository,
    D: TokenDenylist,
{
    async fn authenticate(&self, bearer_token: &str) -> DomainResult<RequestContext> {
        let claims = self.tokens.verify_access(bearer_token).map_err(|e| match e {
            TokenError::TokenExpired => AuthError::unauthenticated("token expired"),
            _ => AuthError::unauthenticated("token invalid"),
        })?;

        let user_id = claims
            .user_id()
            .map_err(|_| AuthError::unauthenticated("token invalid"))?;
        let role = claims
            .role
            .ok_or_else(|| AuthError::unauthenticated("token carries no role"))?;

        let mut user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AuthError::unauthenticated("user not found"))?;

        let now = Utc::now();
        if user.has_expired_lock(now) {
            if self.users.release_expired_lock(user.id, now).await? {
                tracing::info!(user_id = %user.id, event = "account_lock_expired", "Lock lifted");
            }
            user = self
                .users
                .find_by_id(user_id)
                .await?
                .ok_or_else(|| AuthError::unauthenticated("user not found"))?;
        }
        user.ensure_accessible(now)?;

        let profiles = self.profiles.find_by_user(user.id).await?;
        let active_profile = profiles
            .iter()
            .find(|p| p.role == role)
            .cloned()
            .ok_or_else(|| AuthError::unauthenticated("role no longer held"))?;
        active_profile.ensure_active()?;

        // After the status checks: suspension also sets a revocation cutoff
        if self.tokens.is_revoked(&claims).await? {
            return Err(AuthError::unauthenticated("token revoked").into());
        }

        Ok(RequestContext {
            user,
            active_profile,
            profiles,
            token_expires_at: claims.expires_at(),
            token_id: claims.jti,
        })
    }
}
