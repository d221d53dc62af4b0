//! Main token service implementation

use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use pa_shared::config::auth::JwtConfig;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::token::{Claims, TokenKind, TokenPair};
use crate::domain::value_objects::role::Role;
use crate::errors::{DomainResult, TokenError};
use crate::repositories::TokenDenylist;

/// Millisecond clock that never hands out the same instant twice.
///
/// Issue times and revocation cutoffs are drawn from it, so within one
/// process every token is strictly before or strictly after a cutoff.
#[derive(Debug, Default)]
pub(crate) struct IssueClock {
    last_ms: AtomicI64,
}

impl IssueClock {
    pub(crate) fn tick(&self) -> DateTime<Utc> {
        let now_ms = Utc::now().timestamp_millis();
        let previous = self
            .last_ms
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now_ms.max(last + 1))
            })
            .unwrap_or(now_ms);
        let ms = now_ms.max(previous + 1);
        Utc.timestamp_millis_opt(ms).single().unwrap_or_else(Utc::now)
    }
}

/// Service for minting and validating HS256 JWTs
///
/// Verification is pure: signature, `exp`, `nbf`, issuer and audience. Checks
/// that need the denylist live in the dedicated methods below.
pub struct TokenService<D: TokenDenylist> {
    denylist: Arc<D>,
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    clock: IssueClock,
}

impl<D: TokenDenylist> TokenService<D> {
    pub fn new(denylist: Arc<D>, config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_audience(&[config.audience.as_str()]);
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.leeway = 0;

        Self {
            denylist,
            config,
            encoding_key,
            decoding_key,
            validation,
            clock: IssueClock::default(),
        }
    }

    pub fn config(&self) -> &JwtConfig {
        &self.config
    }

    fn claims(&self, user_id: Uuid, role: Option<Role>, kind: TokenKind) -> Claims {
        let ttl = match kind {
            TokenKind::Access => self.config.access_token_ttl,
            TokenKind::Refresh => self.config.refresh_token_ttl,
            TokenKind::Selection => self.config.selection_token_ttl,
        };
        let mut claims = Claims::issued_at_time(
            self.clock.tick(),
            user_id,
            role,
            kind,
            ttl,
            &self.config.issuer,
            &self.config.audience,
        );
        // A burst can push the clock past the wall clock; nbf must not follow
        claims.nbf = claims.nbf.min(Utc::now().timestamp());
        claims
    }

    pub(crate) fn encode_jwt(&self, claims: &Claims) -> Result<String, TokenError> {
        let header = Header::new(Algorithm::HS256);
        encode(&header, claims, &self.encoding_key).map_err(|e| {
            tracing::error!(error = %e, event = "token_encode_failed", "Failed to sign token");
            TokenError::TokenGenerationFailed
        })
    }

    /// Mint an access token for `(user_id, role)` and a role-less refresh token
    pub fn issue(&self, user_id: Uuid, role: Role) -> Result<TokenPair, TokenError> {
        let access = self.claims(user_id, Some(role), TokenKind::Access);
        let refresh = self.claims(user_id, None, TokenKind::Refresh);

        Ok(TokenPair::new(
            self.encode_jwt(&access)?,
            self.encode_jwt(&refresh)?,
            self.config.access_token_ttl,
            self.config.refresh_token_ttl,
        ))
    }

    /// Validate signature, expiry, issuer and audience
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::TokenExpired,
                _ => TokenError::TokenInvalid,
            })
    }

    /// [`verify`](Self::verify) plus: must be an access token carrying a role
    pub fn verify_access(&self, token: &str) -> Result<Claims, TokenError> {
        let claims = self.verify(token)?;
        if claims.kind != TokenKind::Access || claims.role.is_none() {
            return Err(TokenError::TokenInvalid);
        }
        Ok(claims)
    }

    /// Whether a user-wide revocation or the denylist voids these claims
    pub async fn is_revoked(&self, claims: &Claims) -> DomainResult<bool> {
        let user_id = claims.user_id()?;
        if let Some(cutoff) = self.denylist.revoked_before(user_id).await? {
            if claims.revoked_by_cutoff(cutoff) {
                return Ok(true);
            }
        }
        self.denylist.is_revoked(&claims.jti).await
    }

    /// Spend a refresh token
    ///
    /// The token id is denylisted before anything new is minted, so a
    /// refresh token works exactly once. Presenting a spent token is treated
    /// as theft: every token of the user is revoked.
    pub async fn rotate_refresh(&self, refresh_token: &str) -> DomainResult<Claims> {
        let claims = self.verify(refresh_token)?;
        if claims.kind != TokenKind::Refresh {
            return Err(TokenError::TokenInvalid.into());
        }
        let user_id = claims.user_id()?;

        if let Some(cutoff) = self.denylist.revoked_before(user_id).await? {
            if claims.revoked_by_cutoff(cutoff) {
                return Err(TokenError::TokenRevoked.into());
            }
        }

        if !self.denylist.revoke(&claims.jti, claims.expires_at()).await? {
            tracing::warn!(
                user_id = %user_id,
                jti = %claims.jti,
                event = "refresh_token_reuse",
                "Spent refresh token presented again, revoking all sessions"
            );
            self.denylist
                .revoke_all_for_user(user_id, self.clock.tick())
                .await?;
            return Err(TokenError::TokenRevoked.into());
        }

        Ok(claims)
    }

    /// Mint a short-lived ticket for the role selection step
    pub fn issue_selection(&self, user_id: Uuid) -> Result<String, TokenError> {
        let claims = self.claims(user_id, None, TokenKind::Selection);
        self.encode_jwt(&claims)
    }

    /// Check a selection ticket without spending it
    pub fn verify_selection(&self, selection_token: &str) -> Result<Uuid, TokenError> {
        let claims = self.verify(selection_token)?;
        if claims.kind != TokenKind::Selection {
            return Err(TokenError::TokenInvalid);
        }
        claims.user_id()
    }

    /// Spend a selection ticket, returning its user id
    pub async fn redeem_selection(&self, selection_token: &str) -> DomainResult<Uuid> {
        let claims = self.verify(selection_token)?;
        if claims.kind != TokenKind::Selection {
            return Err(TokenError::TokenInvalid.into());
        }
        if !self.denylist.revoke(&claims.jti, claims.expires_at()).await? {
            return Err(TokenError::TokenRevoked.into());
        }
        claims.user_id().map_err(Into::into)
    }

    /// Denylist a refresh token. Already expired tokens are ignored.
    pub async fn revoke_refresh(&self, refresh_token: &str) -> DomainResult<()> {
        let claims = match self.verify(refresh_token) {
            Ok(claims) => claims,
            Err(TokenError::TokenExpired) => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        if claims.kind != TokenKind::Refresh {
            return Err(TokenError::TokenInvalid.into());
        }
        self.denylist.revoke(&claims.jti, claims.expires_at()).await?;
        Ok(())
    }

    /// Denylist a token id directly, e.g. the access token presented at logout
    pub async fn revoke_token_id(&self, jti: &str, expires_at: DateTime<Utc>) -> DomainResult<()> {
        self.denylist.revoke(jti, expires_at).await?;
        Ok(())
    }

    /// Void every token of the user issued until now, including tokens
    /// minted earlier in the same millisecond
    pub async fn revoke_all_for_user(&self, user_id: Uuid) -> DomainResult<()> {
        self.denylist
            .revoke_all_for_user(user_id, self.clock.tick())
            .await?;
        tracing::info!(user_id = %user_id, event = "tokens_revoked_for_user", "All tokens revoked");
        Ok(())
    }
}
