//! Main authentication service implementation

use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use pa_shared::utils::phone::mask_phone_number;

use crate::domain::entities::otp::{OtpKey, OtpPurpose};
use crate::domain::entities::profile::Profile;
use crate::domain::entities::user::User;
use crate::domain::value_objects::auth_outcome::{AuthOutcome, OtpDispatch};
use crate::domain::value_objects::role::Role;
use crate::errors::{AuthError, DomainError, DomainResult, TokenError, ValidationError};
use crate::repositories::{ProfileRepository, TokenDenylist, UserRepository};
use crate::services::abuse::{AbuseGuard, RateLimitAction, RateLimiterTrait};
use crate::services::account::AccountService;
use crate::services::authorization::RequestContext;
use crate::services::otp::{CodeGenerator, OtpEngine, OtpStore, SmsServiceTrait};
use crate::services::role::{Resolution, RoleResolver};
use crate::services::token::TokenService;

use super::config::AuthServiceConfig;

/// The `(phone, role, purpose)` triple a code is requested for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpRequest {
    pub phone: String,
    pub role: Option<Role>,
    pub purpose: OtpPurpose,
}

impl OtpRequest {
    pub fn new(phone: impl Into<String>, role: Option<Role>, purpose: OtpPurpose) -> Self {
        Self {
            phone: phone.into(),
            role,
            purpose,
        }
    }

    fn key(&self) -> OtpKey {
        OtpKey::new(self.phone.clone(), self.role, self.purpose)
    }
}

/// Authentication service for managing the complete authentication flow
pub struct AuthService<U, P, S, O, R, D>
where
    U: UserRepository,
    P: ProfileRepository,
    S: SmsServiceTrait,
    O: OtpStore,
    R: RateLimiterTrait,
    D: TokenDenylist,
{
    users: Arc<U>,
    profiles: Arc<P>,
    otp: OtpEngine<S, O, R>,
    guard: Arc<AbuseGuard<R>>,
    resolver: RoleResolver<U, P>,
    tokens: Arc<TokenService<D>>,
    accounts: Arc<AccountService<U, P, D>>,
}

impl<U, P, S, O, R, D> AuthService<U, P, S, O, R, D>
where
    U: UserRepository,
    P: ProfileRepository,
    S: SmsServiceTrait,
    O: OtpStore,
    R: RateLimiterTrait,
    D: TokenDenylist,
{
    /// Create a new authentication service
    ///
    /// # Arguments
    ///
    /// * `users` / `profiles` - Identity store
    /// * `sms_service` - Gateway used to deliver codes
    /// * `otp_store` - Storage for outstanding codes
    /// * `rate_limiter` - Counter backend for the abuse guard
    /// * `tokens` - Token issuer shared with the request authenticator
    /// * `generator` - Code source, [`SecureCodeGenerator`](crate::services::otp::SecureCodeGenerator) outside tests
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        users: Arc<U>,
        profiles: Arc<P>,
        sms_service: Arc<S>,
        otp_store: Arc<O>,
        rate_limiter: Arc<R>,
        tokens: Arc<TokenService<D>>,
        generator: Arc<dyn CodeGenerator>,
        config: AuthServiceConfig,
    ) -> Self {
        let guard = Arc::new(AbuseGuard::new(rate_limiter, config.rate_limit.clone()));
        let otp = OtpEngine::new(sms_service, otp_store, guard.clone(), generator, config.otp);
        let resolver = RoleResolver::new(users.clone(), profiles.clone());
        let accounts = Arc::new(AccountService::new(
            users.clone(),
            profiles.clone(),
            tokens.clone(),
            config.auth,
        ));

        Self {
            users,
            profiles,
            otp,
            guard,
            resolver,
            tokens,
            accounts,
        }
    }

    pub fn accounts(&self) -> Arc<AccountService<U, P, D>> {
        self.accounts.clone()
    }

    pub fn tokens(&self) -> Arc<TokenService<D>> {
        self.tokens.clone()
    }

    /// Reject requests that cannot succeed before any code is sent
    ///
    /// Registration needs a role, and a phone that already holds the role
    /// is told to log in instead.
    async fn preflight(&self, request: &OtpRequest) -> DomainResult<()> {
        self.otp.validate_phone(&request.phone)?;

        if request.purpose != OtpPurpose::Registration {
            return Ok(());
        }

        let role = request.role.ok_or_else(|| ValidationError::RequiredField {
            field: "role".to_string(),
        })?;

        let Some(user) = self.users.find_by_phone(&request.phone).await? else {
            return Ok(());
        };

        match self.profiles.find_by_user_and_role(user.id, role).await? {
            Some(profile) if profile.is_active() => {
                Err(AuthError::RoleAlreadyExists { role }.into())
            }
            Some(profile) => Err(AuthError::Conflict {
                message: format!("Profile for role {} exists with status {}", role, profile.status),
            }
            .into()),
            None => Ok(()),
        }
    }

    /// Send a code for `(phone, role, purpose)`
    pub async fn request_otp(
        &self,
        request: &OtpRequest,
        ip: Option<&str>,
    ) -> DomainResult<OtpDispatch> {
        self.preflight(request).await?;
        self.otp.request(&request.key(), ip).await
    }

    /// Send a fresh code under the stricter resend budget
    pub async fn resend_otp(
        &self,
        request: &OtpRequest,
        ip: Option<&str>,
    ) -> DomainResult<OtpDispatch> {
        self.preflight(request).await?;
        self.otp.resend(&request.key(), ip).await
    }

    /// Verify a code and resolve it into tokens or a role choice
    pub async fn verify_otp(
        &self,
        request: &OtpRequest,
        code: &str,
        full_name: Option<String>,
        ip: Option<&str>,
    ) -> DomainResult<AuthOutcome> {
        if request.purpose == OtpPurpose::Registration && request.role.is_none() {
            return Err(ValidationError::RequiredField {
                field: "role".to_string(),
            }
            .into());
        }

        let verified = match self.otp.verify(&request.key(), code, ip).await {
            Ok(verified) => verified,
            Err(err) => {
                if matches!(
                    err,
                    DomainError::Auth(AuthError::InvalidCode { .. } | AuthError::TooManyAttempts { .. })
                ) {
                    if let Err(e) = self.accounts.record_failed_attempt(&request.phone).await {
                        tracing::error!(error = %e, "Failed to record failed attempt");
                    }
                }
                return Err(err);
            }
        };

        match self.resolver.resolve(&verified, full_name).await? {
            Resolution::Resolved {
                user,
                profile,
                created,
            } => self.complete_login(user, profile, created).await,
            Resolution::ChooseRole {
                user,
                available_roles,
            } => {
                let selection_token = self.tokens.issue_selection(user.id)?;
                tracing::info!(
                    user_id = %user.id,
                    phone = %mask_phone_number(&user.phone),
                    roles = ?available_roles,
                    event = "role_selection_required",
                    "Multiple active roles, awaiting selection"
                );
                Ok(AuthOutcome::RoleSelectionRequired {
                    available_roles,
                    selection_token,
                    expires_in: self.tokens.config().selection_token_ttl,
                })
            }
        }
    }

    async fn complete_login(
        &self,
        user: User,
        profile: Profile,
        created: bool,
    ) -> DomainResult<AuthOutcome> {
        let user = self.accounts.record_login(user.id).await?;
        // The stamp returns the stored row: catch a suspension or lock that
        // landed after the profile was resolved
        user.ensure_accessible(Utc::now())?;
        let tokens = self.tokens.issue(user.id, profile.role)?;

        tracing::info!(
            user_id = %user.id,
            role = %profile.role,
            profile_created = created,
            event = "login_success",
            "User authenticated"
        );

        Ok(AuthOutcome::Authenticated {
            user_id: user.id,
            role: profile.role,
            tokens,
            profile_created: created,
        })
    }

    /// Finish a role-agnostic login with an explicit role
    ///
    /// The ticket is only spent once the role resolves, so a wrong choice can
    /// be corrected within the ticket's lifetime.
    pub async fn select_role(
        &self,
        selection_token: &str,
        role: Role,
        ip: Option<&str>,
    ) -> DomainResult<AuthOutcome> {
        self.guard.guard(RateLimitAction::Auth, None, ip).await?;

        let user_id = self.tokens.verify_selection(selection_token)?;
        let (user, profile) = self.resolver.select(user_id, role).await?;

        let redeemed = self.tokens.redeem_selection(selection_token).await?;
        if redeemed != user_id {
            return Err(TokenError::TokenInvalid.into());
        }

        self.complete_login(user, profile, false).await
    }

    /// Rotate a refresh token, re-resolving the role from current profiles
    pub async fn refresh(
        &self,
        refresh_token: &str,
        role: Option<Role>,
        ip: Option<&str>,
    ) -> DomainResult<AuthOutcome> {
        self.guard.guard(RateLimitAction::Auth, None, ip).await?;

        let claims = self.tokens.rotate_refresh(refresh_token).await?;
        let user_id = claims.user_id()?;
        let (user, profile) = self.resolver.resolve_for_refresh(user_id, role).await?;
        let tokens = self.tokens.issue(user.id, profile.role)?;

        tracing::info!(
            user_id = %user.id,
            role = %profile.role,
            event = "token_refreshed",
            "Tokens rotated"
        );

        Ok(AuthOutcome::Authenticated {
            user_id: user.id,
            role: profile.role,
            tokens,
            profile_created: false,
        })
    }

    /// End the caller's session, or every session with `all_devices`
    pub async fn logout(
        &self,
        context: &RequestContext,
        refresh_token: Option<&str>,
        all_devices: bool,
    ) -> DomainResult<()> {
        let user_id = context.user_id();

        if all_devices {
            self.tokens.revoke_all_for_user(user_id).await?;
        } else {
            self.tokens
                .revoke_token_id(&context.token_id, context.token_expires_at)
                .await?;
            if let Some(refresh_token) = refresh_token {
                self.ensure_owned(refresh_token, user_id)?;
                self.tokens.revoke_refresh(refresh_token).await?;
            }
        }

        tracing::info!(
            user_id = %user_id,
            all_devices,
            event = "logout",
            "User logged out"
        );
        Ok(())
    }

    fn ensure_owned(&self, refresh_token: &str, user_id: Uuid) -> DomainResult<()> {
        let claims = match self.tokens.verify(refresh_token) {
            Ok(claims) => claims,
            // Expired tokens are harmless; revoke_refresh skips them
            Err(TokenError::TokenExpired) => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        if claims.user_id()? != user_id {
            return Err(TokenError::TokenInvalid.into());
        }
        Ok(())
    }
}
