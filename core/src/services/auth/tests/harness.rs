//! Shared wiring for auth service tests

use pa_shared::config::rate_limit::RateLimitConfig;
use std::sync::Arc;

use crate::domain::entities::otp::OtpPurpose;
use crate::domain::value_objects::auth_outcome::AuthOutcome;
use crate::domain::value_objects::role::Role;
use crate::repositories::{InMemoryProfileRepository, InMemoryTokenDenylist, InMemoryUserRepository};
use crate::services::abuse::InMemoryRateLimiter;
use crate::services::auth::{AuthService, AuthServiceConfig, OtpRequest};
use crate::services::authorization::{AuthorizationService, RequestAuthenticator};
use crate::services::otp::tests::mocks::MockSmsService;
use crate::services::otp::{FixedCodeGenerator, InMemoryOtpStore};
use crate::services::token::TokenService;

pub const PHONE: &str = "+14155550123";
pub const CODE: &str = "123456";

pub type TestAuthService = AuthService<
    InMemoryUserRepository,
    InMemoryProfileRepository,
    MockSmsService,
    InMemoryOtpStore,
    InMemoryRateLimiter,
    InMemoryTokenDenylist,
>;

pub struct Harness {
    pub service: TestAuthService,
    pub authenticator: AuthorizationService<
        InMemoryUserRepository,
        InMemoryProfileRepository,
        InMemoryTokenDenylist,
    >,
    pub users: Arc<InMemoryUserRepository>,
    pub profiles: Arc<InMemoryProfileRepository>,
    pub sms: Arc<MockSmsService>,
}

pub fn harness() -> Harness {
    let mut config = AuthServiceConfig::default();
    config.rate_limit = RateLimitConfig::development();
    harness_with(config)
}

pub fn harness_with(config: AuthServiceConfig) -> Harness {
    let users = Arc::new(InMemoryUserRepository::new());
    let profiles = Arc::new(InMemoryProfileRepository::new());
    let sms = Arc::new(MockSmsService::new());
    let tokens = Arc::new(TokenService::new(
        Arc::new(InMemoryTokenDenylist::new()),
        config.auth.jwt.clone(),
    ));

    let service = AuthService::new(
        users.clone(),
        profiles.clone(),
        sms.clone(),
        Arc::new(InMemoryOtpStore::new()),
        Arc::new(InMemoryRateLimiter::new()),
        tokens.clone(),
        Arc::new(FixedCodeGenerator::new(CODE)),
        config,
    );
    let authenticator = AuthorizationService::new(users.clone(), profiles.clone(), tokens);

    Harness {
        service,
        authenticator,
        users,
        profiles,
        sms,
    }
}

impl Harness {
    /// Request and verify a code in one go
    pub async fn sign_in(
        &self,
        role: Option<Role>,
        purpose: OtpPurpose,
    ) -> crate::errors::DomainResult<AuthOutcome> {
        let request = OtpRequest::new(PHONE, role, purpose);
        self.service.request_otp(&request, None).await?;
        self.service.verify_otp(&request, CODE, None, None).await
    }

    pub async fn register(&self, role: Role) -> AuthOutcome {
        self.sign_in(Some(role), OtpPurpose::Registration)
            .await
            .unwrap()
    }

    pub async fn access_token(&self, outcome: &AuthOutcome) -> String {
        outcome.tokens().unwrap().access_token.clone()
    }

    pub async fn context_for(&self, outcome: &AuthOutcome) -> crate::services::authorization::RequestContext {
        let token = self.access_token(outcome).await;
        self.authenticator.authenticate(&token).await.unwrap()
    }
}
