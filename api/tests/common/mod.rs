//! In-memory stack shared by the API integration tests

#![allow(dead_code)]

use actix_web::{
    body::MessageBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    web, App, Error,
};
use std::net::IpAddr;
use std::sync::Arc;

use pa_api::app::configure;
use pa_api::middleware::Authenticator;
use pa_api::routes::AppState;
use pa_core::domain::entities::profile::Profile;
use pa_core::domain::entities::user::User;
use pa_core::domain::value_objects::role::Role;
use pa_core::repositories::{
    InMemoryProfileRepository, InMemoryTokenDenylist, InMemoryUserRepository, ProfileRepository,
    UserRepository,
};
use pa_core::services::abuse::InMemoryRateLimiter;
use pa_core::services::auth::{AuthService, AuthServiceConfig};
use pa_core::services::authorization::AuthorizationService;
use pa_core::services::otp::{FixedCodeGenerator, InMemoryOtpStore};
use pa_core::services::token::TokenService;
use pa_infra::sms::{MockSmsService, SmsServiceAdapter};
use pa_shared::config::{RateLimitConfig, SmsConfig};

pub const CODE: &str = "123456";

pub type TestState = AppState<
    InMemoryUserRepository,
    InMemoryProfileRepository,
    SmsServiceAdapter,
    InMemoryOtpStore,
    InMemoryRateLimiter,
    InMemoryTokenDenylist,
>;

pub struct TestStack {
    pub state: web::Data<TestState>,
    pub authenticator: web::Data<Authenticator>,
    pub sms: MockSmsService,
    pub users: Arc<InMemoryUserRepository>,
    pub profiles: Arc<InMemoryProfileRepository>,
    pub tokens: Arc<TokenService<InMemoryTokenDenylist>>,
}

impl TestStack {
    pub fn new() -> Self {
        let config = AuthServiceConfig {
            rate_limit: RateLimitConfig::development(),
            ..Default::default()
        };
        Self::with(config, Vec::new())
    }

    pub fn with(config: AuthServiceConfig, trusted_proxies: Vec<IpAddr>) -> Self {
        let users = Arc::new(InMemoryUserRepository::new());
        let profiles = Arc::new(InMemoryProfileRepository::new());
        let sms = MockSmsService::new();
        let tokens = Arc::new(TokenService::new(
            Arc::new(InMemoryTokenDenylist::new()),
            config.auth.jwt.clone(),
        ));

        let auth_service = AuthService::new(
            users.clone(),
            profiles.clone(),
            Arc::new(SmsServiceAdapter::new(
                Box::new(sms.clone()),
                SmsConfig::default(),
                config.otp.ttl_seconds,
            )),
            Arc::new(InMemoryOtpStore::new()),
            Arc::new(InMemoryRateLimiter::new()),
            tokens.clone(),
            Arc::new(FixedCodeGenerator::new(CODE)),
            config,
        );
        let authenticator: Authenticator = Arc::new(AuthorizationService::new(
            users.clone(),
            profiles.clone(),
            tokens.clone(),
        ));

        Self {
            state: web::Data::new(
                AppState::new(Arc::new(auth_service)).with_trusted_proxies(trusted_proxies),
            ),
            authenticator: web::Data::new(authenticator),
            sms,
            users,
            profiles,
            tokens,
        }
    }

    pub fn app(
        &self,
    ) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse<impl MessageBody>,
            Error = Error,
            InitError = (),
        >,
    > {
        App::new()
            .app_data(self.state.clone())
            .app_data(self.authenticator.clone())
            .configure(
                configure::<
                    InMemoryUserRepository,
                    InMemoryProfileRepository,
                    SmsServiceAdapter,
                    InMemoryOtpStore,
                    InMemoryRateLimiter,
                    InMemoryTokenDenylist,
                >,
            )
    }

    /// Create a user holding `roles` directly in the identity store and
    /// return an access token for the first role
    pub async fn seed_user(&self, phone: &str, roles: &[Role]) -> (User, String) {
        let user = self.users.create(User::new(phone)).await.unwrap();
        for role in roles {
            self.profiles
                .create(Profile::new(user.id, *role, None))
                .await
                .unwrap();
        }
        let tokens = self.tokens.issue(user.id, roles[0]).unwrap();
        (user, tokens.access_token)
    }
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}
