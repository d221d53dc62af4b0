//! Business services containing domain logic and use cases.

pub mod abuse;
pub mod account;
pub mod auth;
pub mod authorization;
pub mod cleanup;
pub mod otp;
pub mod role;
pub mod token;

// Re-export commonly used types
pub use abuse::{AbuseGuard, InMemoryRateLimiter, RateLimitAction, RateLimitStatus, RateLimiterTrait};
pub use account::AccountService;
pub use auth::{AuthService, AuthServiceConfig, OtpRequest};
pub use authorization::{AuthorizationService, RequestAuthenticator, RequestContext};
pub use cleanup::{CleanupConfig, CleanupResult, CleanupService};
pub use otp::{
    CodeGenerator, FixedCodeGenerator, InMemoryOtpStore, OtpEngine, OtpSettlement, OtpStore,
    SecureCodeGenerator, SmsServiceTrait, VerifiedOtp,
};
pub use role::{Resolution, RoleResolver};
pub use token::TokenService;
