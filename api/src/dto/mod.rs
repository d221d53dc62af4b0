//! Request and response bodies for the HTTP API
//!
//! JSON field names are camelCase. Roles, purposes and profile statuses use
//! their snake_case wire names (`buyer_seller`, `registration`, `pending`).

pub mod admin;
pub mod auth;

pub use admin::{LockRequest, ProfileStatusRequest, ProfileView, SuspendRequest, UserView};
pub use auth::{
    AuthResponse, LogoutRequest, MeResponse, MessageResponse, OtpDispatchResponse, OtpRequestBody,
    RefreshTokenRequest, SelectRoleRequest, VerifyOtpRequest,
};
