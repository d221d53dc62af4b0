//! Authentication service module
//!
//! Orchestrates the phone/OTP flow end to end:
//! - OTP request and resend, scoped to phone, role and purpose
//! - Verification, role resolution and token issuance
//! - Role selection after a role-agnostic login
//! - Refresh rotation and logout

mod config;
mod service;

#[cfg(test)]
mod tests;

pub use config::AuthServiceConfig;
pub use service::{AuthService, OtpRequest};
