//! HTTP route handlers
//!
//! Handlers are generic over the storage stack so the same routes serve the
//! Redis/MySQL deployment and the in-memory development stack.

pub mod admin;
pub mod auth;
pub mod me;

use actix_web::HttpRequest;
use std::net::IpAddr;
use std::sync::Arc;
use validator::Validate;

use pa_core::errors::AuthError;
use pa_core::repositories::{ProfileRepository, TokenDenylist, UserRepository};
use pa_core::services::abuse::RateLimiterTrait;
use pa_core::services::auth::AuthService;
use pa_core::services::otp::{OtpStore, SmsServiceTrait};
use pa_shared::phone::{is_valid_e164, mask_phone_number};

use crate::handlers::error::ApiError;

/// Application state that holds shared services
pub struct AppState<U, P, S, O, R, D>
where
    U: UserRepository,
    P: ProfileRepository,
    S: SmsServiceTrait,
    O: OtpStore,
    R: RateLimiterTrait,
    D: TokenDenylist,
{
    pub auth_service: Arc<AuthService<U, P, S, O, R, D>>,
    /// Proxies allowed to report the client address in `X-Forwarded-For`
    pub trusted_proxies: Vec<IpAddr>,
}

impl<U, P, S, O, R, D> AppState<U, P, S, O, R, D>
where
    U: UserRepository,
    P: ProfileRepository,
    S: SmsServiceTrait,
    O: OtpStore,
    R: RateLimiterTrait,
    D: TokenDenylist,
{
    pub fn new(auth_service: Arc<AuthService<U, P, S, O, R, D>>) -> Self {
        Self {
            auth_service,
            trusted_proxies: Vec::new(),
        }
    }

    pub fn with_trusted_proxies(mut self, proxies: Vec<IpAddr>) -> Self {
        self.trusted_proxies = proxies;
        self
    }
}

/// Reject a phone number that is not E.164 before any store is touched
pub(crate) fn ensure_phone(phone: &str) -> Result<(), ApiError> {
    if is_valid_e164(phone) {
        Ok(())
    } else {
        Err(AuthError::InvalidPhone {
            phone: mask_phone_number(phone),
        }
        .into())
    }
}

/// Run `validator` rules and fold failures into one validation error
pub(crate) fn validate_body<T: Validate>(body: &T) -> Result<(), ApiError> {
    body.validate().map_err(|errors| {
        let mut fields: Vec<&str> = errors.field_errors().keys().copied().collect();
        fields.sort_unstable();
        ApiError::validation(format!("Invalid fields: {}", fields.join(", ")))
    })
}

/// Client IP for per-IP throttling
///
/// Forwarding headers are only read when the socket peer is a trusted proxy.
/// The chain is then walked from the right, skipping trusted hops, and the
/// first address a trusted proxy did not add is the client. Anything left of
/// it was written by the client and is ignored.
pub(crate) fn client_ip(req: &HttpRequest, trusted: &[IpAddr]) -> Option<String> {
    let peer = req.peer_addr()?.ip();
    if !trusted.contains(&peer) {
        return Some(peer.to_string());
    }

    if let Some(forwarded_for) = req.headers().get("X-Forwarded-For") {
        let client = forwarded_client(forwarded_for.to_str().ok(), trusted);
        return Some(client.unwrap_or(peer).to_string());
    }

    let real_ip = req
        .headers()
        .get("X-Real-IP")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<IpAddr>().ok());
    Some(real_ip.unwrap_or(peer).to_string())
}

/// Rightmost hop in `X-Forwarded-For` that is not a trusted proxy
///
/// When every hop is trusted the leftmost one is the client. A malformed
/// entry reached before the client discards the header.
fn forwarded_client(header: Option<&str>, trusted: &[IpAddr]) -> Option<IpAddr> {
    let mut client = None;
    for hop in header?.rsplit(',') {
        let ip = hop.trim().parse::<IpAddr>().ok()?;
        client = Some(ip);
        if !trusted.contains(&ip) {
            break;
        }
    }
    client
}
