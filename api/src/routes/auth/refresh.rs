use actix_web::{web, HttpRequest, HttpResponse};

use pa_core::repositories::{ProfileRepository, TokenDenylist, UserRepository};
use pa_core::services::abuse::RateLimiterTrait;
use pa_core::services::otp::{OtpStore, SmsServiceTrait};

use crate::dto::auth::{AuthResponse, RefreshTokenRequest};
use crate::handlers::error::ApiError;
use crate::routes::{client_ip, validate_body, AppState};

/// Handler for POST /api/v1/auth/token/refresh
///
/// Rotates a refresh token.
///
/// # Request Body
///
/// ```json
/// {
///     "refreshToken": "eyJ...",
///     "role": "developer"
/// }
/// ```
///
/// `role` is optional. Without it the active role is re-derived from the
/// user's current profiles.
///
/// ## Errors
/// - 401 TOKEN_INVALID / TOKEN_EXPIRED
/// - 401 TOKEN_REVOKED: the token was already rotated; every session of the
///   user is revoked as a result
/// - 403 account or profile status errors
pub async fn refresh<U, P, S, O, R, D>(
    req: HttpRequest,
    state: web::Data<AppState<U, P, S, O, R, D>>,
    body: web::Json<RefreshTokenRequest>,
) -> Result<HttpResponse, ApiError>
where
    U: UserRepository + 'static,
    P: ProfileRepository + 'static,
    S: SmsServiceTrait + 'static,
    O: OtpStore + 'static,
    R: RateLimiterTrait + 'static,
    D: TokenDenylist + 'static,
{
    validate_body(&body.0)?;

    let ip = client_ip(&req, &state.trusted_proxies);
    let outcome = state
        .auth_service
        .refresh(&body.refresh_token, body.role, ip.as_deref())
        .await?;

    Ok(HttpResponse::Ok().json(AuthResponse::from(outcome)))
}
