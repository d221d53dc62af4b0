use actix_web::{web, HttpResponse};

use pa_core::repositories::{ProfileRepository, TokenDenylist, UserRepository};
use pa_core::services::abuse::RateLimiterTrait;
use pa_core::services::otp::{OtpStore, SmsServiceTrait};

use crate::dto::auth::{LogoutRequest, MessageResponse};
use crate::handlers::error::ApiError;
use crate::middleware::auth::AuthContext;
use crate::routes::AppState;

/// Handler for POST /api/v1/auth/logout
///
/// Requires `Authorization: Bearer {access_token}`. The access token is
/// always revoked. The body is optional:
///
/// ```json
/// {
///     "refreshToken": "eyJ...",
///     "allDevices": false
/// }
/// ```
///
/// With `allDevices` every token issued to the user so far is revoked.
pub async fn logout<U, P, S, O, R, D>(
    state: web::Data<AppState<U, P, S, O, R, D>>,
    auth: AuthContext,
    body: Option<web::Json<LogoutRequest>>,
) -> Result<HttpResponse, ApiError>
where
    U: UserRepository + 'static,
    P: ProfileRepository + 'static,
    S: SmsServiceTrait + 'static,
    O: OtpStore + 'static,
    R: RateLimiterTrait + 'static,
    D: TokenDenylist + 'static,
{
    let body = body.map(web::Json::into_inner).unwrap_or_default();

    state
        .auth_service
        .logout(&auth, body.refresh_token.as_deref(), body.all_devices)
        .await?;

    let message = if body.all_devices {
        "Logged out from all devices"
    } else {
        "Logged out successfully"
    };
    Ok(HttpResponse::Ok().json(MessageResponse::new(message)))
}
