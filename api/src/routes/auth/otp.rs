use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;

use pa_core::repositories::{ProfileRepository, TokenDenylist, UserRepository};
use pa_core::services::abuse::RateLimiterTrait;
use pa_core::services::auth::OtpRequest;
use pa_core::services::otp::{OtpStore, SmsServiceTrait};
use pa_shared::phone::mask_phone_number;

use crate::dto::auth::{OtpDispatchResponse, OtpRequestBody};
use crate::handlers::error::ApiError;
use crate::routes::{client_ip, ensure_phone, validate_body, AppState};

/// Handler for POST /api/v1/auth/otp
///
/// Sends a verification code for `(phone, role, purpose)`.
///
/// # Request Body
///
/// ```json
/// {
///     "phone": "+14155550123",
///     "role": "broker",
///     "purpose": "registration"
/// }
/// ```
///
/// # Response
///
/// ## Success (202 Accepted)
/// ```json
/// {
///     "message": "Verification code sent",
///     "expiresAt": "2025-08-14T10:05:00Z",
///     "expiresIn": 300,
///     "resendAfter": 30,
///     "attemptsAllowed": 5
/// }
/// ```
///
/// ## Errors
/// - 400 INVALID_PHONE / VALIDATION_ERROR
/// - 409 ROLE_ALREADY_EXISTS: registering a role the phone already holds
/// - 429 RATE_LIMITED with `Retry-After`
/// - 503 DELIVERY_FAILED: the code is stored but the SMS was not sent
pub async fn request_otp<U, P, S, O, R, D>(
    req: HttpRequest,
    state: web::Data<AppState<U, P, S, O, R, D>>,
    body: web::Json<OtpRequestBody>,
) -> Result<HttpResponse, ApiError>
where
    U: UserRepository + 'static,
    P: ProfileRepository + 'static,
    S: SmsServiceTrait + 'static,
    O: OtpStore + 'static,
    R: RateLimiterTrait + 'static,
    D: TokenDenylist + 'static,
{
    dispatch(req, state, body.into_inner(), false).await
}

/// Handler for POST /api/v1/auth/otp/resend
///
/// Same body as [`request_otp`]; counted against the stricter resend budget
/// and refused during the resend cooldown.
pub async fn resend_otp<U, P, S, O, R, D>(
    req: HttpRequest,
    state: web::Data<AppState<U, P, S, O, R, D>>,
    body: web::Json<OtpRequestBody>,
) -> Result<HttpResponse, ApiError>
where
    U: UserRepository + 'static,
    P: ProfileRepository + 'static,
    S: SmsServiceTrait + 'static,
    O: OtpStore + 'static,
    R: RateLimiterTrait + 'static,
    D: TokenDenylist + 'static,
{
    dispatch(req, state, body.into_inner(), true).await
}

async fn dispatch<U, P, S, O, R, D>(
    req: HttpRequest,
    state: web::Data<AppState<U, P, S, O, R, D>>,
    body: OtpRequestBody,
    resend: bool,
) -> Result<HttpResponse, ApiError>
where
    U: UserRepository + 'static,
    P: ProfileRepository + 'static,
    S: SmsServiceTrait + 'static,
    O: OtpStore + 'static,
    R: RateLimiterTrait + 'static,
    D: TokenDenylist + 'static,
{
    ensure_phone(&body.phone)?;
    validate_body(&body)?;

    let ip = client_ip(&req, &state.trusted_proxies);
    let request = OtpRequest::new(body.phone, body.role, body.purpose);

    tracing::info!(
        phone = %mask_phone_number(&request.phone),
        purpose = %request.purpose,
        role = ?request.role,
        resend,
        "Verification code requested"
    );

    let dispatch = if resend {
        state.auth_service.resend_otp(&request, ip.as_deref()).await?
    } else {
        state.auth_service.request_otp(&request, ip.as_deref()).await?
    };

    Ok(HttpResponse::Accepted().json(OtpDispatchResponse::from_dispatch(&dispatch, Utc::now())))
}
