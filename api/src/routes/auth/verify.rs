use actix_web::{web, HttpRequest, HttpResponse};

use pa_core::repositories::{ProfileRepository, TokenDenylist, UserRepository};
use pa_core::services::abuse::RateLimiterTrait;
use pa_core::services::auth::OtpRequest;
use pa_core::services::otp::{OtpStore, SmsServiceTrait};

use crate::dto::auth::{AuthResponse, VerifyOtpRequest};
use crate::handlers::error::ApiError;
use crate::routes::{client_ip, ensure_phone, validate_body, AppState};

/// Handler for POST /api/v1/auth/otp/verify
///
/// Redeems a code. A registration creates the user and profile as needed; a
/// login resolves the active role. When a role-less login finds several
/// active roles the response lists them together with a selection token for
/// `POST /auth/role/select`.
///
/// # Request Body
///
/// ```json
/// {
///     "phone": "+14155550123",
///     "role": "broker",
///     "purpose": "registration",
///     "code": "123456",
///     "fullName": "Asha Rao"
/// }
/// ```
///
/// # Response (200 OK)
///
/// `{"status": "authenticated", "accessToken": ..., "refreshToken": ...}` or
/// `{"status": "role_selection_required", "availableRoles": [...], "selectionToken": ...}`
pub async fn verify_otp<U, P, S, O, R, D>(
    req: HttpRequest,
    state: web::Data<AppState<U, P, S, O, R, D>>,
    body: web::Json<VerifyOtpRequest>,
) -> Result<HttpResponse, ApiError>
where
    U: UserRepository + 'static,
    P: ProfileRepository + 'static,
    S: SmsServiceTrait + 'static,
    O: OtpStore + 'static,
    R: RateLimiterTrait + 'static,
    D: TokenDenylist + 'static,
{
    let body = body.into_inner();
    ensure_phone(&body.phone)?;
    validate_body(&body)?;

    let ip = client_ip(&req, &state.trusted_proxies);
    let request = OtpRequest::new(body.phone, body.role, body.purpose);
    let outcome = state
        .auth_service
        .verify_otp(&request, &body.code, body.full_name, ip.as_deref())
        .await?;

    Ok(HttpResponse::Ok().json(AuthResponse::from(outcome)))
}
