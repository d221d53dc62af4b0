use actix_web::{web, HttpRequest, HttpResponse};

use pa_core::repositories::{ProfileRepository, TokenDenylist, UserRepository};
use pa_core::services::abuse::RateLimiterTrait;
use pa_core::services::otp::{OtpStore, SmsServiceTrait};

use crate::dto::auth::{AuthResponse, SelectRoleRequest};
use crate::handlers::error::ApiError;
use crate::routes::{client_ip, validate_body, AppState};

/// Handler for POST /api/v1/auth/role/select
///
/// Completes a role-less login with `{"selectionToken": ..., "role": ...}`.
/// The selection token is single use; choosing a role the user does not hold
/// leaves it redeemable.
pub async fn select_role<U, P, S, O, R, D>(
    req: HttpRequest,
    state: web::Data<AppState<U, P, S, O, R, D>>,
    body: web::Json<SelectRoleRequest>,
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
        .select_role(&body.selection_token, body.role, ip.as_deref())
        .await?;

    Ok(HttpResponse::Ok().json(AuthResponse::from(outcome)))
}
