use actix_web::{web, HttpResponse};
use uuid::Uuid;

use pa_core::domain::value_objects::role::Role;
use pa_core::repositories::{ProfileRepository, TokenDenylist, UserRepository};
use pa_core::services::abuse::RateLimiterTrait;
use pa_core::services::otp::{OtpStore, SmsServiceTrait};

use crate::dto::admin::{LockRequest, ProfileStatusRequest, ProfileView, SuspendRequest, UserView};
use crate::handlers::error::ApiError;
use crate::middleware::auth::AuthContext;
use crate::routes::{validate_body, AppState};

/// POST /api/v1/admin/users/{id}/suspend
///
/// Body `{"reason": "..."}`. Revokes every token of the user.
pub async fn suspend_user<U, P, S, O, R, D>(
    state: web::Data<AppState<U, P, S, O, R, D>>,
    auth: AuthContext,
    path: web::Path<Uuid>,
    body: web::Json<SuspendRequest>,
) -> Result<HttpResponse, ApiError>
where
    U: UserRepository + 'static,
    P: ProfileRepository + 'static,
    S: SmsServiceTrait + 'static,
    O: OtpStore + 'static,
    R: RateLimiterTrait + 'static,
    D: TokenDenylist + 'static,
{
    auth.require(&[Role::Admin])?;
    validate_body(&body.0)?;

    let user = state
        .auth_service
        .accounts()
        .suspend(path.into_inner(), body.into_inner().reason)
        .await?;
    Ok(HttpResponse::Ok().json(UserView::from(&user)))
}

/// POST /api/v1/admin/users/{id}/unsuspend
pub async fn unsuspend_user<U, P, S, O, R, D>(
    state: web::Data<AppState<U, P, S, O, R, D>>,
    auth: AuthContext,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError>
where
    U: UserRepository + 'static,
    P: ProfileRepository + 'static,
    S: SmsServiceTrait + 'static,
    O: OtpStore + 'static,
    R: RateLimiterTrait + 'static,
    D: TokenDenylist + 'static,
{
    auth.require(&[Role::Admin])?;
    let user = state.auth_service.accounts().unsuspend(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(UserView::from(&user)))
}

/// POST /api/v1/admin/users/{id}/lock
///
/// Optional body `{"until": "2025-08-14T10:00:00Z"}`; without it the lock
/// holds until an administrator unlocks.
pub async fn lock_user<U, P, S, O, R, D>(
    state: web::Data<AppState<U, P, S, O, R, D>>,
    auth: AuthContext,
    path: web::Path<Uuid>,
    body: Option<web::Json<LockRequest>>,
) -> Result<HttpResponse, ApiError>
where
    U: UserRepository + 'static,
    P: ProfileRepository + 'static,
    S: SmsServiceTrait + 'static,
    O: OtpStore + 'static,
    R: RateLimiterTrait + 'static,
    D: TokenDenylist + 'static,
{
    auth.require(&[Role::Admin])?;
    let until = body.and_then(|b| b.into_inner().until);

    let user = state
        .auth_service
        .accounts()
        .lock(path.into_inner(), until)
        .await?;
    Ok(HttpResponse::Ok().json(UserView::from(&user)))
}

/// POST /api/v1/admin/users/{id}/unlock
pub async fn unlock_user<U, P, S, O, R, D>(
    state: web::Data<AppState<U, P, S, O, R, D>>,
    auth: AuthContext,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError>
where
    U: UserRepository + 'static,
    P: ProfileRepository + 'static,
    S: SmsServiceTrait + 'static,
    O: OtpStore + 'static,
    R: RateLimiterTrait + 'static,
    D: TokenDenylist + 'static,
{
    auth.require(&[Role::Admin])?;
    let user = state.auth_service.accounts().unlock(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(UserView::from(&user)))
}

/// POST /api/v1/admin/users/{id}/deactivate
pub async fn deactivate_user<U, P, S, O, R, D>(
    state: web::Data<AppState<U, P, S, O, R, D>>,
    auth: AuthContext,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError>
where
    U: UserRepository + 'static,
    P: ProfileRepository + 'static,
    S: SmsServiceTrait + 'static,
    O: OtpStore + 'static,
    R: RateLimiterTrait + 'static,
    D: TokenDenylist + 'static,
{
    auth.require(&[Role::Admin])?;
    let user = state.auth_service.accounts().deactivate(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(UserView::from(&user)))
}

/// POST /api/v1/admin/users/{id}/reactivate
pub async fn reactivate_user<U, P, S, O, R, D>(
    state: web::Data<AppState<U, P, S, O, R, D>>,
    auth: AuthContext,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError>
where
    U: UserRepository + 'static,
    P: ProfileRepository + 'static,
    S: SmsServiceTrait + 'static,
    O: OtpStore + 'static,
    R: RateLimiterTrait + 'static,
    D: TokenDenylist + 'static,
{
    auth.require(&[Role::Admin])?;
    let user = state.auth_service.accounts().reactivate(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(UserView::from(&user)))
}

/// PUT /api/v1/admin/users/{id}/profiles/{role}/status
///
/// Body `{"status": "active" | "pending" | "suspended" | "removed"}`.
pub async fn set_profile_status<U, P, S, O, R, D>(
    state: web::Data<AppState<U, P, S, O, R, D>>,
    auth: AuthContext,
    path: web::Path<(Uuid, String)>,
    body: web::Json<ProfileStatusRequest>,
) -> Result<HttpResponse, ApiError>
where
    U: UserRepository + 'static,
    P: ProfileRepository + 'static,
    S: SmsServiceTrait + 'static,
    O: OtpStore + 'static,
    R: RateLimiterTrait + 'static,
    D: TokenDenylist + 'static,
{
    auth.require(&[Role::Admin])?;
    let (user_id, role) = path.into_inner();
    let role: Role = role.parse().map_err(ApiError::validation)?;

    let profile = state
        .auth_service
        .accounts()
        .set_profile_status(user_id, role, body.status)
        .await?;
    Ok(HttpResponse::Ok().json(ProfileView::from(&profile)))
}
