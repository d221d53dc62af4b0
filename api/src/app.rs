//! Application factory
//!
//! Route table and the Actix-web application wiring. `configure` is shared by
//! the server and by the integration tests.

use actix_web::{
    body::MessageBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    web, App, Error, HttpResponse,
};
use tracing_actix_web::TracingLogger;

use pa_core::repositories::{ProfileRepository, TokenDenylist, UserRepository};
use pa_core::services::abuse::RateLimiterTrait;
use pa_core::services::otp::{OtpStore, SmsServiceTrait};
use pa_shared::{error_codes, CorsConfig, Environment, ErrorResponse};

use crate::handlers::error::{json_error_handler, ApiError};
use crate::middleware::{auth::Authenticator, cors::create_cors, JwtAuth};
use crate::routes::{admin, auth, me::me, AppState};

/// Register all routes
pub fn configure<U, P, S, O, R, D>(cfg: &mut web::ServiceConfig)
where
    U: UserRepository + 'static,
    P: ProfileRepository + 'static,
    S: SmsServiceTrait + 'static,
    O: OtpStore + 'static,
    R: RateLimiterTrait + 'static,
    D: TokenDenylist + 'static,
{
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::PathConfig::default().error_handler(|err, _req| {
            ApiError::validation(format!("Invalid path: {}", err)).into()
        }))
        .route("/health", web::get().to(health_check))
        .service(
            web::scope("/api/v1")
                .service(
                    web::scope("/auth")
                        .route("/otp", web::post().to(auth::request_otp::<U, P, S, O, R, D>))
                        .route(
                            "/otp/resend",
                            web::post().to(auth::resend_otp::<U, P, S, O, R, D>),
                        )
                        .route(
                            "/otp/verify",
                            web::post().to(auth::verify_otp::<U, P, S, O, R, D>),
                        )
                        .route(
                            "/role/select",
                            web::post().to(auth::select_role::<U, P, S, O, R, D>),
                        )
                        .route(
                            "/token/refresh",
                            web::post().to(auth::refresh::<U, P, S, O, R, D>),
                        )
                        .route(
                            "/logout",
                            web::post()
                                .to(auth::logout::<U, P, S, O, R, D>)
                                .wrap(JwtAuth::new()),
                        ),
                )
                .service(
                    web::resource("/me")
                        .wrap(JwtAuth::new())
                        .route(web::get().to(me)),
                )
                .service(
                    web::scope("/admin/users/{id}")
                        .wrap(JwtAuth::new())
                        .route(
                            "/suspend",
                            web::post().to(admin::suspend_user::<U, P, S, O, R, D>),
                        )
                        .route(
                            "/unsuspend",
                            web::post().to(admin::unsuspend_user::<U, P, S, O, R, D>),
                        )
                        .route("/lock", web::post().to(admin::lock_user::<U, P, S, O, R, D>))
                        .route(
                            "/unlock",
                            web::post().to(admin::unlock_user::<U, P, S, O, R, D>),
                        )
                        .route(
                            "/deactivate",
                            web::post().to(admin::deactivate_user::<U, P, S, O, R, D>),
                        )
                        .route(
                            "/reactivate",
                            web::post().to(admin::reactivate_user::<U, P, S, O, R, D>),
                        )
                        .route(
                            "/profiles/{role}/status",
                            web::put().to(admin::set_profile_status::<U, P, S, O, R, D>),
                        ),
                ),
        )
        .default_service(web::route().to(not_found));
}

/// Create the application with all dependencies and middleware
pub fn create_app<U, P, S, O, R, D>(
    app_state: web::Data<AppState<U, P, S, O, R, D>>,
    authenticator: web::Data<Authenticator>,
    cors: &CorsConfig,
    environment: Environment,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = Error,
        InitError = (),
    >,
>
where
    U: UserRepository + 'static,
    P: ProfileRepository + 'static,
    S: SmsServiceTrait + 'static,
    O: OtpStore + 'static,
    R: RateLimiterTrait + 'static,
    D: TokenDenylist + 'static,
{
    App::new()
        .app_data(app_state)
        .app_data(authenticator)
        .wrap(create_cors(cors, environment))
        .wrap(TracingLogger::default())
        .configure(configure::<U, P, S, O, R, D>)
}

/// Health check endpoint handler
async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "propauth-api",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Default 404 handler
async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ErrorResponse::new(
        error_codes::NOT_FOUND,
        "The requested resource was not found",
    ))
}
