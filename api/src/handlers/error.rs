//! Domain error to HTTP response mapping
//!
//! Every handler returns `Result<_, ApiError>`; the conversion from
//! `DomainError` happens through `?`. The body is always a
//! `pa_shared::ErrorResponse`.

use actix_web::{
    error::{JsonPayloadError, ResponseError},
    http::{header, StatusCode},
    HttpRequest, HttpResponse,
};
use std::fmt;

use pa_core::errors::{AuthError, DomainError, TokenError, ValidationError};
use pa_shared::{error_codes, ErrorResponse};

/// HTTP-facing wrapper around [`DomainError`]
#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError(DomainError::Validation {
            message: message.into(),
        })
    }

    pub fn domain(&self) -> &DomainError {
        &self.0
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError(err)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError(err.into())
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        ApiError(err.into())
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError(err.into())
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        status_for(&self.0)
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self.0, status = status.as_u16(), "Request failed");
        } else {
            tracing::debug!(error = %self.0, status = status.as_u16(), "Request rejected");
        }

        let mut builder = HttpResponse::build(status);
        if let Some(seconds) = retry_after(&self.0) {
            builder.insert_header((header::RETRY_AFTER, seconds.to_string()));
        }
        builder.json(to_error_response(&self.0))
    }
}

/// Status code for a domain error
pub fn status_for(error: &DomainError) -> StatusCode {
    match error {
        DomainError::Validation { .. } | DomainError::ValidationErr(_) => StatusCode::BAD_REQUEST,
        DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
        DomainError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        DomainError::Token(TokenError::TokenGenerationFailed) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        DomainError::Token(_) => StatusCode::UNAUTHORIZED,
        DomainError::Auth(auth) => match auth {
            AuthError::InvalidPhone { .. }
            | AuthError::InvalidCode { .. }
            | AuthError::CodeExpired => StatusCode::BAD_REQUEST,
            AuthError::TooManyAttempts { .. } | AuthError::RateLimited { .. } => {
                StatusCode::TOO_MANY_REQUESTS
            }
            AuthError::RoleAlreadyExists { .. } | AuthError::Conflict { .. } => {
                StatusCode::CONFLICT
            }
            AuthError::NoAccount => StatusCode::NOT_FOUND,
            AuthError::AccountDeactivated
            | AuthError::AccountSuspended { .. }
            | AuthError::AccountLocked { .. }
            | AuthError::ProfileSuspended { .. }
            | AuthError::PendingApproval { .. }
            | AuthError::ProfileRemoved { .. }
            | AuthError::Forbidden { .. } => StatusCode::FORBIDDEN,
            AuthError::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            AuthError::DeliveryFailed => StatusCode::SERVICE_UNAVAILABLE,
        },
    }
}

fn retry_after(error: &DomainError) -> Option<u64> {
    match error {
        DomainError::Auth(
            AuthError::RateLimited {
                retry_after_seconds,
            }
            | AuthError::TooManyAttempts {
                retry_after_seconds,
            },
        ) => Some(*retry_after_seconds),
        _ => None,
    }
}

/// Build the JSON body for a domain error
///
/// Internal messages are replaced with a generic one.
pub fn to_error_response(error: &DomainError) -> ErrorResponse {
    match error {
        DomainError::Validation { message } => {
            ErrorResponse::new(error_codes::VALIDATION_ERROR, message.clone())
        }
        DomainError::ValidationErr(e) => {
            ErrorResponse::new(error_codes::VALIDATION_ERROR, e.to_string())
        }
        DomainError::NotFound { resource } => {
            ErrorResponse::new(error_codes::NOT_FOUND, format!("{} not found", resource))
        }
        DomainError::Internal { .. } => {
            ErrorResponse::new(error_codes::INTERNAL_ERROR, "An internal error occurred")
        }
        DomainError::Token(e) => token_error_response(e),
        DomainError::Auth(e) => auth_error_response(e),
    }
}

fn token_error_response(error: &TokenError) -> ErrorResponse {
    match error {
        TokenError::TokenExpired => {
            ErrorResponse::new(error_codes::TOKEN_EXPIRED, "Token has expired")
        }
        TokenError::TokenInvalid => {
            ErrorResponse::new(error_codes::TOKEN_INVALID, "Token is invalid")
        }
        TokenError::TokenRevoked => {
            ErrorResponse::new(error_codes::TOKEN_REVOKED, "Token has been revoked")
        }
        TokenError::TokenGenerationFailed => {
            ErrorResponse::new(error_codes::INTERNAL_ERROR, "An internal error occurred")
        }
    }
}

fn auth_error_response(error: &AuthError) -> ErrorResponse {
    match error {
        // The submitted number is not echoed back
        AuthError::InvalidPhone { .. } => ErrorResponse::new(
            error_codes::INVALID_PHONE,
            "Phone number must be in E.164 format, e.g. +14155550123",
        ),
        AuthError::InvalidCode { remaining_attempts } => {
            let response =
                ErrorResponse::new(error_codes::INVALID_CODE, "Verification code is incorrect");
            match remaining_attempts {
                Some(remaining) => response.add_detail("remaining_attempts", remaining),
                None => response,
            }
        }
        AuthError::CodeExpired => ErrorResponse::new(
            error_codes::CODE_EXPIRED,
            "Verification code has expired, request a new one",
        ),
        AuthError::TooManyAttempts {
            retry_after_seconds,
        } => ErrorResponse::new(
            error_codes::TOO_MANY_ATTEMPTS,
            "Too many incorrect attempts, request a new code",
        )
        .add_detail("retry_after_seconds", retry_after_seconds),
        AuthError::RateLimited {
            retry_after_seconds,
        } => ErrorResponse::new(
            error_codes::RATE_LIMITED,
            format!("Too many requests, retry in {} seconds", retry_after_seconds),
        )
        .add_detail("retry_after_seconds", retry_after_seconds),
        AuthError::RoleAlreadyExists { role } => ErrorResponse::new(
            error_codes::ROLE_ALREADY_EXISTS,
            format!("This phone is already registered as {}. Log in instead", role),
        )
        .add_detail("role", role)
        .add_detail("hint", "login"),
        AuthError::NoAccount => ErrorResponse::new(
            error_codes::NO_ACCOUNT,
            "No account found for this phone, register first",
        ),
        AuthError::Conflict { message } => {
            ErrorResponse::new(error_codes::CONFLICT, message.clone())
        }
        AuthError::AccountDeactivated => ErrorResponse::new(
            error_codes::ACCOUNT_DEACTIVATED,
            "This account has been deactivated",
        ),
        AuthError::AccountSuspended { reason } => {
            let response = ErrorResponse::new(
                error_codes::ACCOUNT_SUSPENDED,
                "This account has been suspended",
            );
            match reason {
                Some(reason) => response.add_detail("reason", reason),
                None => response,
            }
        }
        AuthError::AccountLocked { until } => {
            let response =
                ErrorResponse::new(error_codes::ACCOUNT_LOCKED, "This account is locked");
            match until {
                Some(until) => response.add_detail("locked_until", until.to_rfc3339()),
                None => response,
            }
        }
        AuthError::ProfileSuspended { role } => ErrorResponse::new(
            error_codes::PROFILE_SUSPENDED,
            format!("The {} profile has been suspended", role),
        )
        .add_detail("role", role),
        AuthError::PendingApproval { role } => ErrorResponse::new(
            error_codes::PENDING_APPROVAL,
            format!("The {} profile is awaiting approval", role),
        )
        .add_detail("role", role),
        AuthError::ProfileRemoved { role } => ErrorResponse::new(
            error_codes::PROFILE_REMOVED,
            format!("The {} profile has been removed", role),
        )
        .add_detail("role", role),
        AuthError::Unauthenticated { reason } => {
            ErrorResponse::new(error_codes::UNAUTHENTICATED, "Authentication required")
                .add_detail("reason", reason)
        }
        AuthError::Forbidden { required, actual } => ErrorResponse::new(
            error_codes::FORBIDDEN,
            "Your active role is not permitted to perform this action",
        )
        .add_detail("required_roles", required)
        .add_detail("actual_role", actual),
        AuthError::DeliveryFailed => ErrorResponse::new(
            error_codes::DELIVERY_FAILED,
            "The verification SMS could not be delivered, try resending",
        ),
    }
}

/// Turn malformed JSON bodies into the standard 400 envelope
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let message = match &err {
        JsonPayloadError::ContentType => "Content-Type must be application/json".to_string(),
        JsonPayloadError::Deserialize(e) => format!("Invalid request body: {}", e),
        other => format!("Invalid request body: {}", other),
    };
    ApiError::validation(message).into()
}
