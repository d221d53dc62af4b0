//! CORS middleware configuration for cross-origin requests.
//!
//! Development is permissive. Elsewhere only the origins listed in
//! `ALLOWED_ORIGINS` are accepted, unless the list is empty or `*`.

use actix_cors::Cors;
use actix_web::http::{header, Method};

use pa_shared::{CorsConfig, Environment};

/// Creates a CORS middleware instance for the given environment.
pub fn create_cors(config: &CorsConfig, environment: Environment) -> Cors {
    let cors = Cors::default()
        .allowed_methods(vec![
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::OPTIONS,
        ])
        .allowed_headers(vec![
            header::AUTHORIZATION,
            header::ACCEPT,
            header::CONTENT_TYPE,
            header::HeaderName::from_static("x-request-id"),
        ])
        .expose_headers(vec![
            header::RETRY_AFTER,
            header::HeaderName::from_static("x-request-id"),
        ])
        .max_age(config.max_age);

    if environment.is_development() || config.allows_any_origin() {
        if !environment.is_development() {
            tracing::warn!("CORS allows any origin; set ALLOWED_ORIGINS to restrict it");
        }
        return cors.allow_any_origin();
    }

    config
        .allowed_origins
        .iter()
        .fold(cors, |cors, origin| cors.allowed_origin(origin))
}
