//! Bearer-token authentication middleware for protected endpoints.
//!
//! The middleware pulls the access token from the `Authorization` header and
//! hands it to the `RequestAuthenticator` registered as app data. On success
//! the resulting [`RequestContext`] is stored in the request extensions, where
//! the [`AuthContext`] extractor picks it up. Role gates are applied by the
//! handlers themselves through [`AuthContext::require`].

use actix_web::{
    body::EitherBody,
    dev::{Payload, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    web, Error, FromRequest, HttpMessage, HttpRequest,
};
use futures_util::future::LocalBoxFuture;
use std::{
    future::{ready, Ready},
    ops::Deref,
    rc::Rc,
    sync::Arc,
};

use pa_core::domain::value_objects::role::Role;
use pa_core::errors::{AuthError, DomainError};
use pa_core::services::authorization::{RequestAuthenticator, RequestContext};

use crate::handlers::error::ApiError;

/// Shared handle the middleware looks up in app data
pub type Authenticator = Arc<dyn RequestAuthenticator>;

/// Authenticated caller injected into handlers
#[derive(Debug, Clone)]
pub struct AuthContext(pub RequestContext);

impl AuthContext {
    /// Fail with `Forbidden` unless the active role is one of `allowed`
    pub fn require(&self, allowed: &[Role]) -> Result<(), ApiError> {
        self.0.authorize(allowed).map_err(ApiError::from)
    }

    pub fn into_inner(self) -> RequestContext {
        self.0
    }
}

impl Deref for AuthContext {
    type Target = RequestContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Bearer-token middleware factory
#[derive(Debug, Clone, Copy, Default)]
pub struct JwtAuth;

impl JwtAuth {
    pub fn new() -> Self {
        Self
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct JwtAuthMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    actix_web::dev::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            match authenticate(&req).await {
                Ok(context) => {
                    tracing::debug!(
                        user_id = %context.user_id(),
                        role = %context.active_role(),
                        "Request authenticated"
                    );
                    req.extensions_mut().insert(AuthContext(context));
                    service.call(req).await.map(ServiceResponse::map_into_left_body)
                }
                Err(err) => Ok(req.error_response(err).map_into_right_body()),
            }
        })
    }
}

async fn authenticate(req: &ServiceRequest) -> Result<RequestContext, ApiError> {
    let token = extract_bearer_token(req)
        .ok_or_else(|| ApiError::from(AuthError::unauthenticated("missing bearer token")))?;

    let authenticator = req
        .app_data::<web::Data<Authenticator>>()
        .cloned()
        .ok_or_else(|| ApiError::from(DomainError::internal("request authenticator not configured")))?;

    Ok(authenticator.authenticate(&token).await?)
}

/// Extracts the token from an `Authorization: Bearer <token>` header
fn extract_bearer_token(req: &ServiceRequest) -> Option<String> {
    req.headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
}

impl FromRequest for AuthContext {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let result = req
            .extensions()
            .get::<AuthContext>()
            .cloned()
            .ok_or_else(|| ApiError::from(AuthError::unauthenticated("authentication required")).into());

        ready(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test;

    #[::std::prelude::v1::test]
    fn test_extract_bearer_token() {
        let req = test::TestRequest::default()
            .insert_header((AUTHORIZATION, "Bearer test_token_123"))
            .to_srv_request();
        assert_eq!(extract_bearer_token(&req), Some("test_token_123".to_string()));

        let req_no_bearer = test::TestRequest::default()
            .insert_header((AUTHORIZATION, "test_token_123"))
            .to_srv_request();
        assert_eq!(extract_bearer_token(&req_no_bearer), None);

        let req_blank = test::TestRequest::default()
            .insert_header((AUTHORIZATION, "Bearer   "))
            .to_srv_request();
        assert_eq!(extract_bearer_token(&req_blank), None);

        let req_no_header = test::TestRequest::default().to_srv_request();
        assert_eq!(extract_bearer_token(&req_no_header), None);
    }
}
