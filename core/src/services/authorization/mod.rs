//! Per-request authentication and role gates
//!
//! Token claims are never trusted on their own for account state: every
//! request reloads the user and its profiles, so suspension and locking take
//! effect immediately.

mod context;
mod service;


pub use context::RequestContext;
pub use service::{AuthorizationService, RequestAuthenticator};
