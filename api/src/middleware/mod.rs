pub mod auth;
pub mod cors;

pub use auth::{AuthContext, Authenticator, JwtAuth};
pub use cors::create_cors;
