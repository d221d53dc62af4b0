//! # PropAuth Core
//!
//! Core business logic and domain layer for phone/OTP multi-role
//! authentication. This crate contains domain entities, business services,
//! repository interfaces and error types. Storage backends and HTTP live in
//! `pa_infra` and `pa_api`.

pub mod domain;
pub mod errors;
pub mod repositories;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::*;
pub use errors::*;
pub use repositories::*;
pub use services::*;
