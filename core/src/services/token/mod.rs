//! Token service module for JWT management
//!
//! This module handles all token-related operations including:
//! - Access, refresh and role-selection token issuance and verification
//! - Single-use refresh rotation with reuse detection
//! - Revocation through a denylist and per-user cutoffs

pub(crate) mod service;


pub use service::TokenService;
