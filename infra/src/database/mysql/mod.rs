//! MySQL-specific database implementations
//!
//! MySQL implementations of the identity store repository traits using SQLx.

pub mod profile_repository_impl;
pub mod user_repository_impl;

pub use profile_repository_impl::MySqlProfileRepository;
pub use user_repository_impl::MySqlUserRepository;
