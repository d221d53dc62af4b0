//! Repository interfaces for the identity store and token revocation bookkeeping.

pub mod profile;
pub mod token;
pub mod user;

pub use profile::{InMemoryProfileRepository, ProfileRepository};
pub use token::{InMemoryTokenDenylist, TokenDenylist};
pub use user::{InMemoryUserRepository, UserRepository};
