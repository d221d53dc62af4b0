//! Value objects representing immutable domain concepts.

pub mod auth_outcome;
pub mod role;

// Re-export commonly used types
pub use auth_outcome::{AuthOutcome, OtpDispatch};
pub use role::{current_profile, Role};
