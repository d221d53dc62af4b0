//! Domain entities representing core business objects.

pub mod otp;
pub mod profile;
pub mod token;
pub mod user;

// Re-export commonly used types
pub use otp::{OtpKey, OtpPurpose, OtpRecord, OtpState, RoleScope};
pub use profile::{Profile, ProfileStatus};
pub use token::{Claims, TokenKind, TokenPair};
pub use user::{AccountChange, User};
