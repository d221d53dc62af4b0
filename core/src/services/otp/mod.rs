//! OTP engine: issues, dispatches and verifies one-time codes
//!
//! Codes are scoped to an [`OtpKey`](crate::domain::entities::otp::OtpKey)
//! `(phone, role scope, purpose)`. Only a salted hash is stored, and all
//! attempt accounting happens inside the store's atomic `settle` call.

mod code;
mod engine;
mod memory;
mod traits;

#[cfg(test)]
pub(crate) mod tests;

pub use code::{hash_code, generate_salt, CodeGenerator, FixedCodeGenerator, SecureCodeGenerator};
pub use engine::{OtpEngine, VerifiedOtp};
pub use memory::InMemoryOtpStore;
pub use traits::{OtpSettlement, OtpStore, SmsServiceTrait};
