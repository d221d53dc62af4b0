//! Authentication route handlers
//!
//! - Code issuance and resend
//! - Code verification and role selection
//! - Token refresh
//! - Logout

pub mod logout;
pub mod otp;
pub mod refresh;
pub mod select_role;
pub mod verify;

pub use logout::logout;
pub use otp::{request_otp, resend_otp};
pub use refresh::refresh;
pub use select_role::select_role;
pub use verify::verify_otp;
