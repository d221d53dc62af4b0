//! Account administration routes
//!
//! Every handler requires an access token whose active role is `admin`.

pub mod users;

pub use users::{
    deactivate_user, lock_user, reactivate_user, set_profile_status, suspend_user,
    unlock_user, unsuspend_user,
};
