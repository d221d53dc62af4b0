//! Account status management: suspension, locking, deactivation and
//! profile status changes

mod service;

#[cfg(test)]
pub(crate) mod tests;

pub use service::AccountService;
