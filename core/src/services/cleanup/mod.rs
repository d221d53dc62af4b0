//! Periodic purge of expired entries in the process-local stores
//!
//! Redis expires OTP records, rate-limit windows and denylist entries by TTL.
//! The in-memory stores have no such mechanism, so single-instance
//! deployments run this service instead.

mod service;

pub use service::{CleanupConfig, CleanupResult, CleanupService};
