//! Abuse guard: sliding-window rate limits per phone and per IP
//!
//! The guard owns the policy table and key layout. Counting itself is
//! delegated to a [`RateLimiterTrait`] backend that must record and check
//! atomically, so that replicas sharing one backend enforce one budget.

mod guard;
mod limiter;
mod memory;

#[cfg(test)]
mod tests;

pub use guard::{AbuseGuard, RateLimitAction};
pub use limiter::{RateLimitStatus, RateLimiterTrait};
pub use memory::InMemoryRateLimiter;
