//! Rate limiting backend trait

use async_trait::async_trait;
use pa_shared::config::rate_limit::RateLimitPolicy;

use crate::errors::DomainError;

/// Result of a single check-and-record call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitStatus {
    /// The attempt was counted
    Allowed { remaining: u32 },
    /// The window is full; the attempt was not counted
    Exceeded { retry_after_seconds: u64 },
}

impl RateLimitStatus {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitStatus::Allowed { .. })
    }
}

/// Sliding-window counter store
#[async_trait]
pub trait RateLimiterTrait: Send + Sync {
    /// Atomically count an attempt against `key` if the window has room
    async fn check_and_record(
        &self,
        key: &str,
        policy: RateLimitPolicy,
    ) -> Result<RateLimitStatus, DomainError>;

    /// Forget all attempts recorded for `key`
    async fn reset(&self, key: &str) -> Result<(), DomainError>;
}
