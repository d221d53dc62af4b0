//! Process-local sliding window limiter for tests and single-instance development

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use pa_shared::config::rate_limit::RateLimitPolicy;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::errors::DomainError;

use super::limiter::{RateLimitStatus, RateLimiterTrait};

#[derive(Clone, Default)]
pub struct InMemoryRateLimiter {
    windows: Arc<Mutex<HashMap<String, VecDeque<DateTime<Utc>>>>>,
}

impl InMemoryRateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check-and-record against an explicit clock
    pub async fn check_and_record_at(
        &self,
        key: &str,
        policy: RateLimitPolicy,
        now: DateTime<Utc>,
    ) -> RateLimitStatus {
        let window = Duration::seconds(policy.window_seconds as i64);
        let mut windows = self.windows.lock().await;
        let entries = windows.entry(key.to_string()).or_default();

        while entries.front().is_some_and(|t| *t <= now - window) {
            entries.pop_front();
        }

        if entries.len() as u32 >= policy.limit {
            let retry_after = entries
                .front()
                .map(|oldest| (*oldest + window - now).num_seconds().max(1) as u64)
                .unwrap_or(policy.window_seconds);
            return RateLimitStatus::Exceeded {
                retry_after_seconds: retry_after,
            };
        }

        entries.push_back(now);
        RateLimitStatus::Allowed {
            remaining: policy.limit - entries.len() as u32,
        }
    }

    /// Drop empty and fully expired windows; returns how many keys were removed
    pub async fn purge_expired(&self, max_window_seconds: u64, now: DateTime<Utc>) -> usize {
        let horizon = now - Duration::seconds(max_window_seconds as i64);
        let mut windows = self.windows.lock().await;
        let before = windows.len();
        windows.retain(|_, entries| entries.back().is_some_and(|t| *t > horizon));
        before - windows.len()
    }
}

#[async_trait]
impl RateLimiterTrait for InMemoryRateLimiter {
    async fn check_and_record(
        &self,
        key: &str,
        policy: RateLimitPolicy,
    ) -> Result<RateLimitStatus, DomainError> {
        Ok(self.check_and_record_at(key, policy, Utc::now()).await)
    }

    async fn reset(&self, key: &str) -> Result<(), DomainError> {
        self.windows.lock().await.remove(key);
        Ok(())
    }
}
