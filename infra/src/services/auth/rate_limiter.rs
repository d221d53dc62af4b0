//! Redis-based rate limiter backing the abuse guard
//!
//! Every key is a sorted set of attempt timestamps. One Lua script trims the
//! window, counts, and records the new attempt, so concurrent requests from
//! several API instances can never overshoot a limit.

use async_trait::async_trait;
use chrono::Utc;
use redis::Script;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use pa_core::errors::DomainError;
use pa_core::services::abuse::{RateLimitStatus, RateLimiterTrait};
use pa_shared::config::rate_limit::RateLimitPolicy;

use crate::cache::redis_client::RedisClient;
use crate::InfrastructureError;

const SLIDING_WINDOW_SCRIPT: &str = r#"
local now = tonumber(ARGV[1])
local window = tonumber(ARGV[2])
local limit = tonumber(ARGV[3])
redis.call('ZREMRANGEBYSCORE', KEYS[1], '-inf', now - window)
local count = redis.call('ZCARD', KEYS[1])
if count >= limit then
  local oldest = redis.call('ZRANGE', KEYS[1], 0, 0, 'WITHSCORES')
  local retry = window
  if oldest[2] then retry = tonumber(oldest[2]) + window - now end
  return {0, retry}
end
redis.call('ZADD', KEYS[1], now, ARGV[4])
redis.call('PEXPIRE', KEYS[1], window)
return {1, limit - count - 1}
"#;

/// Redis-based implementation of the rate limiter trait
pub struct RedisRateLimiter {
    redis_client: Arc<RedisClient>,
    script: Script,
}

impl RedisRateLimiter {
    pub fn new(redis_client: Arc<RedisClient>) -> Self {
        Self {
            redis_client,
            script: Script::new(SLIDING_WINDOW_SCRIPT),
        }
    }
}

/// Whole seconds until a slot frees up, never less than one
pub(crate) fn retry_after_seconds(retry_ms: i64) -> u64 {
    ((retry_ms + 999) / 1000).max(1) as u64
}

#[async_trait]
impl RateLimiterTrait for RedisRateLimiter {
    async fn check_and_record(
        &self,
        key: &str,
        policy: RateLimitPolicy,
    ) -> Result<RateLimitStatus, DomainError> {
        let now_ms = Utc::now().timestamp_millis();
        let window_ms = (policy.window_seconds as i64).saturating_mul(1000);
        let member = format!("{}-{}", now_ms, Uuid::new_v4().simple());

        // Not retried: a replayed script would record the attempt twice.
        let mut conn = self.redis_client.connection();
        let (allowed, value): (i64, i64) = self
            .script
            .key(self.redis_client.key(key))
            .arg(now_ms)
            .arg(window_ms)
            .arg(policy.limit)
            .arg(member)
            .invoke_async(&mut conn)
            .await
            .map_err(InfrastructureError::Cache)?;

        if allowed == 1 {
            Ok(RateLimitStatus::Allowed {
                remaining: value.max(0) as u32,
            })
        } else {
            debug!(key = %key, "Sliding window full");
            Ok(RateLimitStatus::Exceeded {
                retry_after_seconds: retry_after_seconds(value),
            })
        }
    }

    async fn reset(&self, key: &str) -> Result<(), DomainError> {
        self.redis_client.delete(&self.redis_client.key(key)).await?;
        Ok(())
    }
}
