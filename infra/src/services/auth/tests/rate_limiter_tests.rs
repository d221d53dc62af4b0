//! Unit tests for rate limiter

use std::sync::Arc;

use pa_core::services::abuse::{RateLimitStatus, RateLimiterTrait};
use pa_shared::config::cache::CacheConfig;
use pa_shared::config::rate_limit::RateLimitPolicy;

use crate::cache::RedisClient;
use crate::services::auth::rate_limiter::{retry_after_seconds, RedisRateLimiter};

#[test]
fn test_retry_after_rounds_up() {
    assert_eq!(retry_after_seconds(1), 1);
    assert_eq!(retry_after_seconds(1000), 1);
    assert_eq!(retry_after_seconds(1001), 2);
    assert_eq!(retry_after_seconds(59_500), 60);
}

#[test]
fn test_retry_after_never_zero() {
    assert_eq!(retry_after_seconds(0), 1);
    assert_eq!(retry_after_seconds(-250), 1);
}

#[tokio::test]
#[ignore] // Requires Redis to be running
async fn test_window_fills_and_resets() {
    let client = RedisClient::new(CacheConfig::new("redis://localhost:6379").with_prefix("propauth_test"))
        .await
        .unwrap();
    let limiter = RedisRateLimiter::new(Arc::new(client));
    let key = format!("rl:unit:{}", rand::random::<u32>());
    let policy = RateLimitPolicy::new(2, 60);

    assert_eq!(
        limiter.check_and_record(&key, policy).await.unwrap(),
        RateLimitStatus::Allowed { remaining: 1 }
    );
    assert_eq!(
        limiter.check_and_record(&key, policy).await.unwrap(),
        RateLimitStatus::Allowed { remaining: 0 }
    );
    match limiter.check_and_record(&key, policy).await.unwrap() {
        RateLimitStatus::Exceeded { retry_after_seconds } => {
            assert!(retry_after_seconds >= 1 && retry_after_seconds <= 60)
        }
        other => panic!("Expected Exceeded, got {:?}", other),
    }

    limiter.reset(&key).await.unwrap();
    assert!(limiter.check_and_record(&key, policy).await.unwrap().is_allowed());
    limiter.reset(&key).await.unwrap();
}
