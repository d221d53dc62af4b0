use chrono::{Duration, Utc};
use pa_shared::config::rate_limit::{RateLimitConfig, RateLimitPolicy};
use std::sync::Arc;

use crate::errors::{AuthError, DomainError};
use crate::services::abuse::{
    AbuseGuard, InMemoryRateLimiter, RateLimitAction, RateLimitStatus, RateLimiterTrait,
};

const PHONE: &str = "+14155550123";

fn guard_with(config: RateLimitConfig) -> AbuseGuard<InMemoryRateLimiter> {
    AbuseGuard::new(Arc::new(InMemoryRateLimiter::new()), config)
}

#[tokio::test]
async fn test_sliding_window_denies_after_limit() {
    let limiter = InMemoryRateLimiter::new();
    let policy = RateLimitPolicy::new(3, 60);
    let start = Utc::now();

    for i in 0..3 {
        let status = limiter
            .check_and_record_at("k", policy, start + Duration::seconds(i))
            .await;
        assert!(status.is_allowed());
    }

    let denied = limiter
        .check_and_record_at("k", policy, start + Duration::seconds(10))
        .await;
    assert_eq!(
        denied,
        RateLimitStatus::Exceeded {
            retry_after_seconds: 50
        }
    );

    // Oldest attempt slides out of the window
    let later = limiter
        .check_and_record_at("k", policy, start + Duration::seconds(61))
        .await;
    assert_eq!(later, RateLimitStatus::Allowed { remaining: 0 });
}

#[tokio::test]
async fn test_concurrent_attempts_never_exceed_limit() {
    let limiter = Arc::new(InMemoryRateLimiter::new());
    let policy = RateLimitPolicy::new(5, 3600);

    let handles: Vec<_> = (0..20)
        .map(|_| {
            let limiter = limiter.clone();
            tokio::spawn(async move { limiter.check_and_record("shared", policy).await })
        })
        .collect();

    let allowed = futures_util::future::join_all(handles)
        .await
        .into_iter()
        .filter(|r| r.as_ref().unwrap().as_ref().unwrap().is_allowed())
        .count();
    assert_eq!(allowed, 5);
}

#[tokio::test]
async fn test_guard_reports_retry_after() {
    let mut config = RateLimitConfig::default();
    config.otp_request_per_phone = RateLimitPolicy::new(2, 3600);
    let guard = guard_with(config);

    guard.guard(RateLimitAction::OtpRequest, Some(PHONE), None).await.unwrap();
    guard.guard(RateLimitAction::OtpRequest, Some(PHONE), None).await.unwrap();

    let err = guard
        .guard(RateLimitAction::OtpRequest, Some(PHONE), None)
        .await
        .unwrap_err();
    match err {
        DomainError::Auth(AuthError::RateLimited { retry_after_seconds }) => {
            assert!(retry_after_seconds > 3500 && retry_after_seconds <= 3600);
        }
        other => panic!("expected RateLimited, got {:?}", other),
    }

    // Other phones have their own budget
    guard
        .guard(RateLimitAction::OtpRequest, Some("+14155550199"), None)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_ip_budget_shared_across_phones() {
    let mut config = RateLimitConfig::default();
    config.otp_verify_per_ip = RateLimitPolicy::new(2, 900);
    let guard = guard_with(config);
    let ip = Some("203.0.113.7");

    guard.guard(RateLimitAction::OtpVerify, Some("+14155550101"), ip).await.unwrap();
    guard.guard(RateLimitAction::OtpVerify, Some("+14155550102"), ip).await.unwrap();
    let result = guard.guard(RateLimitAction::OtpVerify, Some("+14155550103"), ip).await;

    assert!(matches!(
        result,
        Err(DomainError::Auth(AuthError::RateLimited { .. }))
    ));
}

#[tokio::test]
async fn test_resend_has_separate_phone_budget() {
    let mut config = RateLimitConfig::default();
    config.otp_request_per_phone = RateLimitPolicy::new(1, 3600);
    config.otp_resend_per_phone = RateLimitPolicy::new(1, 3600);
    let guard = guard_with(config);

    guard.guard(RateLimitAction::OtpRequest, Some(PHONE), None).await.unwrap();
    guard.guard(RateLimitAction::OtpResend, Some(PHONE), None).await.unwrap();
    assert!(guard
        .guard(RateLimitAction::OtpResend, Some(PHONE), None)
        .await
        .is_err());
}

#[tokio::test]
async fn test_disabled_guard_allows_everything() {
    let mut config = RateLimitConfig::default();
    config.enabled = false;
    config.otp_request_per_phone = RateLimitPolicy::new(1, 3600);
    let guard = guard_with(config);

    for _ in 0..5 {
        guard.guard(RateLimitAction::OtpRequest, Some(PHONE), None).await.unwrap();
    }
}

#[tokio::test]
async fn test_reset_clears_phone_budget() {
    let mut config = RateLimitConfig::default();
    config.otp_verify_per_phone = RateLimitPolicy::new(1, 900);
    let guard = guard_with(config);

    guard.guard(RateLimitAction::OtpVerify, Some(PHONE), None).await.unwrap();
    assert!(guard.guard(RateLimitAction::OtpVerify, Some(PHONE), None).await.is_err());

    guard.reset(RateLimitAction::OtpVerify, PHONE).await.unwrap();
    guard.guard(RateLimitAction::OtpVerify, Some(PHONE), None).await.unwrap();
}
