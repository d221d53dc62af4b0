use chrono::Utc;
use pa_shared::config::otp::OtpConfig;
use pa_shared::config::rate_limit::{RateLimitConfig, RateLimitPolicy};
use std::sync::Arc;

use super::mocks::MockSmsService;
use crate::domain::entities::otp::{OtpKey, OtpPurpose};
use crate::domain::value_objects::role::Role;
use crate::errors::{AuthError, DomainError, ValidationError};
use crate::services::abuse::{AbuseGuard, InMemoryRateLimiter};
use crate::services::otp::{
    CodeGenerator, FixedCodeGenerator, InMemoryOtpStore, OtpEngine, OtpStore,
    SecureCodeGenerator,
};

const PHONE: &str = "+14155550123";

type TestEngine = OtpEngine<MockSmsService, InMemoryOtpStore, InMemoryRateLimiter>;

struct Harness {
    engine: Arc<TestEngine>,
    sms: Arc<MockSmsService>,
    store: Arc<InMemoryOtpStore>,
}

fn harness_with(
    generator: Arc<dyn CodeGenerator>,
    config: OtpConfig,
    rate_limit: RateLimitConfig,
) -> Harness {
    let sms = Arc::new(MockSmsService::new());
    let store = Arc::new(InMemoryOtpStore::new());
    let guard = Arc::new(AbuseGuard::new(Arc::new(InMemoryRateLimiter::new()), rate_limit));
    let engine = Arc::new(OtpEngine::new(
        sms.clone(),
        store.clone(),
        guard,
        generator,
        config,
    ));
    Harness { engine, sms, store }
}

fn harness() -> Harness {
    harness_with(
        Arc::new(SecureCodeGenerator),
        OtpConfig::default(),
        RateLimitConfig::development(),
    )
}

fn broker_login() -> OtpKey {
    OtpKey::new(PHONE, Some(Role::Broker), OtpPurpose::Login)
}

#[tokio::test]
async fn test_request_then_verify_succeeds_once() {
    let h = harness();
    let key = broker_login();

    let dispatch = h.engine.request(&key, None).await.unwrap();
    assert_eq!(dispatch.attempts_allowed, 5);
    assert!(dispatch.expires_at > Utc::now());

    let code = h.sms.get_sent_code(PHONE).unwrap();
    let verified = h.engine.verify(&key, &code, None).await.unwrap();
    assert_eq!(verified.key, key);

    let second = h.engine.verify(&key, &code, None).await;
    assert!(matches!(
        second,
        Err(DomainError::Auth(AuthError::InvalidCode { remaining_attempts: None }))
    ));
}

#[tokio::test]
async fn test_invalid_phone_rejected_before_store() {
    let h = harness();
    let key = OtpKey::new("4155550123", None, OtpPurpose::Login);

    let result = h.engine.request(&key, None).await;
    assert!(matches!(
        result,
        Err(DomainError::Auth(AuthError::InvalidPhone { .. }))
    ));
    assert_eq!(h.sms.sent_count(), 0);
    assert!(h.store.get(&key).await.unwrap().is_none());
}

#[tokio::test]
async fn test_max_attempts_locks_out_correct_code() {
    let h = harness();
    let key = broker_login();
    h.engine.request(&key, None).await.unwrap();
    let code = h.sms.get_sent_code(PHONE).unwrap();
    let wrong = if code == "000000" { "111111" } else { "000000" };

    for expected_remaining in (0..5).rev() {
        let result = h.engine.verify(&key, wrong, None).await;
        assert_eq!(
            result.unwrap_err(),
            DomainError::Auth(AuthError::InvalidCode {
                remaining_attempts: Some(expected_remaining)
            })
        );
    }

    let result = h.engine.verify(&key, &code, None).await;
    match result.unwrap_err() {
        DomainError::Auth(AuthError::TooManyAttempts {
            retry_after_seconds,
        }) => assert!((29..=30).contains(&retry_after_seconds)),
        other => panic!("unexpected error: {:?}", other),
    }

    // The spent code still holds the resend cooldown
    assert!(matches!(
        h.engine.resend(&key, None).await,
        Err(DomainError::Auth(AuthError::RateLimited { .. }))
    ));
}

#[tokio::test]
async fn test_new_request_invalidates_prior_code() {
    let h = harness_with(
        Arc::new(SecureCodeGenerator),
        OtpConfig::default(),
        RateLimitConfig::development(),
    );
    let key = broker_login();

    h.engine.request(&key, None).await.unwrap();
    let first = h.sms.get_sent_code(PHONE).unwrap();
    h.engine.request(&key, None).await.unwrap();
    let second = h.sms.get_sent_code(PHONE).unwrap();

    if first != second {
        assert!(h.engine.verify(&key, &first, None).await.is_err());
    }
    assert!(h.engine.verify(&key, &second, None).await.is_ok());
}

#[tokio::test]
async fn test_codes_are_scoped_by_role_and_purpose() {
    let h = harness_with(
        Arc::new(FixedCodeGenerator::new("123456")),
        OtpConfig::default(),
        RateLimitConfig::development(),
    );
    let broker = broker_login();
    h.engine.request(&broker, None).await.unwrap();

    let developer = OtpKey::new(PHONE, Some(Role::Developer), OtpPurpose::Login);
    let registration = OtpKey::new(PHONE, Some(Role::Broker), OtpPurpose::Registration);

    for other in [developer, registration] {
        assert_eq!(
            h.engine.verify(&other, "123456", None).await.unwrap_err(),
            DomainError::Auth(AuthError::CodeExpired)
        );
    }
    assert!(h.engine.verify(&broker, "123456", None).await.is_ok());
}

#[tokio::test]
async fn test_concurrent_verify_single_success() {
    let h = harness_with(
        Arc::new(FixedCodeGenerator::new("123456")),
        OtpConfig::default(),
        RateLimitConfig::development(),
    );
    let key = broker_login();
    h.engine.request(&key, None).await.unwrap();

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let engine = h.engine.clone();
            let key = key.clone();
            tokio::spawn(async move { engine.verify(&key, "123456", None).await })
        })
        .collect();

    let results: Vec<_> = futures_util::future::join_all(handles)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();

    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);
    for failure in results.iter().filter_map(|r| r.as_ref().err()) {
        assert_eq!(
            *failure,
            DomainError::Auth(AuthError::InvalidCode { remaining_attempts: None })
        );
    }
}

#[tokio::test]
async fn test_delivery_failure_keeps_code_for_grace_period() {
    let h = harness_with(
        Arc::new(FixedCodeGenerator::new("123456")),
        OtpConfig::default(),
        RateLimitConfig::development(),
    );
    h.sms.set_failing(true);
    let key = broker_login();

    let result = h.engine.request(&key, None).await;
    assert_eq!(result.unwrap_err(), DomainError::Auth(AuthError::DeliveryFailed));

    let record = h.store.get(&key).await.unwrap().unwrap();
    assert_eq!(
        (record.expires_at - record.issued_at).num_seconds(),
        OtpConfig::default().delivery_grace_seconds
    );

    // The stored code is still valid
    assert!(h.engine.verify(&key, "123456", None).await.is_ok());
}

#[tokio::test]
async fn test_resend_respects_cooldown() {
    let h = harness();
    let key = broker_login();
    h.engine.request(&key, None).await.unwrap();

    let result = h.engine.resend(&key, None).await;
    match result {
        Err(DomainError::Auth(AuthError::RateLimited { retry_after_seconds })) => {
            assert!(retry_after_seconds >= 1 && retry_after_seconds <= 30);
        }
        other => panic!("expected cooldown rejection, got {:?}", other),
    }
}

#[tokio::test]
async fn test_resend_without_cooldown_issues_new_code() {
    let config = OtpConfig {
        resend_cooldown_seconds: 0,
        ..OtpConfig::default()
    };
    let h = harness_with(Arc::new(SecureCodeGenerator), config, RateLimitConfig::development());
    let key = broker_login();

    h.engine.request(&key, None).await.unwrap();
    let first_id = h.store.get(&key).await.unwrap().unwrap().id;
    h.engine.resend(&key, None).await.unwrap();
    let second_id = h.store.get(&key).await.unwrap().unwrap().id;

    assert_ne!(first_id, second_id);
}

#[tokio::test]
async fn test_resend_throttled_more_strictly() {
    let config = OtpConfig {
        resend_cooldown_seconds: 0,
        ..OtpConfig::default()
    };
    let mut rate_limit = RateLimitConfig::default();
    rate_limit.otp_request_per_phone = RateLimitPolicy::new(5, 3600);
    rate_limit.otp_resend_per_phone = RateLimitPolicy::new(2, 3600);
    let h = harness_with(Arc::new(SecureCodeGenerator), config, rate_limit);
    let key = broker_login();

    h.engine.request(&key, None).await.unwrap();
    h.engine.resend(&key, None).await.unwrap();
    h.engine.resend(&key, None).await.unwrap();
    assert!(matches!(
        h.engine.resend(&key, None).await,
        Err(DomainError::Auth(AuthError::RateLimited { .. }))
    ));

    // First-time requests still have budget
    h.engine.request(&key, None).await.unwrap();
}

#[tokio::test]
async fn test_malformed_code_is_validation_error() {
    let h = harness();
    let key = broker_login();
    h.engine.request(&key, None).await.unwrap();

    assert!(matches!(
        h.engine.verify(&key, "12ab56", None).await,
        Err(DomainError::ValidationErr(ValidationError::InvalidFormat { .. }))
    ));
    assert!(matches!(
        h.engine.verify(&key, "1234", None).await,
        Err(DomainError::ValidationErr(ValidationError::InvalidLength { .. }))
    ));

    // Malformed input does not cost an attempt
    let record = h.store.get(&key).await.unwrap().unwrap();
    assert_eq!(record.attempts_remaining, 5);
}

#[tokio::test]
async fn test_verify_without_request_is_expired() {
    let h = harness();
    let result = h.engine.verify(&broker_login(), "123456", None).await;
    assert_eq!(result.unwrap_err(), DomainError::Auth(AuthError::CodeExpired));
}
