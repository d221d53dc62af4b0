use chrono::{Duration, Utc};
use pa_shared::config::auth::{AuthConfig, JwtConfig};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::profile::{Profile, ProfileStatus};
use crate::domain::entities::user::{AccountChange, User};
use crate::domain::value_objects::role::Role;
use crate::errors::{AuthError, DomainError};
use crate::repositories::{
    InMemoryProfileRepository, InMemoryTokenDenylist, InMemoryUserRepository, ProfileRepository,
    TokenDenylist, UserRepository,
};
use crate::services::account::AccountService;
use crate::services::token::TokenService;

use super::mocks::InterleavingUserRepository;

type Service =
    AccountService<InMemoryUserRepository, InMemoryProfileRepository, InMemoryTokenDenylist>;

struct Fixture {
    service: Service,
    users: Arc<InMemoryUserRepository>,
    profiles: Arc<InMemoryProfileRepository>,
    denylist: Arc<InMemoryTokenDenylist>,
}

fn fixture(threshold: u32) -> Fixture {
    let users = Arc::new(InMemoryUserRepository::new());
    let profiles = Arc::new(InMemoryProfileRepository::new());
    let denylist = Arc::new(InMemoryTokenDenylist::new());
    let tokens = Arc::new(TokenService::new(denylist.clone(), JwtConfig::new("secret")));
    let config = AuthConfig {
        account_lock_threshold: threshold,
        ..AuthConfig::default()
    };
    Fixture {
        service: AccountService::new(users.clone(), profiles.clone(), tokens, config),
        users,
        profiles,
        denylist,
    }
}

fn interleaving(
    threshold: u32,
) -> (
    AccountService<InterleavingUserRepository, InMemoryProfileRepository, InMemoryTokenDenylist>,
    Arc<InterleavingUserRepository>,
) {
    let users = Arc::new(InterleavingUserRepository::new());
    let tokens = Arc::new(TokenService::new(
        Arc::new(InMemoryTokenDenylist::new()),
        JwtConfig::new("secret"),
    ));
    let config = AuthConfig {
        account_lock_threshold: threshold,
        ..AuthConfig::default()
    };
    let service = AccountService::new(
        users.clone(),
        Arc::new(InMemoryProfileRepository::new()),
        tokens,
        config,
    );
    (service, users)
}

#[tokio::test]
async fn test_suspend_revokes_tokens() {
    let f = fixture(10);
    let user = f.users.create(User::new("+14155550123")).await.unwrap();

    let suspended = f.service.suspend(user.id, "fraud").await.unwrap();
    assert!(suspended.is_suspended);
    assert!(f.denylist.revoked_before(user.id).await.unwrap().is_some());

    let restored = f.service.unsuspend(user.id).await.unwrap();
    assert!(!restored.is_suspended);
    assert!(restored.suspension_reason.is_none());
}

#[tokio::test]
async fn test_deactivate_and_reactivate() {
    let f = fixture(10);
    let user = f.users.create(User::new("+14155550123")).await.unwrap();

    let user = f.service.deactivate(user.id).await.unwrap();
    assert!(!user.is_active);
    assert!(f.denylist.revoked_before(user.id).await.unwrap().is_some());

    let user = f.service.reactivate(user.id).await.unwrap();
    assert!(user.is_active);
}

#[tokio::test]
async fn test_unknown_user_not_found() {
    let f = fixture(10);
    assert!(matches!(
        f.service.lock(Uuid::new_v4(), None).await,
        Err(DomainError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_failed_attempts_lock_account() {
    let f = fixture(3);
    let user = f.users.create(User::new("+14155550123")).await.unwrap();

    for _ in 0..2 {
        f.service.record_failed_attempt("+14155550123").await.unwrap();
    }
    let stored = f.users.find_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(stored.failed_attempts, 2);
    assert!(!stored.is_locked);

    f.service.record_failed_attempt("+14155550123").await.unwrap();
    let stored = f.users.find_by_id(user.id).await.unwrap().unwrap();
    assert!(stored.is_locked_at(Utc::now()));
    let until = stored.locked_until.unwrap();
    assert!(until > Utc::now() + Duration::minutes(29));
    assert!(matches!(
        stored.ensure_accessible(Utc::now()),
        Err(AuthError::AccountLocked { .. })
    ));

    let unlocked = f.service.unlock(user.id).await.unwrap();
    assert_eq!(unlocked.failed_attempts, 0);
}

#[tokio::test]
async fn test_failed_attempt_for_unknown_phone_is_ignored() {
    let f = fixture(1);
    f.service.record_failed_attempt("+14155550199").await.unwrap();
    assert_eq!(f.users.count().await, 0);
}

#[tokio::test]
async fn test_reset_failed_attempts() {
    let f = fixture(10);
    let user = f.users.create(User::new("+14155550123")).await.unwrap();
    f.service.record_failed_attempt("+14155550123").await.unwrap();

    f.service.reset_failed_attempts(user.id).await.unwrap();
    let stored = f.users.find_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(stored.failed_attempts, 0);
}

#[tokio::test]
async fn test_set_profile_status() {
    let f = fixture(10);
    let user = f.users.create(User::new("+14155550123")).await.unwrap();
    f.profiles
        .create(Profile::new(user.id, Role::Developer, None))
        .await
        .unwrap();

    let profile = f
        .service
        .set_profile_status(user.id, Role::Developer, ProfileStatus::Pending)
        .await
        .unwrap();
    assert_eq!(profile.status, ProfileStatus::Pending);
}

#[tokio::test]
async fn test_failed_attempt_keeps_suspension_made_meanwhile() {
    let (service, users) = interleaving(10);
    let user = users.create(User::new("+14155550123")).await.unwrap();

    users.arm(AccountChange::Suspend {
        reason: "fraud".to_string(),
    });
    service.record_failed_attempt("+14155550123").await.unwrap();

    let stored = users.inner.find_by_id(user.id).await.unwrap().unwrap();
    assert!(stored.is_suspended);
    assert_eq!(stored.suspension_reason.as_deref(), Some("fraud"));
    assert_eq!(stored.failed_attempts, 1);
}

#[tokio::test]
async fn test_login_stamp_keeps_lock_made_meanwhile() {
    let (service, users) = interleaving(10);
    let user = users.create(User::new("+14155550123")).await.unwrap();

    users.arm(AccountChange::Lock { until: None });
    users.find_by_id(user.id).await.unwrap();
    let stamped = service.record_login(user.id).await.unwrap();

    assert!(stamped.is_locked);
    assert!(stamped.locked_until.is_none());
    assert!(stamped.last_login_at.is_some());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_failed_attempts_are_all_counted() {
    let f = fixture(100);
    let user = f.users.create(User::new("+14155550123")).await.unwrap();
    let service = Arc::new(f.service);

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let service = service.clone();
            tokio::spawn(async move { service.record_failed_attempt("+14155550123").await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let stored = f.users.find_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(stored.failed_attempts, 16);
    assert!(!stored.is_locked);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_failures_past_threshold_lock_once() {
    let f = fixture(5);
    let user = f.users.create(User::new("+14155550123")).await.unwrap();
    let service = Arc::new(f.service);

    let handles: Vec<_> = (0..12)
        .map(|_| {
            let service = service.clone();
            tokio::spawn(async move { service.record_failed_attempt("+14155550123").await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let stored = f.users.find_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(stored.failed_attempts, 12);
    assert!(stored.is_locked_at(Utc::now()));
}

#[tokio::test]
async fn test_threshold_keeps_indefinite_admin_lock() {
    let f = fixture(2);
    let user = f.users.create(User::new("+14155550123")).await.unwrap();
    f.service.lock(user.id, None).await.unwrap();

    for _ in 0..3 {
        f.service.record_failed_attempt("+14155550123").await.unwrap();
    }

    let stored = f.users.find_by_id(user.id).await.unwrap().unwrap();
    assert!(stored.is_locked);
    assert!(stored.locked_until.is_none());
    assert_eq!(stored.failed_attempts, 3);
}
