use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::otp::{OtpKey, OtpPurpose};
use crate::domain::entities::profile::{Profile, ProfileStatus};
use crate::domain::entities::user::{AccountChange, User};
use crate::domain::value_objects::role::Role;
use crate::errors::{AuthError, DomainError};
use crate::repositories::{
    InMemoryProfileRepository, InMemoryUserRepository, ProfileRepository, UserRepository,
};
use crate::services::otp::VerifiedOtp;
use crate::services::role::{Resolution, RoleResolver};

const PHONE: &str = "+14155550123";

struct Fixture {
    resolver: RoleResolver<InMemoryUserRepository, InMemoryProfileRepository>,
    users: Arc<InMemoryUserRepository>,
    profiles: Arc<InMemoryProfileRepository>,
}

fn fixture() -> Fixture {
    let users = Arc::new(InMemoryUserRepository::new());
    let profiles = Arc::new(InMemoryProfileRepository::new());
    Fixture {
        resolver: RoleResolver::new(users.clone(), profiles.clone()),
        users,
        profiles,
    }
}

fn verified(role: Option<Role>, purpose: OtpPurpose) -> VerifiedOtp {
    VerifiedOtp {
        key: OtpKey::new(PHONE, role, purpose),
        record_id: Uuid::new_v4(),
        verified_at: Utc::now(),
    }
}

async fn seed(f: &Fixture, roles: &[(Role, ProfileStatus)]) -> User {
    let user = f.users.create(User::new(PHONE)).await.unwrap();
    for (i, (role, status)) in roles.iter().enumerate() {
        let mut profile = Profile::new(user.id, *role, None);
        profile.status = *status;
        profile.created_at = Utc::now() - Duration::minutes(10 - i as i64);
        f.profiles.create(profile).await.unwrap();
    }
    user
}

#[tokio::test]
async fn test_registration_creates_user_and_profile() {
    let f = fixture();
    let resolution = f
        .resolver
        .resolve(
            &verified(Some(Role::Broker), OtpPurpose::Registration),
            Some("Asha Rao".to_string()),
        )
        .await
        .unwrap();

    match resolution {
        Resolution::Resolved { user, profile, created } => {
            assert!(created);
            assert_eq!(user.phone, PHONE);
            assert_eq!(profile.role, Role::Broker);
            assert_eq!(profile.status, ProfileStatus::Active);
            assert_eq!(profile.full_name.as_deref(), Some("Asha Rao"));
        }
        other => panic!("unexpected resolution {:?}", other),
    }
}

#[tokio::test]
async fn test_second_role_joins_same_user() {
    let f = fixture();
    let first = f
        .resolver
        .resolve(&verified(Some(Role::Broker), OtpPurpose::Registration), None)
        .await
        .unwrap();
    let second = f
        .resolver
        .resolve(&verified(Some(Role::Developer), OtpPurpose::Registration), None)
        .await
        .unwrap();

    let user_of = |r: &Resolution| match r {
        Resolution::Resolved { user, .. } => user.id,
        Resolution::ChooseRole { user, .. } => user.id,
    };
    assert_eq!(user_of(&first), user_of(&second));
    assert_eq!(f.users.count().await, 1);
    assert_eq!(f.profiles.find_by_user(user_of(&first)).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_duplicate_registration_is_conflict() {
    let f = fixture();
    seed(&f, &[(Role::Broker, ProfileStatus::Active)]).await;

    let result = f
        .resolver
        .resolve(&verified(Some(Role::Broker), OtpPurpose::Registration), None)
        .await;
    assert!(matches!(
        result,
        Err(DomainError::Auth(AuthError::Conflict { .. }))
    ));
}

#[tokio::test]
async fn test_registration_requires_role() {
    let f = fixture();
    let result = f
        .resolver
        .resolve(&verified(None, OtpPurpose::Registration), None)
        .await;
    assert!(matches!(result, Err(DomainError::ValidationErr(_))));
}

#[tokio::test]
async fn test_login_without_account() {
    let f = fixture();
    let result = f.resolver.resolve(&verified(None, OtpPurpose::Login), None).await;
    assert_eq!(result.unwrap_err(), DomainError::Auth(AuthError::NoAccount));

    // A user with no profiles has no account either
    f.users.create(User::new(PHONE)).await.unwrap();
    let result = f.resolver.resolve(&verified(None, OtpPurpose::Login), None).await;
    assert_eq!(result.unwrap_err(), DomainError::Auth(AuthError::NoAccount));
}

#[tokio::test]
async fn test_single_active_profile_logs_in_directly() {
    let f = fixture();
    seed(&f, &[(Role::Broker, ProfileStatus::Active)]).await;

    let resolution = f
        .resolver
        .resolve(&verified(None, OtpPurpose::Login), None)
        .await
        .unwrap();
    assert!(matches!(
        resolution,
        Resolution::Resolved { ref profile, created: false, .. } if profile.role == Role::Broker
    ));
}

#[tokio::test]
async fn test_single_inactive_profile_reports_status() {
    let f = fixture();
    seed(&f, &[(Role::Developer, ProfileStatus::Pending)]).await;

    let result = f.resolver.resolve(&verified(None, OtpPurpose::Login), None).await;
    assert_eq!(
        result.unwrap_err(),
        DomainError::Auth(AuthError::PendingApproval { role: Role::Developer })
    );
}

#[tokio::test]
async fn test_multiple_profiles_require_selection() {
    let f = fixture();
    seed(
        &f,
        &[
            (Role::Broker, ProfileStatus::Active),
            (Role::Developer, ProfileStatus::Active),
            (Role::SocietyMember, ProfileStatus::Suspended),
        ],
    )
    .await;

    let resolution = f
        .resolver
        .resolve(&verified(None, OtpPurpose::Login), None)
        .await
        .unwrap();
    match resolution {
        Resolution::ChooseRole { available_roles, .. } => {
            assert_eq!(available_roles, vec![Role::Broker, Role::Developer]);
        }
        other => panic!("expected role choice, got {:?}", other),
    }
}

#[tokio::test]
async fn test_login_with_role_bound_code() {
    let f = fixture();
    seed(
        &f,
        &[
            (Role::Broker, ProfileStatus::Active),
            (Role::Developer, ProfileStatus::Removed),
        ],
    )
    .await;

    let resolved = f
        .resolver
        .resolve(&verified(Some(Role::Broker), OtpPurpose::Login), None)
        .await
        .unwrap();
    assert!(matches!(resolved, Resolution::Resolved { .. }));

    let removed = f
        .resolver
        .resolve(&verified(Some(Role::Developer), OtpPurpose::Login), None)
        .await;
    assert_eq!(
        removed.unwrap_err(),
        DomainError::Auth(AuthError::ProfileRemoved { role: Role::Developer })
    );

    let missing = f
        .resolver
        .resolve(&verified(Some(Role::Admin), OtpPurpose::Login), None)
        .await;
    assert_eq!(missing.unwrap_err(), DomainError::Auth(AuthError::NoAccount));
}

#[tokio::test]
async fn test_suspended_user_cannot_log_in() {
    let f = fixture();
    let user = seed(&f, &[(Role::Broker, ProfileStatus::Active)]).await;
    f.users
        .apply_change(
            user.id,
            &AccountChange::Suspend {
                reason: "kyc pending".to_string(),
            },
        )
        .await
        .unwrap();

    let result = f.resolver.resolve(&verified(None, OtpPurpose::Login), None).await;
    assert!(matches!(
        result,
        Err(DomainError::Auth(AuthError::AccountSuspended { reason: Some(_) }))
    ));
}

#[tokio::test]
async fn test_refresh_prefers_society_owner() {
    let f = fixture();
    let user = seed(
        &f,
        &[
            (Role::Broker, ProfileStatus::Active),
            (Role::SocietyOwner, ProfileStatus::Active),
        ],
    )
    .await;

    let (_, profile) = f.resolver.resolve_for_refresh(user.id, None).await.unwrap();
    assert_eq!(profile.role, Role::SocietyOwner);

    let (_, explicit) = f
        .resolver
        .resolve_for_refresh(user.id, Some(Role::Broker))
        .await
        .unwrap();
    assert_eq!(explicit.role, Role::Broker);
}

#[tokio::test]
async fn test_refresh_fails_when_no_profile_active() {
    let f = fixture();
    let user = seed(&f, &[(Role::Broker, ProfileStatus::Suspended)]).await;

    let result = f.resolver.resolve_for_refresh(user.id, None).await;
    assert_eq!(
        result.unwrap_err(),
        DomainError::Auth(AuthError::ProfileSuspended { role: Role::Broker })
    );
}

#[tokio::test]
async fn test_select_unknown_user_is_unauthenticated() {
    let f = fixture();
    let result = f.resolver.select(Uuid::new_v4(), Role::Broker).await;
    assert!(matches!(
        result,
        Err(DomainError::Auth(AuthError::Unauthenticated { .. }))
    ));
}
