use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::repositories::token::{InMemoryTokenDenylist, TokenDenylist};

#[tokio::test]
async fn test_revoke_is_set_if_absent() {
    let denylist = InMemoryTokenDenylist::new();
    let expires = Utc::now() + Duration::hours(1);

    assert!(denylist.revoke("jti-1", expires).await.unwrap());
    assert!(!denylist.revoke("jti-1", expires).await.unwrap());
    assert!(denylist.is_revoked("jti-1").await.unwrap());
    assert!(!denylist.is_revoked("jti-2").await.unwrap());
}

#[tokio::test]
async fn test_concurrent_revoke_has_single_winner() {
    let denylist = Arc::new(InMemoryTokenDenylist::new());
    let expires = Utc::now() + Duration::hours(1);

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let denylist = denylist.clone();
            tokio::spawn(async move { denylist.revoke("shared", expires).await.unwrap() })
        })
        .collect();

    let results = futures_util::future::join_all(handles).await;
    let winners = results.into_iter().filter(|r| *r.as_ref().unwrap()).count();
    assert_eq!(winners, 1);
}

#[tokio::test]
async fn test_cutoff_only_moves_forward() {
    let denylist = InMemoryTokenDenylist::new();
    let user_id = Uuid::new_v4();
    let now = Utc::now();

    assert!(denylist.revoked_before(user_id).await.unwrap().is_none());

    denylist.revoke_all_for_user(user_id, now).await.unwrap();
    denylist
        .revoke_all_for_user(user_id, now - Duration::minutes(10))
        .await
        .unwrap();

    assert_eq!(denylist.revoked_before(user_id).await.unwrap(), Some(now));
}

#[tokio::test]
async fn test_purge_expired() {
    let denylist = InMemoryTokenDenylist::new();
    let now = Utc::now();

    denylist.revoke("old", now - Duration::seconds(1)).await.unwrap();
    denylist.revoke("live", now + Duration::hours(1)).await.unwrap();

    assert_eq!(denylist.purge_expired(now).await, 1);
    assert_eq!(denylist.len().await, 1);
    assert!(denylist.is_revoked("live").await.unwrap());
}
