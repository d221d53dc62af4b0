//! User repository that lets an administrator's write land mid-flow

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Mutex;
use uuid::Uuid;

use crate::domain::entities::user::{AccountChange, User};
use crate::errors::DomainError;
use crate::repositories::{InMemoryUserRepository, UserRepository};

/// Wraps the in-memory store and applies an armed change right after the
/// next read returns, so the caller holds a snapshot the store no longer has
#[derive(Default)]
pub struct InterleavingUserRepository {
    pub inner: InMemoryUserRepository,
    pending: Mutex<Option<AccountChange>>,
}

impl InterleavingUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&self, change: AccountChange) {
        *self.pending.lock().unwrap() = Some(change);
    }

    async fn land_pending(&self, user: &Option<User>) {
        let change = self.pending.lock().unwrap().take();
        if let (Some(change), Some(user)) = (change, user) {
            self.inner.apply_change(user.id, &change).await.unwrap();
        }
    }
}

#[async_trait]
impl UserRepository for InterleavingUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        let user = self.inner.find_by_id(id).await?;
        self.land_pending(&user).await;
        Ok(user)
    }

    async fn find_by_phone(&self, phone: &str) -> Result<Option<User>, DomainError> {
        let user = self.inner.find_by_phone(phone).await?;
        self.land_pending(&user).await;
        Ok(user)
    }

    async fn create(&self, user: User) -> Result<User, DomainError> {
        self.inner.create(user).await
    }

    async fn apply_change(&self, id: Uuid, change: &AccountChange) -> Result<User, DomainError> {
        self.inner.apply_change(id, change).await
    }

    async fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<User, DomainError> {
        self.inner.record_login(id, at).await
    }

    async fn increment_failed_attempts(&self, phone: &str) -> Result<Option<User>, DomainError> {
        // Mirror a reader: the admin write lands between lookup and increment
        let user = self.inner.find_by_phone(phone).await?;
        self.land_pending(&user).await;
        self.inner.increment_failed_attempts(phone).await
    }

    async fn reset_failed_attempts(&self, id: Uuid) -> Result<(), DomainError> {
        self.inner.reset_failed_attempts(id).await
    }

    async fn lock_if_unlocked(
        &self,
        id: Uuid,
        until: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<bool, DomainError> {
        self.inner.lock_if_unlocked(id, until, now).await
    }

    async fn release_expired_lock(&self, id: Uuid, now: DateTime<Utc>) -> Result<bool, DomainError> {
        self.inner.release_expired_lock(id, now).await
    }
}
