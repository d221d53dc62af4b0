//! In-memory implementation of UserRepository for tests and local development

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::user::{AccountChange, User};
use crate::errors::{AuthError, DomainError};

use super::trait_::UserRepository;

/// User repository backed by a process-local map
#[derive(Clone)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self {
            users: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Number of stored users
    pub async fn count(&self) -> usize {
        self.users.read().await.len()
    }
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        let users = self.users.read().await;
        Ok(users.get(&id).cloned())
    }

    async fn find_by_phone(&self, phone: &str) -> Result<Option<User>, DomainError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.phone == phone).cloned())
    }

    async fn create(&self, user: User) -> Result<User, DomainError> {
        let mut users = self.users.write().await;

        if users.values().any(|u| u.phone == user.phone) {
            return Err(AuthError::Conflict {
                message: "Phone number already registered".to_string(),
            }
            .into());
        }

        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn apply_change(&self, id: Uuid, change: &AccountChange) -> Result<User, DomainError> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&id).ok_or_else(not_found)?;
        change.apply(user);
        Ok(user.clone())
    }

    async fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<User, DomainError> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&id).ok_or_else(not_found)?;
        user.record_login(at);
        Ok(user.clone())
    }

    async fn increment_failed_attempts(&self, phone: &str) -> Result<Option<User>, DomainError> {
        let mut users = self.users.write().await;
        Ok(users.values_mut().find(|u| u.phone == phone).map(|user| {
            user.record_failed_attempt();
            user.clone()
        }))
    }

    async fn reset_failed_attempts(&self, id: Uuid) -> Result<(), DomainError> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&id).ok_or_else(not_found)?;
        if user.failed_attempts > 0 {
            user.failed_attempts = 0;
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn lock_if_unlocked(
        &self,
        id: Uuid,
        until: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<bool, DomainError> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&id).ok_or_else(not_found)?;
        if user.is_locked_at(now) {
            return Ok(false);
        }
        user.lock(Some(until));
        Ok(true)
    }

    async fn release_expired_lock(&self, id: Uuid, now: DateTime<Utc>) -> Result<bool, DomainError> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&id).ok_or_else(not_found)?;
        if !user.has_expired_lock(now) {
            return Ok(false);
        }
        user.unlock();
        Ok(true)
    }
}

fn not_found() -> DomainError {
    DomainError::NotFound {
        resource: "User".to_string(),
    }
}
