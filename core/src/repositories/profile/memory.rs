//! In-memory implementation of ProfileRepository for tests and local development

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::profile::{Profile, ProfileStatus};
use crate::domain::value_objects::role::Role;
use crate::errors::{AuthError, DomainError};

use super::trait_::ProfileRepository;

/// Profile repository keyed by `(user_id, role)`
#[derive(Clone)]
pub struct InMemoryProfileRepository {
    profiles: Arc<RwLock<HashMap<(Uuid, Role), Profile>>>,
}

impl InMemoryProfileRepository {
    pub fn new() -> Self {
        Self {
            profiles: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryProfileRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProfileRepository for InMemoryProfileRepository {
    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<Profile>, DomainError> {
        let profiles = self.profiles.read().await;
        let mut found: Vec<Profile> = profiles
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        found.sort_by_key(|p| (p.created_at, p.id));
        Ok(found)
    }

    async fn find_by_user_and_role(
        &self,
        user_id: Uuid,
        role: Role,
    ) -> Result<Option<Profile>, DomainError> {
        let profiles = self.profiles.read().await;
        Ok(profiles.get(&(user_id, role)).cloned())
    }

    async fn create(&self, profile: Profile) -> Result<Profile, DomainError> {
        let mut profiles = self.profiles.write().await;
        let key = (profile.user_id, profile.role);

        if profiles.contains_key(&key) {
            return Err(AuthError::Conflict {
                message: format!("Profile already exists for role {}", profile.role),
            }
            .into());
        }

        profiles.insert(key, profile.clone());
        Ok(profile)
    }

    async fn update_status(
        &self,
        user_id: Uuid,
        role: Role,
        status: ProfileStatus,
    ) -> Result<Profile, DomainError> {
        let mut profiles = self.profiles.write().await;
        let profile = profiles
            .get_mut(&(user_id, role))
            .ok_or_else(|| DomainError::NotFound {
                resource: "Profile".to_string(),
            })?;

        profile.status = status;
        profile.updated_at = Utc::now();
        Ok(profile.clone())
    }
}
