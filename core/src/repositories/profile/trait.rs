//! Profile repository trait.
//!
//! A profile is the per-role account record of a user. The store enforces at
//! most one profile per `(user_id, role)`.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::profile::{Profile, ProfileStatus};
use crate::domain::value_objects::role::Role;
use crate::errors::DomainError;

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// All profiles of a user in creation order
    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<Profile>, DomainError>;

    async fn find_by_user_and_role(
        &self,
        user_id: Uuid,
        role: Role,
    ) -> Result<Option<Profile>, DomainError>;

    /// Persist a new profile
    ///
    /// # Returns
    /// * `Err(DomainError::Auth(AuthError::Conflict { .. }))` - The user already holds this role
    async fn create(&self, profile: Profile) -> Result<Profile, DomainError>;

    /// Change the status of the user's profile for a role
    ///
    /// # Returns
    /// * `Err(DomainError::NotFound { .. })` - The user has no profile for this role
    async fn update_status(
        &self,
        user_id: Uuid,
        role: Role,
        status: ProfileStatus,
    ) -> Result<Profile, DomainError>;
}
