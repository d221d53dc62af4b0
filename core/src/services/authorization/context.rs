use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::entities::profile::Profile;
use crate::domain::entities::user::User;
use crate::domain::value_objects::role::Role;
use crate::errors::AuthError;

/// Authenticated caller as seen by business handlers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestContext {
    pub user: User,
    /// Profile of the role bound to the access token
    pub active_profile: Profile,
    /// All profiles of the user in creation order
    pub profiles: Vec<Profile>,
    /// `jti` of the access token
    pub token_id: String,
    pub token_expires_at: DateTime<Utc>,
}

impl RequestContext {
    pub fn user_id(&self) -> Uuid {
        self.user.id
    }

    pub fn active_role(&self) -> Role {
        self.active_profile.role
    }

    /// Role gate: the active role must be one of `allowed`
    pub fn authorize(&self, allowed: &[Role]) -> Result<(), AuthError> {
        if allowed.contains(&self.active_role()) {
            return Ok(());
        }
        tracing::warn!(
            user_id = %self.user.id,
            actual = %self.active_role(),
            required = ?allowed,
            event = "authorization_denied",
            "Role not permitted"
        );
        Err(AuthError::Forbidden {
            required: allowed.to_vec(),
            actual: Some(self.active_role()),
        })
    }
}
