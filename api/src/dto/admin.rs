use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use pa_core::domain::entities::profile::{Profile, ProfileStatus};
use pa_core::domain::entities::user::User;
use pa_core::domain::value_objects::role::Role;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SuspendRequest {
    #[validate(length(min = 1, max = 500))]
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LockRequest {
    /// Lift the lock automatically at this time; absent means until unlocked
    #[serde(default)]
    pub until: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileStatusRequest {
    pub status: ProfileStatus,
}

/// User as returned to clients; the failed-attempt counter stays internal
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: Uuid,
    pub phone: String,
    pub is_active: bool,
    pub is_suspended: bool,
    pub suspension_reason: Option<String>,
    pub is_locked: bool,
    pub locked_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            phone: user.phone.clone(),
            is_active: user.is_active,
            is_suspended: user.is_suspended,
            suspension_reason: user.suspension_reason.clone(),
            is_locked: user.is_locked,
            locked_until: user.locked_until,
            created_at: user.created_at,
            last_login_at: user.last_login_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    pub id: Uuid,
    pub role: Role,
    pub status: ProfileStatus,
    pub full_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&Profile> for ProfileView {
    fn from(profile: &Profile) -> Self {
        Self {
            id: profile.id,
            role: profile.role,
            status: profile.status,
            full_name: profile.full_name.clone(),
            created_at: profile.created_at,
        }
    }
}
