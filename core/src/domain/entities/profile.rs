//! Profile entity: one per (user, role).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::value_objects::role::Role;
use crate::errors::AuthError;

/// Lifecycle state of a profile, driven by administrative collaborators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileStatus {
    Active,
    Pending,
    Suspended,
    Removed,
}

impl ProfileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileStatus::Active => "active",
            ProfileStatus::Pending => "pending",
            ProfileStatus::Suspended => "suspended",
            ProfileStatus::Removed => "removed",
        }
    }
}

impl fmt::Display for ProfileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProfileStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ProfileStatus::Active),
            "pending" => Ok(ProfileStatus::Pending),
            "suspended" => Ok(ProfileStatus::Suspended),
            "removed" => Ok(ProfileStatus::Removed),
            _ => Err(format!("Unknown profile status: {}", s)),
        }
    }
}

/// The per-role account record linked to a User.
///
/// Role-specific attributes (company name, license number and so on) belong
/// to business collaborators and are not modelled here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub role: Role,
    pub status: ProfileStatus,
    pub full_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Creates a new active profile
    pub fn new(user_id: Uuid, role: Role, full_name: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            role,
            status: ProfileStatus::Active,
            full_name,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == ProfileStatus::Active
    }

    /// The status error matching a non-active profile
    pub fn status_error(&self) -> Option<AuthError> {
        match self.status {
            ProfileStatus::Active => None,
            ProfileStatus::Pending => Some(AuthError::PendingApproval { role: self.role }),
            ProfileStatus::Suspended => Some(AuthError::ProfileSuspended { role: self.role }),
            ProfileStatus::Removed => Some(AuthError::ProfileRemoved { role: self.role }),
        }
    }

    pub fn ensure_active(&self) -> Result<(), AuthError> {
        match self.status_error() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
