//! Roles and the precedence table used to pick a "current" profile.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::entities::profile::Profile;

/// A logical identity a phone number can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    BuyerSeller,
    Broker,
    Developer,
    SocietyOwner,
    SocietyMember,
    Admin,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::BuyerSeller,
        Role::Broker,
        Role::Developer,
        Role::SocietyOwner,
        Role::SocietyMember,
        Role::Admin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::BuyerSeller => "buyer_seller",
            Role::Broker => "broker",
            Role::Developer => "developer",
            Role::SocietyOwner => "society_owner",
            Role::SocietyMember => "society_member",
            Role::Admin => "admin",
        }
    }

    /// Rank used when a single current profile must be derived.
    ///
    /// Lower wins. Roles sharing a rank fall back to profile creation order.
    pub fn precedence(&self) -> u8 {
        match self {
            Role::SocietyOwner => 0,
            Role::BuyerSeller
            | Role::Broker
            | Role::Developer
            | Role::SocietyMember
            | Role::Admin => 1,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .iter()
            .copied()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| format!("Unknown role: {}", s))
    }
}

/// Pick the current profile among a user's profiles.
///
/// Only active profiles are candidates. The best precedence rank wins, ties
/// go to the earliest created profile.
pub fn current_profile(profiles: &[Profile]) -> Option<&Profile> {
    profiles
        .iter()
        .filter(|p| p.is_active())
        .min_by_key(|p| (p.role.precedence(), p.created_at))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::profile::ProfileStatus;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn profile_at(role: Role, status: ProfileStatus, minutes_ago: i64) -> Profile {
        let mut profile = Profile::new(Uuid::nil(), role, None);
        profile.status = status;
        profile.created_at = Utc::now() - Duration::minutes(minutes_ago);
        profile
    }

    #[test]
    fn test_role_round_trips_through_str() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>(), Ok(role));
        }
        assert!("landlord".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_serde_is_snake_case() {
        let json = serde_json::to_string(&Role::SocietyOwner).unwrap();
        assert_eq!(json, "\"society_owner\"");
    }

    #[test]
    fn test_society_owner_preferred() {
        let profiles = vec![
            profile_at(Role::Broker, ProfileStatus::Active, 30),
            profile_at(Role::SocietyOwner, ProfileStatus::Active, 5),
            profile_at(Role::Developer, ProfileStatus::Active, 60),
        ];

        assert_eq!(current_profile(&profiles).map(|p| p.role), Some(Role::SocietyOwner));
    }

    #[test]
    fn test_falls_back_to_creation_order() {
        let profiles = vec![
            profile_at(Role::Broker, ProfileStatus::Active, 30),
            profile_at(Role::Developer, ProfileStatus::Active, 60),
        ];

        assert_eq!(current_profile(&profiles).map(|p| p.role), Some(Role::Developer));
    }

    #[test]
    fn test_inactive_profiles_ignored() {
        let profiles = vec![
            profile_at(Role::SocietyOwner, ProfileStatus::Suspended, 90),
            profile_at(Role::Broker, ProfileStatus::Pending, 60),
            profile_at(Role::Developer, ProfileStatus::Active, 10),
        ];

        assert_eq!(current_profile(&profiles).map(|p| p.role), Some(Role::Developer));
        assert!(current_profile(&profiles[..2]).is_none());
    }
}
