//! Role resolver implementation
//!
//! Registration creates the profile (and the user on a phone's first
//! verification). Login looks the profiles up and either resolves one or
//! asks the caller to choose among the active ones.

use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::otp::OtpPurpose;
use crate::domain::entities::profile::Profile;
use crate::domain::entities::user::User;
use crate::domain::value_objects::role::{current_profile, Role};
use crate::errors::{AuthError, DomainError, DomainResult, ValidationError};
use crate::repositories::{ProfileRepository, UserRepository};
use crate::services::otp::VerifiedOtp;

/// Outcome of resolving a verified phone
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Exactly one profile becomes active
    Resolved {
        user: User,
        profile: Profile,
        /// The profile was created by this resolution
        created: bool,
    },
    /// More than one active profile; an explicit selection is required
    ChooseRole {
        user: User,
        available_roles: Vec<Role>,
    },
}

pub struct RoleResolver<U: UserRepository, P: ProfileRepository> {
    users: Arc<U>,
    profiles: Arc<P>,
}

impl<U: UserRepository, P: ProfileRepository> RoleResolver<U, P> {
    pub fn new(users: Arc<U>, profiles: Arc<P>) -> Self {
        Self { users, profiles }
    }

    /// Resolve a successful verification according to its purpose
    pub async fn resolve(
        &self,
        verified: &VerifiedOtp,
        full_name: Option<String>,
    ) -> DomainResult<Resolution> {
        let key = &verified.key;
        match key.purpose {
            OtpPurpose::Registration => {
                let role = key.scope.role().ok_or_else(|| ValidationError::RequiredField {
                    field: "role".to_string(),
                })?;
                self.register(&key.phone, role, full_name).await
            }
            OtpPurpose::Login => self.login(&key.phone, key.scope.role()).await,
        }
    }

    async fn find_or_create_user(&self, phone: &str) -> DomainResult<User> {
        if let Some(user) = self.users.find_by_phone(phone).await? {
            return Ok(user);
        }

        match self.users.create(User::new(phone)).await {
            Ok(user) => {
                tracing::info!(user_id = %user.id, event = "user_created", "New user created");
                Ok(user)
            }
            // Lost a race with a concurrent first verification for this phone
            Err(DomainError::Auth(AuthError::Conflict { .. })) => self
                .users
                .find_by_phone(phone)
                .await?
                .ok_or_else(|| DomainError::internal("user vanished after create conflict")),
            Err(e) => Err(e),
        }
    }

    async fn register(
        &self,
        phone: &str,
        role: Role,
        full_name: Option<String>,
    ) -> DomainResult<Resolution> {
        let user = self.find_or_create_user(phone).await?;
        user.ensure_accessible(Utc::now())?;

        if self
            .profiles
            .find_by_user_and_role(user.id, role)
            .await?
            .is_some()
        {
            return Err(AuthError::Conflict {
                message: format!("Profile already exists for role {}", role),
            }
            .into());
        }

        let profile = self
            .profiles
            .create(Profile::new(user.id, role, full_name))
            .await?;

        tracing::info!(
            user_id = %user.id,
            role = %role,
            event = "profile_created",
            "Profile registered"
        );

        Ok(Resolution::Resolved {
            user,
            profile,
            created: true,
        })
    }

    async fn login(&self, phone: &str, role: Option<Role>) -> DomainResult<Resolution> {
        let user = self
            .users
            .find_by_phone(phone)
            .await?
            .ok_or(AuthError::NoAccount)?;
        user.ensure_accessible(Utc::now())?;

        if let Some(role) = role {
            let profile = self
                .profiles
                .find_by_user_and_role(user.id, role)
                .await?
                .ok_or(AuthError::NoAccount)?;
            profile.ensure_active()?;
            return Ok(Resolution::Resolved {
                user,
                profile,
                created: false,
            });
        }

        let profiles = self.profiles.find_by_user(user.id).await?;
        let mut active: Vec<Profile> = profiles.iter().filter(|p| p.is_active()).cloned().collect();

        match (profiles.first(), active.len()) {
            (None, _) => Err(AuthError::NoAccount.into()),
            // Nothing usable: report the status of the oldest profile
            (Some(first), 0) => Err(inactive_profile_error(first)),
            (Some(_), 1) => Ok(Resolution::Resolved {
                user,
                profile: active.remove(0),
                created: false,
            }),
            (Some(_), _) => Ok(Resolution::ChooseRole {
                user,
                available_roles: active.iter().map(|p| p.role).collect(),
            }),
        }
    }

    /// Activate `role` for a user after a role-agnostic login
    pub async fn select(&self, user_id: Uuid, role: Role) -> DomainResult<(User, Profile)> {
        let user = self.load_accessible_user(user_id).await?;
        let profile = self
            .profiles
            .find_by_user_and_role(user_id, role)
            .await?
            .ok_or(AuthError::NoAccount)?;
        profile.ensure_active()?;
        Ok((user, profile))
    }

    /// Re-resolve the role at refresh time
    ///
    /// An explicit role must still be active. Without one, the current
    /// profile by precedence is used.
    pub async fn resolve_for_refresh(
        &self,
        user_id: Uuid,
        role: Option<Role>,
    ) -> DomainResult<(User, Profile)> {
        if let Some(role) = role {
            return self.select(user_id, role).await;
        }

        let user = self.load_accessible_user(user_id).await?;
        let profiles = self.profiles.find_by_user(user_id).await?;
        match current_profile(&profiles) {
            Some(profile) => Ok((user, profile.clone())),
            None => match profiles.first() {
                Some(first) => Err(inactive_profile_error(first)),
                None => Err(AuthError::NoAccount.into()),
            },
        }
    }

    async fn load_accessible_user(&self, user_id: Uuid) -> DomainResult<User> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AuthError::unauthenticated("user not found"))?;
        user.ensure_accessible(Utc::now())?;
        Ok(user)
    }
}

fn inactive_profile_error(profile: &Profile) -> DomainError {
    profile
        .status_error()
        .map(DomainError::from)
        .unwrap_or_else(|| DomainError::internal("active profile reported as inactive"))
}
