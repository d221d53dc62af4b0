use chrono::{DateTime, Duration, Utc};
use pa_shared::config::auth::AuthConfig;
use pa_shared::utils::phone::mask_phone_number;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::profile::{Profile, ProfileStatus};
use crate::domain::entities::user::{AccountChange, User};
use crate::domain::value_objects::role::Role;
use crate::errors::DomainResult;
use crate::repositories::{ProfileRepository, TokenDenylist, UserRepository};
use crate::services::token::TokenService;

/// Administrative state transitions on users and profiles
///
/// Suspension and deactivation also revoke every outstanding token, so a
/// later reinstatement does not bring old sessions back.
pub struct AccountService<U: UserRepository, P: ProfileRepository, D: TokenDenylist> {
    users: Arc<U>,
    profiles: Arc<P>,
    tokens: Arc<TokenService<D>>,
    config: AuthConfig,
}

impl<U, P, D> AccountService<U, P, D>
where
    U: UserRepository,
    P: ProfileRepository,
    D: TokenDenylist,
{
    pub fn new(
        users: Arc<U>,
        profiles: Arc<P>,
        tokens: Arc<TokenService<D>>,
        config: AuthConfig,
    ) -> Self {
        Self {
            users,
            profiles,
            tokens,
            config,
        }
    }

    /// Apply a status change and revoke sessions where the change demands it
    pub async fn change(&self, user_id: Uuid, change: AccountChange) -> DomainResult<User> {
        let user = self.users.apply_change(user_id, &change).await?;
        tracing::info!(user_id = %user_id, event = change.event(), "Account status changed");
        if change.revokes_sessions() {
            self.tokens.revoke_all_for_user(user_id).await?;
        }
        Ok(user)
    }

    pub async fn suspend(&self, user_id: Uuid, reason: impl Into<String>) -> DomainResult<User> {
        self.change(
            user_id,
            AccountChange::Suspend {
                reason: reason.into(),
            },
        )
        .await
    }

    pub async fn unsuspend(&self, user_id: Uuid) -> DomainResult<User> {
        self.change(user_id, AccountChange::Unsuspend).await
    }

    /// Lock until `until`, or until an administrator unlocks when `None`
    pub async fn lock(&self, user_id: Uuid, until: Option<DateTime<Utc>>) -> DomainResult<User> {
        self.change(user_id, AccountChange::Lock { until }).await
    }

    pub async fn unlock(&self, user_id: Uuid) -> DomainResult<User> {
        self.change(user_id, AccountChange::Unlock).await
    }

    pub async fn deactivate(&self, user_id: Uuid) -> DomainResult<User> {
        self.change(user_id, AccountChange::Deactivate).await
    }

    pub async fn reactivate(&self, user_id: Uuid) -> DomainResult<User> {
        self.change(user_id, AccountChange::Reactivate).await
    }

    pub async fn set_profile_status(
        &self,
        user_id: Uuid,
        role: Role,
        status: ProfileStatus,
    ) -> DomainResult<Profile> {
        let profile = self.profiles.update_status(user_id, role, status).await?;
        tracing::info!(
            user_id = %user_id,
            role = %role,
            status = %status,
            event = "profile_status_changed",
            "Profile status changed"
        );
        Ok(profile)
    }

    /// Count a failed verification against the phone's user, locking the
    /// account once the threshold is reached. Unknown phones are ignored.
    ///
    /// The counter is incremented in the store, and the lock is only placed
    /// when none is in force, so an administrative lock keeps its terms.
    pub async fn record_failed_attempt(&self, phone: &str) -> DomainResult<()> {
        let Some(user) = self.users.increment_failed_attempts(phone).await? else {
            return Ok(());
        };

        let failures = user.failed_attempts;
        let threshold = self.config.account_lock_threshold;
        if threshold == 0 || failures < threshold {
            return Ok(());
        }

        let now = Utc::now();
        let until = now + Duration::minutes(self.config.account_lock_minutes);
        if self.users.lock_if_unlocked(user.id, until, now).await? {
            tracing::warn!(
                user_id = %user.id,
                phone = %mask_phone_number(phone),
                failures,
                locked_until = %until,
                event = "account_locked_failed_attempts",
                "Account locked after repeated verification failures"
            );
        }
        Ok(())
    }

    pub async fn reset_failed_attempts(&self, user_id: Uuid) -> DomainResult<()> {
        self.users.reset_failed_attempts(user_id).await
    }

    /// Stamp a successful login without touching status columns
    pub async fn record_login(&self, user_id: Uuid) -> DomainResult<User> {
        self.users.record_login(user_id, Utc::now()).await
    }
}
