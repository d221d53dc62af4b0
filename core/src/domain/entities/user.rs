//! User entity: one per phone number.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AuthError;

/// A physical identity, keyed by its E.164 phone number.
///
/// Users are never deleted; they are deactivated. Suspension and locking are
/// orthogonal to activation and are re-checked on every authenticated request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,

    /// E.164 phone number, globally unique
    pub phone: String,

    pub is_active: bool,

    pub is_suspended: bool,
    pub suspension_reason: Option<String>,

    pub is_locked: bool,
    /// When a lock lifts on its own; `None` means until an administrator unlocks
    pub locked_until: Option<DateTime<Utc>>,

    /// Consecutive failed OTP verifications
    pub failed_attempts: u32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl User {
    /// Creates a new active user for a phone number
    pub fn new(phone: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            phone: phone.into(),
            is_active: true,
            is_suspended: false,
            suspension_reason: None,
            is_locked: false,
            locked_until: None,
            failed_attempts: 0,
            created_at: now,
            updated_at: now,
            last_login_at: None,
        }
    }

    pub fn suspend(&mut self, reason: impl Into<String>) {
        self.is_suspended = true;
        self.suspension_reason = Some(reason.into());
        self.updated_at = Utc::now();
    }

    pub fn unsuspend(&mut self) {
        self.is_suspended = false;
        self.suspension_reason = None;
        self.updated_at = Utc::now();
    }

    pub fn lock(&mut self, until: Option<DateTime<Utc>>) {
        self.is_locked = true;
        self.locked_until = until;
        self.updated_at = Utc::now();
    }

    pub fn unlock(&mut self) {
        self.is_locked = false;
        self.locked_until = None;
        self.failed_attempts = 0;
        self.updated_at = Utc::now();
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
        self.updated_at = Utc::now();
    }

    pub fn reactivate(&mut self) {
        self.is_active = true;
        self.updated_at = Utc::now();
    }

    /// Whether the lock is still in force at `now`.
    ///
    /// A lock whose unlock time has passed no longer applies, even if the
    /// stored flag has not been cleared yet.
    pub fn is_locked_at(&self, now: DateTime<Utc>) -> bool {
        match (self.is_locked, self.locked_until) {
            (false, _) => false,
            (true, None) => true,
            (true, Some(until)) => until > now,
        }
    }

    /// Whether the stored lock flag is stale and can be cleared
    pub fn has_expired_lock(&self, now: DateTime<Utc>) -> bool {
        self.is_locked && !self.is_locked_at(now)
    }

    /// Fails with the account-status error that blocks this user at `now`.
    ///
    /// Deactivation is checked first, then suspension, then locking.
    pub fn ensure_accessible(&self, now: DateTime<Utc>) -> Result<(), AuthError> {
        if !self.is_active {
            return Err(AuthError::AccountDeactivated);
        }
        if self.is_suspended {
            return Err(AuthError::AccountSuspended {
                reason: self.suspension_reason.clone(),
            });
        }
        if self.is_locked_at(now) {
            return Err(AuthError::AccountLocked {
                until: self.locked_until,
            });
        }
        Ok(())
    }

    /// Records a failed OTP verification, returning the new count
    pub fn record_failed_attempt(&mut self) -> u32 {
        self.failed_attempts = self.failed_attempts.saturating_add(1);
        self.updated_at = Utc::now();
        self.failed_attempts
    }

    /// Records a successful login at `at`
    pub fn record_login(&mut self, at: DateTime<Utc>) {
        self.failed_attempts = 0;
        self.last_login_at = Some(at);
        self.updated_at = at;
    }
}

/// An administrative status transition.
///
/// Each change touches only its own columns, so it never overwrites a
/// concurrent change to an unrelated field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountChange {
    Suspend { reason: String },
    Unsuspend,
    /// `until: None` holds until an administrator unlocks
    Lock { until: Option<DateTime<Utc>> },
    Unlock,
    Deactivate,
    Reactivate,
}

impl AccountChange {
    pub fn apply(&self, user: &mut User) {
        match self {
            AccountChange::Suspend { reason } => user.suspend(reason.clone()),
            AccountChange::Unsuspend => user.unsuspend(),
            AccountChange::Lock { until } => user.lock(*until),
            AccountChange::Unlock => user.unlock(),
            AccountChange::Deactivate => user.deactivate(),
            AccountChange::Reactivate => user.reactivate(),
        }
    }

    /// Audit event name
    pub fn event(&self) -> &'static str {
        match self {
            AccountChange::Suspend { .. } => "account_suspended",
            AccountChange::Unsuspend => "account_unsuspended",
            AccountChange::Lock { .. } => "account_locked",
            AccountChange::Unlock => "account_unlocked",
            AccountChange::Deactivate => "account_deactivated",
            AccountChange::Reactivate => "account_reactivated",
        }
    }

    /// Whether outstanding tokens must be revoked
    pub fn revokes_sessions(&self) -> bool {
        matches!(self, AccountChange::Suspend { .. } | AccountChange::Deactivate)
    }
}
