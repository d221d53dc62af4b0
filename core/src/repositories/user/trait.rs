//! User repository trait defining the interface for user persistence.
//!
//! Users are keyed by id and uniquely by E.164 phone. They are never deleted,
//! so the trait has no delete operation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entities::user::{AccountChange, User};
use crate::errors::DomainError;

/// Repository trait for User entity persistence operations
///
/// # Example
/// ```no_run
/// # use pa_core::repositories::UserRepository;
/// # async fn example(repo: &impl UserRepository) -> Result<(), Box<dyn std::error::Error>> {
/// match repo.find_by_phone("+14155550123").await? {
///     Some(user) => println!("User found: {}", user.id),
///     None => println!("User not found"),
/// }
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by their unique identifier
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError>;

    /// Find a user by E.164 phone number
    async fn find_by_phone(&self, phone: &str) -> Result<Option<User>, DomainError>;

    /// Persist a new user
    ///
    /// # Returns
    /// * `Ok(User)` - The created user
    /// * `Err(DomainError::Auth(AuthError::Conflict { .. }))` - The phone is already registered
    async fn create(&self, user: User) -> Result<User, DomainError>;

    /// Apply an administrative status change, writing only its columns
    ///
    /// # Returns
    /// * `Ok(User)` - The user as stored after the change
    /// * `Err(DomainError::NotFound { .. })` - No user with this id exists
    async fn apply_change(&self, id: Uuid, change: &AccountChange) -> Result<User, DomainError>;

    /// Stamp a successful login and clear the failed-attempt counter
    async fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<User, DomainError>;

    /// Atomically add one failed verification for the phone's user
    ///
    /// # Returns
    /// * `Ok(Some(User))` - The user after the increment
    /// * `Ok(None)` - No user holds this phone
    async fn increment_failed_attempts(&self, phone: &str) -> Result<Option<User>, DomainError>;

    async fn reset_failed_attempts(&self, id: Uuid) -> Result<(), DomainError>;

    /// Lock until `until` unless a lock is already in force at `now`
    ///
    /// Returns whether this call placed the lock. An existing lock, such as
    /// an indefinite administrative one, is left untouched.
    async fn lock_if_unlocked(
        &self,
        id: Uuid,
        until: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<bool, DomainError>;

    /// Clear a timed lock whose unlock time has passed at `now`
    ///
    /// Returns whether a lock was cleared. A lock that is still in force, or
    /// one placed again since it was read, is left untouched.
    async fn release_expired_lock(&self, id: Uuid, now: DateTime<Utc>) -> Result<bool, DomainError>;
}
