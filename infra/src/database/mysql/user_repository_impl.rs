//! MySQL implementation of the UserRepository trait.
//!
//! Users are stored by E.164 phone with a UNIQUE constraint; a concurrent
//! insert for the same phone surfaces as `AuthError::Conflict` so callers can
//! re-fetch the winner.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};
use uuid::Uuid;

use pa_core::domain::entities::user::{AccountChange, User};
use pa_core::errors::{AuthError, DomainError};
use pa_core::repositories::UserRepository;

use crate::database::connection::is_unique_violation;
use crate::InfrastructureError;

const USER_COLUMNS: &str = r#"
    id, phone, is_active, is_suspended, suspension_reason,
    is_locked, locked_until, failed_attempts,
    created_at, updated_at, last_login_at
"#;

pub struct MySqlUserRepository {
    pool: MySqlPool,
}

impl MySqlUserRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    fn row_to_user(row: &MySqlRow) -> Result<User, InfrastructureError> {
        let id: String = row.try_get("id")?;

        Ok(User {
            id: Uuid::parse_str(&id)
                .map_err(|e| InfrastructureError::Corrupt(format!("user id '{}': {}", id, e)))?,
            phone: row.try_get("phone")?,
            is_active: row.try_get("is_active")?,
            is_suspended: row.try_get("is_suspended")?,
            suspension_reason: row.try_get("suspension_reason")?,
            is_locked: row.try_get("is_locked")?,
            locked_until: row.try_get::<Option<DateTime<Utc>>, _>("locked_until")?,
            failed_attempts: row.try_get("failed_attempts")?,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
            updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
            last_login_at: row.try_get::<Option<DateTime<Utc>>, _>("last_login_at")?,
        })
    }

    /// Re-read a user after a write, failing when the row does not exist
    async fn require(&self, id: Uuid) -> Result<User, DomainError> {
        self.find_by_id(id).await?.ok_or_else(|| DomainError::NotFound {
            resource: format!("user {}", id),
        })
    }

    async fn fetch_one_where(
        &self,
        predicate: &str,
        value: String,
    ) -> Result<Option<User>, DomainError> {
        let query = format!("SELECT {} FROM users WHERE {} = ? LIMIT 1", USER_COLUMNS, predicate);

        let row = sqlx::query(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(InfrastructureError::Database)?;

        match row {
            Some(row) => Ok(Some(Self::row_to_user(&row)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl UserRepository for MySqlUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        self.fetch_one_where("id", id.to_string()).await
    }

    async fn find_by_phone(&self, phone: &str) -> Result<Option<User>, DomainError> {
        self.fetch_one_where("phone", phone.to_string()).await
    }

    async fn create(&self, user: User) -> Result<User, DomainError> {
        let query = r#"
            INSERT INTO users (
                id, phone, is_active, is_suspended, suspension_reason,
                is_locked, locked_until, failed_attempts,
                created_at, updated_at, last_login_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#;

        let result = sqlx::query(query)
            .bind(user.id.to_string())
            .bind(&user.phone)
            .bind(user.is_active)
            .bind(user.is_suspended)
            .bind(&user.suspension_reason)
            .bind(user.is_locked)
            .bind(user.locked_until)
            .bind(user.failed_attempts)
            .bind(user.created_at)
            .bind(user.updated_at)
            .bind(user.last_login_at)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(user),
            Err(e) if is_unique_violation(&e) => Err(AuthError::Conflict {
                message: "Phone number already registered".to_string(),
            }
            .into()),
            Err(e) => Err(InfrastructureError::Database(e).into()),
        }
    }

    async fn apply_change(&self, id: Uuid, change: &AccountChange) -> Result<User, DomainError> {
        let now = Utc::now();
        let query = match change {
            AccountChange::Suspend { reason } => sqlx::query(
                "UPDATE users SET is_suspended = TRUE, suspension_reason = ?, updated_at = ? WHERE id = ?",
            )
            .bind(reason.clone()),
            AccountChange::Unsuspend => sqlx::query(
                "UPDATE users SET is_suspended = FALSE, suspension_reason = NULL, updated_at = ? WHERE id = ?",
            ),
            AccountChange::Lock { until } => sqlx::query(
                "UPDATE users SET is_locked = TRUE, locked_until = ?, updated_at = ? WHERE id = ?",
            )
            .bind(*until),
            AccountChange::Unlock => sqlx::query(
                "UPDATE users SET is_locked = FALSE, locked_until = NULL, failed_attempts = 0, \
                 updated_at = ? WHERE id = ?",
            ),
            AccountChange::Deactivate => {
                sqlx::query("UPDATE users SET is_active = FALSE, updated_at = ? WHERE id = ?")
            }
            AccountChange::Reactivate => {
                sqlx::query("UPDATE users SET is_active = TRUE, updated_at = ? WHERE id = ?")
            }
        };

        query
            .bind(now)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(InfrastructureError::Database)?;

        self.require(id).await
    }

    async fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<User, DomainError> {
        sqlx::query(
            "UPDATE users SET last_login_at = ?, failed_attempts = 0, updated_at = ? WHERE id = ?",
        )
        .bind(at)
        .bind(at)
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(InfrastructureError::Database)?;

        self.require(id).await
    }

    async fn increment_failed_attempts(&self, phone: &str) -> Result<Option<User>, DomainError> {
        // The row lock taken by the UPDATE is held until commit, so the read
        // below sees exactly this increment.
        let mut tx = self.pool.begin().await.map_err(InfrastructureError::Database)?;

        let result = sqlx::query(
            "UPDATE users SET failed_attempts = failed_attempts + 1, updated_at = ? WHERE phone = ?",
        )
        .bind(Utc::now())
        .bind(phone)
        .execute(&mut *tx)
        .await
        .map_err(InfrastructureError::Database)?;

        if result.rows_affected() == 0 {
            tx.rollback().await.map_err(InfrastructureError::Database)?;
            return Ok(None);
        }

        let query = format!("SELECT {} FROM users WHERE phone = ? LIMIT 1", USER_COLUMNS);
        let row = sqlx::query(&query)
            .bind(phone)
            .fetch_one(&mut *tx)
            .await
            .map_err(InfrastructureError::Database)?;
        let user = Self::row_to_user(&row)?;

        tx.commit().await.map_err(InfrastructureError::Database)?;
        Ok(Some(user))
    }

    async fn reset_failed_attempts(&self, id: Uuid) -> Result<(), DomainError> {
        sqlx::query(
            "UPDATE users SET failed_attempts = 0, updated_at = ? WHERE id = ? AND failed_attempts > 0",
        )
        .bind(Utc::now())
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(InfrastructureError::Database)?;
        Ok(())
    }

    async fn lock_if_unlocked(
        &self,
        id: Uuid,
        until: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE users SET is_locked = TRUE, locked_until = ?, updated_at = ?
            WHERE id = ?
              AND (is_locked = FALSE OR (locked_until IS NOT NULL AND locked_until <= ?))
            "#,
        )
        .bind(until)
        .bind(now)
        .bind(id.to_string())
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(InfrastructureError::Database)?;

        Ok(result.rows_affected() > 0)
    }

    async fn release_expired_lock(&self, id: Uuid, now: DateTime<Utc>) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE users SET is_locked = FALSE, locked_until = NULL, failed_attempts = 0, updated_at = ?
            WHERE id = ? AND is_locked = TRUE AND locked_until IS NOT NULL AND locked_until <= ?
            "#,
        )
        .bind(now)
        .bind(id.to_string())
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(InfrastructureError::Database)?;

        Ok(result.rows_affected() > 0)
    }
}
