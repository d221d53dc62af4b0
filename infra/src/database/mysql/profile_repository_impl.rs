//! MySQL implementation of the ProfileRepository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};
use uuid::Uuid;

use pa_core::domain::entities::profile::{Profile, ProfileStatus};
use pa_core::domain::value_objects::role::Role;
use pa_core::errors::{AuthError, DomainError};
use pa_core::repositories::ProfileRepository;

use crate::database::connection::is_unique_violation;
use crate::InfrastructureError;

pub struct MySqlProfileRepository {
    pool: MySqlPool,
}

impl MySqlProfileRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    fn row_to_profile(row: &MySqlRow) -> Result<Profile, InfrastructureError> {
        let id: String = row.try_get("id")?;
        let user_id: String = row.try_get("user_id")?;
        let role: String = row.try_get("role")?;
        let status: String = row.try_get("status")?;

        let parse_uuid = |value: &str| {
            Uuid::parse_str(value)
                .map_err(|e| InfrastructureError::Corrupt(format!("profile uuid '{}': {}", value, e)))
        };

        Ok(Profile {
            id: parse_uuid(&id)?,
            user_id: parse_uuid(&user_id)?,
            role: role.parse::<Role>().map_err(InfrastructureError::Corrupt)?,
            status: status
                .parse::<ProfileStatus>()
                .map_err(InfrastructureError::Corrupt)?,
            full_name: row.try_get("full_name")?,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
            updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
        })
    }
}

#[async_trait]
impl ProfileRepository for MySqlProfileRepository {
    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<Profile>, DomainError> {
        let query = r#"
            SELECT id, user_id, role, status, full_name, created_at, updated_at
            FROM profiles
            WHERE user_id = ?
            ORDER BY created_at, id
        "#;

        let rows = sqlx::query(query)
            .bind(user_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(InfrastructureError::Database)?;

        let profiles = rows
            .iter()
            .map(Self::row_to_profile)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(profiles)
    }

    async fn find_by_user_and_role(
        &self,
        user_id: Uuid,
        role: Role,
    ) -> Result<Option<Profile>, DomainError> {
        let query = r#"
            SELECT id, user_id, role, status, full_name, created_at, updated_at
            FROM profiles
            WHERE user_id = ? AND role = ?
            LIMIT 1
        "#;

        let row = sqlx::query(query)
            .bind(user_id.to_string())
            .bind(role.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(InfrastructureError::Database)?;

        match row {
            Some(row) => Ok(Some(Self::row_to_profile(&row)?)),
            None => Ok(None),
        }
    }

    async fn create(&self, profile: Profile) -> Result<Profile, DomainError> {
        let query = r#"
            INSERT INTO profiles (id, user_id, role, status, full_name, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
        "#;

        let result = sqlx::query(query)
            .bind(profile.id.to_string())
            .bind(profile.user_id.to_string())
            .bind(profile.role.as_str())
            .bind(profile.status.as_str())
            .bind(&profile.full_name)
            .bind(profile.created_at)
            .bind(profile.updated_at)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(profile),
            Err(e) if is_unique_violation(&e) => Err(AuthError::Conflict {
                message: format!("User already holds the {} role", profile.role),
            }
            .into()),
            Err(e) => Err(InfrastructureError::Database(e).into()),
        }
    }

    async fn update_status(
        &self,
        user_id: Uuid,
        role: Role,
        status: ProfileStatus,
    ) -> Result<Profile, DomainError> {
        let result = sqlx::query(
            "UPDATE profiles SET status = ?, updated_at = ? WHERE user_id = ? AND role = ?",
        )
        .bind(status.as_str())
        .bind(Utc::now())
        .bind(user_id.to_string())
        .bind(role.as_str())
        .execute(&self.pool)
        .await
        .map_err(InfrastructureError::Database)?;

        tracing::debug!(
            user_id = %user_id,
            role = %role,
            status = %status,
            rows = result.rows_affected(),
            "Profile status updated"
        );

        self.find_by_user_and_role(user_id, role)
            .await?
            .ok_or_else(|| DomainError::NotFound {
                resource: format!("{} profile of user {}", role, user_id),
            })
    }
}
