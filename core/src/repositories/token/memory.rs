//! In-memory token denylist

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::DomainError;

use super::trait_::TokenDenylist;

#[derive(Clone, Default)]
pub struct InMemoryTokenDenylist {
    revoked: Arc<RwLock<HashMap<String, DateTime<Utc>>>>,
    cutoffs: Arc<RwLock<HashMap<Uuid, DateTime<Utc>>>>,
}

impl InMemoryTokenDenylist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop entries whose tokens have expired anyway; returns how many were removed
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let mut revoked = self.revoked.write().await;
        let before = revoked.len();
        revoked.retain(|_, expires_at| *expires_at > now);
        before - revoked.len()
    }

    pub async fn len(&self) -> usize {
        self.revoked.read().await.len()
    }
}

#[async_trait]
impl TokenDenylist for InMemoryTokenDenylist {
    async fn revoke(&self, jti: &str, expires_at: DateTime<Utc>) -> Result<bool, DomainError> {
        let mut revoked = self.revoked.write().await;
        if revoked.contains_key(jti) {
            return Ok(false);
        }
        revoked.insert(jti.to_string(), expires_at);
        Ok(true)
    }

    async fn is_revoked(&self, jti: &str) -> Result<bool, DomainError> {
        Ok(self.revoked.read().await.contains_key(jti))
    }

    async fn revoke_all_for_user(
        &self,
        user_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let mut cutoffs = self.cutoffs.write().await;
        let cutoff = cutoffs.entry(user_id).or_insert(at);
        if at > *cutoff {
            *cutoff = at;
        }
        Ok(())
    }

    async fn revoked_before(&self, user_id: Uuid) -> Result<Option<DateTime<Utc>>, DomainError> {
        Ok(self.cutoffs.read().await.get(&user_id).copied())
    }
}
