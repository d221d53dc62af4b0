//! Redis-backed token denylist
//!
//! Revoked token ids are plain keys set with `NX` and expiring with the token,
//! so the first revoker wins and nothing outlives the token it blocks. The
//! per-user cutoff is a millisecond timestamp that a small script only ever
//! moves forward.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use redis::Script;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use pa_core::errors::DomainError;
use pa_core::repositories::TokenDenylist;

use crate::cache::redis_client::RedisClient;
use crate::InfrastructureError;

const ADVANCE_CUTOFF_SCRIPT: &str = r#"
local current = tonumber(redis.call('GET', KEYS[1]) or '0')
if tonumber(ARGV[1]) > current then
  redis.call('SET', KEYS[1], ARGV[1], 'EX', ARGV[2])
  return 1
end
redis.call('EXPIRE', KEYS[1], ARGV[2])
return 0
"#;

#[derive(Clone)]
pub struct RedisTokenDenylist {
    redis_client: Arc<RedisClient>,
    /// How long a cutoff must be remembered: the longest token lifetime
    cutoff_ttl_seconds: u64,
    advance_cutoff: Script,
}

impl RedisTokenDenylist {
    pub fn new(redis_client: Arc<RedisClient>, cutoff_ttl_seconds: u64) -> Self {
        Self {
            redis_client,
            cutoff_ttl_seconds: cutoff_ttl_seconds.max(1),
            advance_cutoff: Script::new(ADVANCE_CUTOFF_SCRIPT),
        }
    }

    fn jti_key(&self, jti: &str) -> String {
        self.redis_client.key(&format!("denylist:jti:{}", jti))
    }

    fn cutoff_key(&self, user_id: Uuid) -> String {
        self.redis_client.key(&format!("denylist:cutoff:{}", user_id))
    }
}

#[async_trait]
impl TokenDenylist for RedisTokenDenylist {
    async fn revoke(&self, jti: &str, expires_at: DateTime<Utc>) -> Result<bool, DomainError> {
        let ttl_ms = (expires_at - Utc::now()).num_milliseconds().max(1000);

        // Single attempt: a retried SET NX would report the caller's own
        // write as someone else's.
        let mut conn = self.redis_client.connection();
        let reply: Option<String> = redis::cmd("SET")
            .arg(self.jti_key(jti))
            .arg("1")
            .arg("NX")
            .arg("PX")
            .arg(ttl_ms)
            .query_async(&mut conn)
            .await
            .map_err(InfrastructureError::Cache)?;

        Ok(reply.is_some())
    }

    async fn is_revoked(&self, jti: &str) -> Result<bool, DomainError> {
        Ok(self.redis_client.exists(&self.jti_key(jti)).await?)
    }

    async fn revoke_all_for_user(
        &self,
        user_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let key = self.cutoff_key(user_id);
        let script = self.advance_cutoff.clone();
        let at_ms = at.timestamp_millis();
        let ttl = self.cutoff_ttl_seconds;

        self.redis_client
            .execute_with_retry(move |mut conn| {
                let key = key.clone();
                let script = script.clone();
                Box::pin(async move {
                    script
                        .key(key)
                        .arg(at_ms)
                        .arg(ttl)
                        .invoke_async::<_, i64>(&mut conn)
                        .await
                })
            })
            .await
            .map_err(InfrastructureError::Cache)?;

        info!(
            event = "tokens_revoked_for_user",
            user_id = %user_id,
            "Revocation cutoff advanced"
        );
        Ok(())
    }

    async fn revoked_before(&self, user_id: Uuid) -> Result<Option<DateTime<Utc>>, DomainError> {
        let Some(raw) = self.redis_client.get(&self.cutoff_key(user_id)).await? else {
            return Ok(None);
        };

        let cutoff = raw
            .parse::<i64>()
            .ok()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
            .ok_or_else(|| InfrastructureError::Corrupt(format!("bad revocation cutoff '{}'", raw)))?;
        Ok(Some(cutoff))
    }
}
