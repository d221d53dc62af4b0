//! Redis-backed OTP store
//!
//! Each record lives in one hash under its (prefixed) storage key and expires
//! with the record. Verification attempts are settled by a Lua script so that
//! the compare-state / decrement / consume sequence is a single atomic step on
//! the server, which is what makes a code redeemable exactly once across
//! every API instance.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use redis::Script;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use pa_core::domain::entities::otp::{OtpKey, OtpRecord, OtpState};
use pa_core::errors::DomainError;
use pa_core::services::otp::{OtpSettlement, OtpStore};

use crate::cache::redis_client::RedisClient;
use crate::InfrastructureError;

const SETTLE_SCRIPT: &str = r#"
local id = redis.call('HGET', KEYS[1], 'id')
if not id then return {'missing', 0} end
if id ~= ARGV[1] then return {'superseded', 0} end
local state = redis.call('HGET', KEYS[1], 'state')
if state == 'consumed' then return {'already_consumed', 0} end
if state == 'exhausted' then return {'exhausted', 0} end
local expires_at = tonumber(redis.call('HGET', KEYS[1], 'expires_at'))
if tonumber(ARGV[3]) >= expires_at then return {'expired', 0} end
if ARGV[2] == '1' then
  redis.call('HSET', KEYS[1], 'state', 'consumed')
  return {'consumed', 0}
end
local remaining = redis.call('HINCRBY', KEYS[1], 'attempts_remaining', -1)
if remaining <= 0 then
  remaining = 0
  redis.call('HSET', KEYS[1], 'attempts_remaining', 0, 'state', 'exhausted')
end
return {'mismatch', remaining}
"#;

const CLAMP_SCRIPT: &str = r#"
local id = redis.call('HGET', KEYS[1], 'id')
if id ~= ARGV[1] then return 0 end
local expires_at = tonumber(redis.call('HGET', KEYS[1], 'expires_at'))
local until_ms = tonumber(ARGV[2])
if until_ms < expires_at then
  redis.call('HSET', KEYS[1], 'expires_at', ARGV[2])
  redis.call('PEXPIREAT', KEYS[1], ARGV[2])
  return 1
end
return 0
"#;

/// OTP store over a shared [`RedisClient`]
#[derive(Clone)]
pub struct RedisOtpStore {
    redis_client: Arc<RedisClient>,
    settle_script: Script,
    clamp_script: Script,
}

impl RedisOtpStore {
    pub fn new(redis_client: Arc<RedisClient>) -> Self {
        Self {
            redis_client,
            settle_script: Script::new(SETTLE_SCRIPT),
            clamp_script: Script::new(CLAMP_SCRIPT),
        }
    }

    fn redis_key(&self, key: &OtpKey) -> String {
        self.redis_client.key(&key.storage_key())
    }
}

fn encode_record(record: &OtpRecord) -> Vec<(&'static str, String)> {
    vec![
        ("id", record.id.to_string()),
        ("phone", record.key.phone.clone()),
        ("scope", record.key.scope.as_str().to_string()),
        ("purpose", record.key.purpose.as_str().to_string()),
        ("code_hash", record.code_hash.clone()),
        ("salt", record.salt.clone()),
        ("issued_at", record.issued_at.timestamp_millis().to_string()),
        ("expires_at", record.expires_at.timestamp_millis().to_string()),
        ("attempts_remaining", record.attempts_remaining.to_string()),
        ("state", record.state.as_str().to_string()),
    ]
}

fn decode_record(fields: &HashMap<String, String>) -> Result<OtpRecord, InfrastructureError> {
    fn field<'a>(
        fields: &'a HashMap<String, String>,
        name: &str,
    ) -> Result<&'a str, InfrastructureError> {
        fields
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| InfrastructureError::Corrupt(format!("otp record missing '{}'", name)))
    }

    fn millis(value: &str, name: &str) -> Result<DateTime<Utc>, InfrastructureError> {
        value
            .parse::<i64>()
            .ok()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
            .ok_or_else(|| InfrastructureError::Corrupt(format!("otp record has bad '{}'", name)))
    }

    let corrupt = |e: String| InfrastructureError::Corrupt(e);

    Ok(OtpRecord {
        id: Uuid::parse_str(field(fields, "id")?)
            .map_err(|e| corrupt(format!("otp record id: {}", e)))?,
        key: OtpKey {
            phone: field(fields, "phone")?.to_string(),
            scope: field(fields, "scope")?.parse().map_err(corrupt)?,
            purpose: field(fields, "purpose")?.parse().map_err(corrupt)?,
        },
        code_hash: field(fields, "code_hash")?.to_string(),
        salt: field(fields, "salt")?.to_string(),
        issued_at: millis(field(fields, "issued_at")?, "issued_at")?,
        expires_at: millis(field(fields, "expires_at")?, "expires_at")?,
        attempts_remaining: field(fields, "attempts_remaining")?
            .parse()
            .map_err(|_| corrupt("otp record has bad 'attempts_remaining'".to_string()))?,
        state: field(fields, "state")?.parse::<OtpState>().map_err(corrupt)?,
    })
}

fn decode_settlement(outcome: &str, remaining: i64) -> Result<OtpSettlement, InfrastructureError> {
    Ok(match outcome {
        "consumed" => OtpSettlement::Consumed,
        "mismatch" => OtpSettlement::Mismatch {
            attempts_remaining: remaining.max(0) as u32,
        },
        "exhausted" => OtpSettlement::Exhausted,
        "already_consumed" => OtpSettlement::AlreadyConsumed,
        "expired" => OtpSettlement::Expired,
        "superseded" => OtpSettlement::Superseded,
        "missing" => OtpSettlement::Missing,
        other => {
            return Err(InfrastructureError::Corrupt(format!(
                "unexpected settle outcome '{}'",
                other
            )))
        }
    })
}

#[async_trait]
impl OtpStore for RedisOtpStore {
    async fn put(&self, record: &OtpRecord) -> Result<(), DomainError> {
        let key = self.redis_key(&record.key);
        let fields = encode_record(record);
        let expires_at_ms = record.expires_at.timestamp_millis();

        self.redis_client
            .execute_with_retry(move |mut conn| {
                let key = key.clone();
                let fields = fields.clone();
                Box::pin(async move {
                    redis::pipe()
                        .atomic()
                        .del(&key)
                        .ignore()
                        .hset_multiple(&key, &fields)
                        .ignore()
                        .cmd("PEXPIREAT")
                        .arg(&key)
                        .arg(expires_at_ms)
                        .ignore()
                        .query_async::<_, ()>(&mut conn)
                        .await
                })
            })
            .await
            .map_err(InfrastructureError::Cache)?;

        debug!(
            event = "otp_stored",
            purpose = record.key.purpose.as_str(),
            scope = record.key.scope.as_str(),
            "Stored OTP record"
        );
        Ok(())
    }

    async fn get(&self, key: &OtpKey) -> Result<Option<OtpRecord>, DomainError> {
        let key = self.redis_key(key);
        let fields: HashMap<String, String> = self
            .redis_client
            .execute_with_retry(move |mut conn| {
                let key = key.clone();
                Box::pin(async move {
                    redis::cmd("HGETALL")
                        .arg(&key)
                        .query_async::<_, HashMap<String, String>>(&mut conn)
                        .await
                })
            })
            .await
            .map_err(InfrastructureError::Cache)?;

        if fields.is_empty() {
            return Ok(None);
        }
        Ok(Some(decode_record(&fields)?))
    }

    async fn settle(
        &self,
        key: &OtpKey,
        record_id: Uuid,
        matched: bool,
        now: DateTime<Utc>,
    ) -> Result<OtpSettlement, DomainError> {
        // Not retried: a lost reply after the script ran would count the
        // attempt twice.
        let mut conn = self.redis_client.connection();
        let (outcome, remaining): (String, i64) = self
            .settle_script
            .key(self.redis_key(key))
            .arg(record_id.to_string())
            .arg(if matched { "1" } else { "0" })
            .arg(now.timestamp_millis())
            .invoke_async(&mut conn)
            .await
            .map_err(InfrastructureError::Cache)?;

        Ok(decode_settlement(&outcome, remaining)?)
    }

    async fn clamp_expiry(
        &self,
        key: &OtpKey,
        record_id: Uuid,
        until: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let key = self.redis_key(key);
        let script = self.clamp_script.clone();
        let record_id = record_id.to_string();
        let until_ms = until.timestamp_millis();

        self.redis_client
            .execute_with_retry(move |mut conn| {
                let script = script.clone();
                let key = key.clone();
                let record_id = record_id.clone();
                Box::pin(async move {
                    script
                        .key(key)
                        .arg(record_id)
                        .arg(until_ms)
                        .invoke_async::<_, i64>(&mut conn)
                        .await
                })
            })
            .await
            .map_err(InfrastructureError::Cache)?;
        Ok(())
    }
}
