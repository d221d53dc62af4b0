//! In-process OTP store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::entities::otp::{OtpKey, OtpRecord, OtpState};
use crate::errors::DomainError;

use super::traits::{OtpSettlement, OtpStore};

/// Records keyed by storage key behind a single mutex, which makes `settle`
/// trivially atomic within one process.
#[derive(Clone, Default)]
pub struct InMemoryOtpStore {
    records: Arc<Mutex<HashMap<String, OtpRecord>>>,
}

impl InMemoryOtpStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove records past their expiry; returns how many were removed
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let mut records = self.records.lock().await;
        let before = records.len();
        records.retain(|_, record| !record.is_expired_at(now));
        before - records.len()
    }
}

#[async_trait]
impl OtpStore for InMemoryOtpStore {
    async fn put(&self, record: &OtpRecord) -> Result<(), DomainError> {
        let mut records = self.records.lock().await;
        records.insert(record.key.storage_key(), record.clone());
        Ok(())
    }

    async fn get(&self, key: &OtpKey) -> Result<Option<OtpRecord>, DomainError> {
        let records = self.records.lock().await;
        Ok(records.get(&key.storage_key()).cloned())
    }

    async fn settle(
        &self,
        key: &OtpKey,
        record_id: Uuid,
        matched: bool,
        now: DateTime<Utc>,
    ) -> Result<OtpSettlement, DomainError> {
        let mut records = self.records.lock().await;
        let Some(record) = records.get_mut(&key.storage_key()) else {
            return Ok(OtpSettlement::Missing);
        };

        if record.id != record_id {
            return Ok(OtpSettlement::Superseded);
        }

        match record.state {
            OtpState::Consumed => return Ok(OtpSettlement::AlreadyConsumed),
            OtpState::Exhausted => return Ok(OtpSettlement::Exhausted),
            OtpState::Issued => {}
        }

        if record.is_expired_at(now) {
            return Ok(OtpSettlement::Expired);
        }

        if matched {
            record.state = OtpState::Consumed;
            return Ok(OtpSettlement::Consumed);
        }

        record.attempts_remaining = record.attempts_remaining.saturating_sub(1);
        if record.attempts_remaining == 0 {
            record.state = OtpState::Exhausted;
        }
        Ok(OtpSettlement::Mismatch {
            attempts_remaining: record.attempts_remaining,
        })
    }

    async fn clamp_expiry(
        &self,
        key: &OtpKey,
        record_id: Uuid,
        until: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let mut records = self.records.lock().await;
        if let Some(record) = records.get_mut(&key.storage_key()) {
            if record.id == record_id && until < record.expires_at {
                record.expires_at = until;
            }
        }
        Ok(())
    }
}
