//! One-time code records and the key they are scoped to.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::value_objects::role::Role;

/// Why a code was issued
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpPurpose {
    Registration,
    Login,
}

impl OtpPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            OtpPurpose::Registration => "registration",
            OtpPurpose::Login => "login",
        }
    }
}

impl fmt::Display for OtpPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OtpPurpose {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "registration" => Ok(OtpPurpose::Registration),
            "login" => Ok(OtpPurpose::Login),
            _ => Err(format!("Unknown OTP purpose: {}", s)),
        }
    }
}

/// The role a code is bound to.
///
/// Login codes may be requested without a role; such a code can only be
/// redeemed through the role-agnostic path and never for a specific role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleScope {
    Any,
    Role(Role),
}

impl RoleScope {
    pub fn role(&self) -> Option<Role> {
        match self {
            RoleScope::Any => None,
            RoleScope::Role(role) => Some(*role),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RoleScope::Any => "any",
            RoleScope::Role(role) => role.as_str(),
        }
    }
}

impl From<Option<Role>> for RoleScope {
    fn from(role: Option<Role>) -> Self {
        role.map(RoleScope::Role).unwrap_or(RoleScope::Any)
    }
}

impl FromStr for RoleScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "any" {
            Ok(RoleScope::Any)
        } else {
            s.parse().map(RoleScope::Role)
        }
    }
}

/// `(phone, role scope, purpose)`: at most one live record exists per key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OtpKey {
    pub phone: String,
    pub scope: RoleScope,
    pub purpose: OtpPurpose,
}

impl OtpKey {
    pub fn new(phone: impl Into<String>, role: Option<Role>, purpose: OtpPurpose) -> Self {
        Self {
            phone: phone.into(),
            scope: role.into(),
            purpose,
        }
    }

    /// Stable storage key that does not expose the raw phone number
    pub fn storage_key(&self) -> String {
        format!(
            "otp:{}:{}:{}",
            self.purpose.as_str(),
            self.scope.as_str(),
            hash_phone(&self.phone)
        )
    }
}

/// SHA-256 of a phone number, hex encoded
pub fn hash_phone(phone: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(phone.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Stored state of a record. Expiry is derived from `expires_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpState {
    Issued,
    Consumed,
    Exhausted,
}

impl OtpState {
    pub fn as_str(&self) -> &'static str {
        match self {
            OtpState::Issued => "issued",
            OtpState::Consumed => "consumed",
            OtpState::Exhausted => "exhausted",
        }
    }
}

impl FromStr for OtpState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "issued" => Ok(OtpState::Issued),
            "consumed" => Ok(OtpState::Consumed),
            "exhausted" => Ok(OtpState::Exhausted),
            _ => Err(format!("Unknown OTP state: {}", s)),
        }
    }
}

/// One outstanding code. Only the salted hash of the code is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpRecord {
    /// Distinguishes this issuance from any later one under the same key
    pub id: Uuid,
    pub key: OtpKey,
    pub code_hash: String,
    pub salt: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub attempts_remaining: u32,
    pub state: OtpState,
}

impl OtpRecord {
    pub fn new(
        key: OtpKey,
        code_hash: String,
        salt: String,
        ttl_seconds: i64,
        max_attempts: u32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            key,
            code_hash,
            salt,
            issued_at: now,
            expires_at: now + Duration::seconds(ttl_seconds),
            attempts_remaining: max_attempts,
            state: OtpState::Issued,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Unconsumed, not exhausted and unexpired
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.state == OtpState::Issued && !self.is_expired_at(now)
    }

    pub fn consumed(&self) -> bool {
        self.state == OtpState::Consumed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_key_hides_phone() {
        let key = OtpKey::new("+14155550123", Some(Role::Broker), OtpPurpose::Registration);
        let storage_key = key.storage_key();

        assert!(storage_key.starts_with("otp:registration:broker:"));
        assert!(!storage_key.contains("4155550123"));
    }

    #[test]
    fn test_role_scope_keys_are_distinct() {
        let bound = OtpKey::new("+14155550123", Some(Role::Broker), OtpPurpose::Login);
        let any = OtpKey::new("+14155550123", None, OtpPurpose::Login);
        assert_ne!(bound.storage_key(), any.storage_key());
    }

    #[test]
    fn test_record_liveness() {
        let key = OtpKey::new("+14155550123", None, OtpPurpose::Login);
        let mut record = OtpRecord::new(key, "hash".into(), "salt".into(), 300, 5);
        let now = Utc::now();

        assert!(record.is_live_at(now));
        assert!(!record.is_live_at(now + Duration::seconds(301)));

        record.state = OtpState::Consumed;
        assert!(!record.is_live_at(now));
        assert!(record.consumed());
    }

    #[test]
    fn test_role_scope_parsing() {
        assert_eq!("any".parse::<RoleScope>(), Ok(RoleScope::Any));
        assert_eq!("broker".parse::<RoleScope>(), Ok(RoleScope::Role(Role::Broker)));
        assert!("nobody".parse::<RoleScope>().is_err());
    }
}
