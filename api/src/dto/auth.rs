use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use pa_core::domain::entities::otp::OtpPurpose;
use pa_core::domain::value_objects::auth_outcome::{AuthOutcome, OtpDispatch};
use pa_core::domain::value_objects::role::Role;
use pa_core::services::authorization::RequestContext;
use pa_shared::phone::is_valid_e164;

use super::admin::{ProfileView, UserView};

/// Rejects anything that is not `+` followed by 8 to 15 digits
pub fn validate_e164(phone: &str) -> Result<(), ValidationError> {
    if is_valid_e164(phone) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_phone"))
    }
}

/// Body of `POST /auth/otp` and `POST /auth/otp/resend`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OtpRequestBody {
    /// Full E.164 number, e.g. "+14155550123"
    #[validate(custom = "validate_e164")]
    pub phone: String,

    /// Required for registration, optional for login
    #[serde(default)]
    pub role: Option<Role>,

    pub purpose: OtpPurpose,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpRequest {
    #[validate(custom = "validate_e164")]
    pub phone: String,

    #[serde(default)]
    pub role: Option<Role>,

    pub purpose: OtpPurpose,

    #[validate(length(min = 1, max = 16))]
    pub code: String,

    /// Display name stored on a profile created by this verification
    #[serde(default)]
    #[validate(length(min = 1, max = 100))]
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SelectRoleRequest {
    #[validate(length(min = 1))]
    pub selection_token: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    #[validate(length(min = 1))]
    pub refresh_token: String,

    /// Switch the active role while rotating
    #[serde(default)]
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutRequest {
    #[serde(default)]
    pub refresh_token: Option<String>,

    /// Revoke every session of the user
    #[serde(default)]
    pub all_devices: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpDispatchResponse {
    pub message: String,
    pub expires_at: DateTime<Utc>,
    /// Seconds until the code expires
    pub expires_in: i64,
    /// Seconds until a resend will be accepted
    pub resend_after: i64,
    pub attempts_allowed: u32,
}

impl OtpDispatchResponse {
    pub fn from_dispatch(dispatch: &OtpDispatch, now: DateTime<Utc>) -> Self {
        Self {
            message: "Verification code sent".to_string(),
            expires_at: dispatch.expires_at,
            expires_in: (dispatch.expires_at - now).num_seconds().max(0),
            resend_after: (dispatch.resend_available_at - now).num_seconds().max(0),
            attempts_allowed: dispatch.attempts_allowed,
        }
    }
}

/// Either a token pair or the list of roles to choose from
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AuthResponse {
    #[serde(rename_all = "camelCase")]
    Authenticated {
        user_id: Uuid,
        role: Role,
        access_token: String,
        refresh_token: String,
        token_type: String,
        expires_in: i64,
        refresh_expires_in: i64,
        profile_created: bool,
    },
    #[serde(rename_all = "camelCase")]
    RoleSelectionRequired {
        available_roles: Vec<Role>,
        selection_token: String,
        expires_in: i64,
    },
}

impl From<AuthOutcome> for AuthResponse {
    fn from(outcome: AuthOutcome) -> Self {
        match outcome {
            AuthOutcome::Authenticated {
                user_id,
                role,
                tokens,
                profile_created,
            } => AuthResponse::Authenticated {
                user_id,
                role,
                access_token: tokens.access_token,
                refresh_token: tokens.refresh_token,
                token_type: tokens.token_type,
                expires_in: tokens.expires_in,
                refresh_expires_in: tokens.refresh_expires_in,
                profile_created,
            },
            AuthOutcome::RoleSelectionRequired {
                available_roles,
                selection_token,
                expires_in,
            } => AuthResponse::RoleSelectionRequired {
                available_roles,
                selection_token,
                expires_in,
            },
        }
    }
}

/// Body of `GET /me`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub user: UserView,
    pub active_role: Role,
    pub profiles: Vec<ProfileView>,
}

impl From<&RequestContext> for MeResponse {
    fn from(context: &RequestContext) -> Self {
        Self {
            user: UserView::from(&context.user),
            active_role: context.active_role(),
            profiles: context.profiles.iter().map(ProfileView::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pa_core::domain::entities::token::TokenPair;

    #[test]
    fn test_otp_request_wire_format() {
        let body: OtpRequestBody = serde_json::from_value(serde_json::json!({
            "phone": "+14155550123",
            "role": "society_owner",
            "purpose": "registration"
        }))
        .unwrap();
        assert_eq!(body.role, Some(Role::SocietyOwner));
        assert_eq!(body.purpose, OtpPurpose::Registration);
        assert!(body.validate().is_ok());

        let body: OtpRequestBody = serde_json::from_value(serde_json::json!({
            "phone": "4155550123",
            "purpose": "login"
        }))
        .unwrap();
        assert!(body.role.is_none());
        assert!(body.validate().is_err());
    }

    #[test]
    fn test_unknown_role_rejected() {
        let parsed = serde_json::from_value::<OtpRequestBody>(serde_json::json!({
            "phone": "+14155550123",
            "role": "landlord",
            "purpose": "login"
        }));
        assert!(parsed.is_err());
    }

    #[test]
    fn test_auth_response_shapes() {
        let tokens = TokenPair::new("a".into(), "r".into(), 900, 3600);
        let response = AuthResponse::from(AuthOutcome::Authenticated {
            user_id: Uuid::new_v4(),
            role: Role::Broker,
            tokens,
            profile_created: true,
        });
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "authenticated");
        assert_eq!(json["accessToken"], "a");
        assert_eq!(json["refreshToken"], "r");
        assert_eq!(json["role"], "broker");

        let response = AuthResponse::from(AuthOutcome::RoleSelectionRequired {
            available_roles: vec![Role::Broker, Role::Developer],
            selection_token: "s".into(),
            expires_in: 300,
        });
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "role_selection_required");
        assert_eq!(json["availableRoles"], serde_json::json!(["broker", "developer"]));
    }

    #[test]
    fn test_logout_defaults() {
        let body: LogoutRequest = serde_json::from_str("{}").unwrap();
        assert!(!body.all_devices);
        assert!(body.refresh_token.is_none());
    }
}
