//! SMS gateway configuration

use serde::{Deserialize, Serialize};

/// SMS gateway selection and credentials
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SmsConfig {
    /// "mock" or "twilio"
    pub provider: String,

    #[serde(default)]
    pub twilio_account_sid: String,

    #[serde(default)]
    pub twilio_auth_token: String,

    /// Sender number in E.164 form
    #[serde(default)]
    pub from_number: String,

    /// Message body; `{code}` and `{minutes}` are substituted
    pub message_template: String,
}

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            provider: String::from("mock"),
            twilio_account_sid: String::new(),
            twilio_auth_token: String::new(),
            from_number: String::new(),
            message_template: String::from(
                "Your verification code is {code}. It expires in {minutes} minutes.",
            ),
        }
    }
}

impl SmsConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            provider: std::env::var("SMS_PROVIDER").unwrap_or(defaults.provider),
            twilio_account_sid: std::env::var("TWILIO_ACCOUNT_SID").unwrap_or_default(),
            twilio_auth_token: std::env::var("TWILIO_AUTH_TOKEN").unwrap_or_default(),
            from_number: std::env::var("TWILIO_FROM_NUMBER").unwrap_or_default(),
            message_template: std::env::var("SMS_MESSAGE_TEMPLATE")
                .unwrap_or(defaults.message_template),
        }
    }

    /// Render the verification message for a code
    pub fn render_message(&self, code: &str, ttl_seconds: i64) -> String {
        let minutes = ((ttl_seconds + 59) / 60).max(1);
        self.message_template
            .replace("{code}", code)
            .replace("{minutes}", &minutes.to_string())
    }
}
