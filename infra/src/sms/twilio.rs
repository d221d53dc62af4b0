//! Twilio SMS Service Implementation
//!
//! Calls the Twilio Messages REST API directly over `reqwest`:
//!
//! - E.164 normalization with the `phonenumber` crate
//! - Retry with exponential backoff on 429 and 5xx responses and on
//!   transport errors; other 4xx responses fail immediately
//! - Phone number masking in logs

use async_trait::async_trait;
use phonenumber::{Mode, PhoneNumber};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use pa_shared::config::SmsConfig;

use crate::sms::sms_service::{mask_phone_number, SmsService};
use crate::InfrastructureError;

const TWILIO_API_BASE: &str = "https://api.twilio.com/2010-04-01";

/// Twilio's hard limit on a message body
const MAX_BODY_LENGTH: usize = 1600;

/// Twilio SMS service configuration
#[derive(Debug, Clone)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    /// Sender number (must be a Twilio number)
    pub from_number: String,
    pub max_retries: u32,
    /// Initial retry delay in milliseconds
    pub retry_delay_ms: u64,
    pub request_timeout_secs: u64,
    /// REST endpoint root; overridable for tests
    pub api_base: String,
}

impl TwilioConfig {
    /// Build from the shared SMS configuration
    pub fn from_sms_config(config: &SmsConfig) -> Result<Self, InfrastructureError> {
        if config.twilio_account_sid.is_empty() || config.twilio_auth_token.is_empty() {
            return Err(InfrastructureError::Config(
                "TWILIO_ACCOUNT_SID and TWILIO_AUTH_TOKEN must be set".to_string(),
            ));
        }
        if !config.from_number.starts_with('+') {
            return Err(InfrastructureError::Config(
                "TWILIO_FROM_NUMBER must be in E.164 format (starting with '+')".to_string(),
            ));
        }

        Ok(Self {
            account_sid: config.twilio_account_sid.clone(),
            auth_token: config.twilio_auth_token.clone(),
            from_number: config.from_number.clone(),
            max_retries: env_or("TWILIO_MAX_RETRIES", 3).max(1),
            retry_delay_ms: env_or("TWILIO_RETRY_DELAY_MS", 1000),
            request_timeout_secs: env_or("TWILIO_REQUEST_TIMEOUT_SECS", 30),
            api_base: TWILIO_API_BASE.to_string(),
        })
    }

    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self, InfrastructureError> {
        Self::from_sms_config(&SmsConfig::from_env())
    }

    pub(crate) fn messages_url(&self) -> String {
        format!(
            "{}/Accounts/{}/Messages.json",
            self.api_base.trim_end_matches('/'),
            self.account_sid
        )
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[derive(Debug, Deserialize)]
struct MessageResource {
    sid: String,
}

#[derive(Debug, Default, Deserialize)]
struct TwilioErrorBody {
    code: Option<i64>,
    message: Option<String>,
}

/// Whether a Twilio response status is worth retrying
pub(crate) fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Twilio SMS service implementation
pub struct TwilioSmsService {
    client: reqwest::Client,
    config: TwilioConfig,
}

impl TwilioSmsService {
    pub fn new(config: TwilioConfig) -> Result<Self, InfrastructureError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        info!(
            from = %mask_phone_number(&config.from_number),
            "Twilio SMS service initialized"
        );

        Ok(Self { client, config })
    }

    pub fn from_env() -> Result<Self, InfrastructureError> {
        Self::new(TwilioConfig::from_env()?)
    }

    /// Parse a number and format it as E.164
    pub(crate) fn normalize_phone_number(phone: &str) -> Result<String, InfrastructureError> {
        if !phone.starts_with('+') {
            return Err(InfrastructureError::Sms(
                "Phone number must be in E.164 format (e.g., +14155550123)".to_string(),
            ));
        }

        phone
            .parse::<PhoneNumber>()
            .map(|parsed| parsed.format().mode(Mode::E164).to_string())
            .map_err(|e| InfrastructureError::Sms(format!("Invalid phone number format: {}", e)))
    }

    async fn send_once(&self, to: &str, message: &str) -> Result<String, (bool, InfrastructureError)> {
        let params = [
            ("To", to),
            ("From", self.config.from_number.as_str()),
            ("Body", message),
        ];

        let response = self
            .client
            .post(self.config.messages_url())
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&params)
            .send()
            .await
            .map_err(|e| (true, InfrastructureError::Http(e)))?;

        let status = response.status();
        if status.is_success() {
            let resource: MessageResource = response
                .json()
                .await
                .map_err(|e| (false, InfrastructureError::Http(e)))?;
            return Ok(resource.sid);
        }

        let body: TwilioErrorBody = response.json().await.unwrap_or_default();
        let err = InfrastructureError::Sms(format!(
            "Twilio responded {} (code {}): {}",
            status.as_u16(),
            body.code.map(|c| c.to_string()).unwrap_or_else(|| "-".to_string()),
            body.message.unwrap_or_else(|| "no message".to_string())
        ));
        Err((is_retryable_status(status), err))
    }

    async fn send_with_retry(&self, to: &str, message: &str) -> Result<String, InfrastructureError> {
        let mut attempts = 0;
        let mut delay = Duration::from_millis(self.config.retry_delay_ms);

        loop {
            attempts += 1;
            debug!(
                "Sending SMS attempt {}/{} to {}",
                attempts,
                self.config.max_retries,
                mask_phone_number(to)
            );

            match self.send_once(to, message).await {
                Ok(sid) => {
                    info!(
                        event = "sms_sent",
                        provider = "twilio",
                        phone = %mask_phone_number(to),
                        sid = %sid,
                        "SMS sent"
                    );
                    return Ok(sid);
                }
                Err((retryable, e)) if retryable && attempts < self.config.max_retries => {
                    warn!(
                        "Failed to send SMS (attempt {}/{}): {}. Retrying in {:?}",
                        attempts, self.config.max_retries, e, delay
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
                Err((_, e)) => {
                    error!(
                        event = "sms_failed",
                        provider = "twilio",
                        phone = %mask_phone_number(to),
                        attempts,
                        "Failed to send SMS: {}",
                        e
                    );
                    return Err(e);
                }
            }
        }
    }
}

#[async_trait]
impl SmsService for TwilioSmsService {
    async fn send_sms(&self, phone_number: &str, message: &str) -> Result<String, InfrastructureError> {
        let normalized = Self::normalize_phone_number(phone_number)?;

        if message.len() > MAX_BODY_LENGTH {
            return Err(InfrastructureError::Sms(format!(
                "Message exceeds maximum length of {} characters",
                MAX_BODY_LENGTH
            )));
        }

        self.send_with_retry(&normalized, message).await
    }

    fn provider_name(&self) -> &str {
        "Twilio"
    }

    fn accepts(&self, phone_number: &str) -> bool {
        crate::sms::sms_service::is_valid_phone_number(phone_number)
            && Self::normalize_phone_number(phone_number).is_ok()
    }
}
