//! Unit tests for Twilio SMS service

use reqwest::StatusCode;

use crate::config::SmsConfig;
use crate::sms::twilio::{is_retryable_status, TwilioConfig, TwilioSmsService};
use crate::sms::SmsService;

fn sms_config() -> SmsConfig {
    SmsConfig {
        provider: "twilio".to_string(),
        twilio_account_sid: "ACtest_account_sid".to_string(),
        twilio_auth_token: "test_auth_token".to_string(),
        from_number: "+15551234567".to_string(),
        ..Default::default()
    }
}

#[test]
fn test_config_from_sms_config() {
    let config = TwilioConfig::from_sms_config(&sms_config()).unwrap();

    assert_eq!(config.account_sid, "ACtest_account_sid");
    assert_eq!(config.from_number, "+15551234567");
    assert!(config.max_retries >= 1);
    assert_eq!(
        config.messages_url(),
        "https://api.twilio.com/2010-04-01/Accounts/ACtest_account_sid/Messages.json"
    );
}

#[test]
fn test_config_requires_e164_sender() {
    let config = SmsConfig {
        from_number: "15551234567".to_string(),
        ..sms_config()
    };
    let err = TwilioConfig::from_sms_config(&config).unwrap_err();
    assert!(err.to_string().contains("E.164 format"));
}

#[test]
fn test_config_requires_credentials() {
    let config = SmsConfig {
        twilio_auth_token: String::new(),
        ..sms_config()
    };
    assert!(TwilioConfig::from_sms_config(&config).is_err());
}

#[test]
fn test_phone_normalization() {
    assert_eq!(
        TwilioSmsService::normalize_phone_number("+14155552671").unwrap(),
        "+14155552671"
    );
    assert!(TwilioSmsService::normalize_phone_number("4155552671").is_err());
    assert!(TwilioSmsService::normalize_phone_number("+abc").is_err());
}

#[test]
fn test_retryable_statuses() {
    assert!(is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
    assert!(is_retryable_status(StatusCode::SERVICE_UNAVAILABLE));
    assert!(is_retryable_status(StatusCode::BAD_GATEWAY));
    assert!(!is_retryable_status(StatusCode::BAD_REQUEST));
    assert!(!is_retryable_status(StatusCode::UNAUTHORIZED));
}

#[tokio::test]
async fn test_rejects_oversized_body_without_network() {
    let service = TwilioSmsService::new(TwilioConfig::from_sms_config(&sms_config()).unwrap()).unwrap();
    let body = "x".repeat(1601);

    let result = service.send_sms("+14155552671", &body).await;
    assert!(result.unwrap_err().to_string().contains("maximum length"));
    assert_eq!(service.provider_name(), "Twilio");
}
