//! Unit tests for SMS service creation

use crate::config::SmsConfig;
use crate::sms::create_sms_service;

#[test]
fn test_create_mock_service() {
    let config = SmsConfig::default();
    assert_eq!(create_sms_service(&config).provider_name(), "Mock");
}

#[test]
fn test_create_unknown_provider_fallback() {
    let config = SmsConfig {
        provider: "carrier-pigeon".to_string(),
        ..Default::default()
    };
    assert_eq!(create_sms_service(&config).provider_name(), "Mock");
}

#[cfg(feature = "twilio-sms")]
#[test]
fn test_twilio_without_credentials_falls_back() {
    let config = SmsConfig {
        provider: "twilio".to_string(),
        ..Default::default()
    };
    assert_eq!(create_sms_service(&config).provider_name(), "Mock");
}

#[cfg(feature = "twilio-sms")]
#[test]
fn test_create_twilio_service() {
    let config = SmsConfig {
        provider: "twilio".to_string(),
        twilio_account_sid: "ACtest".to_string(),
        twilio_auth_token: "token".to_string(),
        from_number: "+15551234567".to_string(),
        ..Default::default()
    };
    assert_eq!(create_sms_service(&config).provider_name(), "Twilio");
}
