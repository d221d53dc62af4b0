//! SMS Service Module
//!
//! SMS gateways for delivering verification codes:
//!
//! - **SMS Service Trait**: common interface for all gateways
//! - **Mock Implementation**: logs and records messages for development
//! - **Twilio Support**: production delivery via the Twilio REST API
//! - **Adapter**: bridges a gateway to the core `SmsServiceTrait`

pub mod mock_sms;
pub mod sms_service;
pub mod trait_adapter;

#[cfg(feature = "twilio-sms")]
pub mod twilio;

pub use mock_sms::{MockSmsService, SentMessage};
pub use sms_service::{is_valid_phone_number, mask_phone_number, SmsService};
pub use trait_adapter::SmsServiceAdapter;

#[cfg(feature = "twilio-sms")]
pub use twilio::{TwilioConfig, TwilioSmsService};

use pa_shared::config::SmsConfig;

#[cfg(test)]
mod tests;

/// Create the SMS gateway named by `config.provider`
///
/// Unknown providers, and a Twilio gateway that cannot be configured, fall
/// back to the mock gateway with a warning.
pub fn create_sms_service(config: &SmsConfig) -> Box<dyn SmsService> {
    match config.provider.as_str() {
        "mock" => Box::new(MockSmsService::new()),
        #[cfg(feature = "twilio-sms")]
        "twilio" => match TwilioConfig::from_sms_config(config).and_then(TwilioSmsService::new) {
            Ok(service) => Box::new(service),
            Err(e) => {
                tracing::error!("Failed to initialize Twilio SMS service: {}", e);
                tracing::warn!("Falling back to mock SMS service");
                Box::new(MockSmsService::new())
            }
        },
        other => {
            tracing::warn!("Unknown SMS provider '{}', using mock implementation", other);
            Box::new(MockSmsService::new())
        }
    }
}
