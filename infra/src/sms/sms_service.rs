//! SMS Service Interface
//!
//! Gateways only know how to deliver a text to a phone number. Turning a
//! verification code into a message is the adapter's job.

use async_trait::async_trait;

use crate::InfrastructureError;

pub use pa_shared::utils::phone::mask_phone_number;

/// SMS service trait for sending text messages
#[async_trait]
pub trait SmsService: Send + Sync {
    /// Send an SMS message to an E.164 phone number, returning the gateway message id
    async fn send_sms(&self, phone_number: &str, message: &str) -> Result<String, InfrastructureError>;

    /// Provider name for logs and health output ("Twilio", "Mock")
    fn provider_name(&self) -> &str;

    /// Whether this gateway can deliver to the number
    fn accepts(&self, phone_number: &str) -> bool {
        is_valid_phone_number(phone_number)
    }

    async fn is_available(&self) -> bool {
        true
    }
}

/// E.164 shape check shared by all gateways
pub fn is_valid_phone_number(phone: &str) -> bool {
    pa_shared::utils::phone::is_valid_e164(phone)
}
