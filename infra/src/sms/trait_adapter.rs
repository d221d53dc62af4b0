//! SMS Service Trait Adapter
//!
//! Implements the core `SmsServiceTrait` on top of any gateway: renders the
//! verification message from the configured template and hands it to the
//! gateway.

use async_trait::async_trait;
use pa_core::services::otp::SmsServiceTrait;
use pa_shared::config::SmsConfig;
use tracing::warn;

use super::sms_service::{mask_phone_number, SmsService};

pub struct SmsServiceAdapter {
    inner: Box<dyn SmsService>,
    config: SmsConfig,
    /// Code lifetime quoted in the message
    code_ttl_seconds: i64,
}

impl SmsServiceAdapter {
    pub fn new(inner: Box<dyn SmsService>, config: SmsConfig, code_ttl_seconds: i64) -> Self {
        Self {
            inner,
            config,
            code_ttl_seconds,
        }
    }

    pub fn provider_name(&self) -> &str {
        self.inner.provider_name()
    }
}

#[async_trait]
impl SmsServiceTrait for SmsServiceAdapter {
    async fn send_verification_code(&self, phone: &str, code: &str) -> Result<String, String> {
        let message = self.config.render_message(code, self.code_ttl_seconds);
        self.inner.send_sms(phone, &message).await.map_err(|e| {
            warn!(
                provider = self.inner.provider_name(),
                phone = %mask_phone_number(phone),
                "Verification SMS not delivered"
            );
            e.to_string()
        })
    }

    fn is_valid_phone_number(&self, phone: &str) -> bool {
        self.inner.accepts(phone)
    }
}
