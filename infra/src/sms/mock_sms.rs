//! Mock SMS Service Implementation
//!
//! Logs messages instead of sending them and keeps them in memory so tests
//! and local development can read the code back.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};
use uuid::Uuid;

use super::sms_service::{is_valid_phone_number, mask_phone_number, SmsService};
use crate::InfrastructureError;

/// One message accepted by the mock gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub message_id: String,
    pub phone_number: String,
    pub body: String,
}

/// Mock SMS service for development and testing
///
/// Clones share the outbox and the failure switch.
#[derive(Clone, Default)]
pub struct MockSmsService {
    outbox: Arc<Mutex<Vec<SentMessage>>>,
    simulate_failure: Arc<AtomicBool>,
}

impl MockSmsService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent sends fail (or succeed again)
    pub fn set_simulate_failure(&self, simulate: bool) {
        self.simulate_failure.store(simulate, Ordering::SeqCst);
    }

    pub fn get_message_count(&self) -> usize {
        self.outbox.lock().map(|outbox| outbox.len()).unwrap_or(0)
    }

    pub fn sent_messages(&self) -> Vec<SentMessage> {
        self.outbox
            .lock()
            .map(|outbox| outbox.clone())
            .unwrap_or_default()
    }

    /// Body of the most recent message sent to a number
    pub fn last_message_to(&self, phone_number: &str) -> Option<String> {
        self.outbox.lock().ok().and_then(|outbox| {
            outbox
                .iter()
                .rev()
                .find(|m| m.phone_number == phone_number)
                .map(|m| m.body.clone())
        })
    }

    pub fn clear(&self) {
        if let Ok(mut outbox) = self.outbox.lock() {
            outbox.clear();
        }
    }
}

#[async_trait]
impl SmsService for MockSmsService {
    async fn send_sms(&self, phone_number: &str, message: &str) -> Result<String, InfrastructureError> {
        if !is_valid_phone_number(phone_number) {
            return Err(InfrastructureError::Sms(format!(
                "Invalid phone number format: {}",
                mask_phone_number(phone_number)
            )));
        }

        if self.simulate_failure.load(Ordering::SeqCst) {
            warn!(
                phone = %mask_phone_number(phone_number),
                "Mock SMS service simulating failure"
            );
            return Err(InfrastructureError::Sms(
                "Simulated SMS sending failure".to_string(),
            ));
        }

        let message_id = format!("mock_{}", Uuid::new_v4());
        if let Ok(mut outbox) = self.outbox.lock() {
            outbox.push(SentMessage {
                message_id: message_id.clone(),
                phone_number: phone_number.to_string(),
                body: message.to_string(),
            });
        }

        info!(
            target: "sms_service",
            provider = "mock",
            phone = %mask_phone_number(phone_number),
            message_id = %message_id,
            message_length = message.len(),
            "SMS sent successfully (mock)"
        );

        Ok(message_id)
    }

    fn provider_name(&self) -> &str {
        "Mock"
    }

    async fn is_available(&self) -> bool {
        !self.simulate_failure.load(Ordering::SeqCst)
    }
}
