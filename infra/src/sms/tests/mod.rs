//! Unit tests for SMS module

mod create_service_tests;
#[cfg(feature = "twilio-sms")]
mod twilio_tests;
