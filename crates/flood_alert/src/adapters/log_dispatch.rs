// Rust guideline compliant 2026-10-12

//! Dry-run adapters for the dispatcher ports.
//!
//! Wired in place of a real channel when its credentials are absent. Every
//! message is logged at `info` level and reported as delivered.

use domain::{DispatchError, EmailDispatcher, EmailMessage, SmsDispatcher, SmsReceipt};

/// `SmsDispatcher` adapter that only logs.
#[derive(Debug)]
pub struct LogSms;

impl LogSms {
    /// Create a new log SMS adapter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogSms {
    fn default() -> Self {
        Self::new()
    }
}

impl SmsDispatcher for LogSms {
    async fn send(&self, destination: &str, body: &str) -> Result<SmsReceipt, DispatchError> {
        tracing::info!(destination, body, "log_dispatch.sms");
        Ok(SmsReceipt { status: Some("LOGGED".to_owned()) })
    }
}

/// `EmailDispatcher` adapter that only logs.
#[derive(Debug)]
pub struct LogEmail;

impl LogEmail {
    /// Create a new log email adapter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogEmail {
    fn default() -> Self {
        Self::new()
    }
}

impl EmailDispatcher for LogEmail {
    async fn send(&self, message: &EmailMessage) -> Result<(), DispatchError> {
        tracing::info!(to = %message.to, subject = %message.subject, "log_dispatch.email");
        Ok(())
    }
}
