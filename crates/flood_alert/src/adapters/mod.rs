// Rust guideline compliant 2026-10-12

//! Adapters (secondary ports) for the flood-alert binary.
//!
//! Each sub-module implements one hexagonal port trait defined in the
//! `domain` crate, except `sqlite_cooldowns`, which persists the rate
//! limiter's stamps between processes. The channel enums below pick the real dispatcher or its
//! logging stand-in at startup while keeping static dispatch.

pub mod clicksend_sms;
pub mod log_dispatch;
pub mod smtp_email;
pub mod sqlite_cooldowns;
pub mod sqlite_directory;
pub mod weather_api;

use clicksend_sms::ClickSendSms;
use domain::{DispatchError, EmailDispatcher, EmailMessage, SmsDispatcher, SmsReceipt};
use log_dispatch::{LogEmail, LogSms};
use smtp_email::SmtpEmail;

/// SMS channel selected from configuration.
#[derive(Debug)]
pub enum SmsChannel {
    ClickSend(ClickSendSms),
    Log(LogSms),
}

impl SmsDispatcher for SmsChannel {
    async fn send(&self, destination: &str, body: &str) -> Result<SmsReceipt, DispatchError> {
        match self {
            Self::ClickSend(inner) => inner.send(destination, body).await,
            Self::Log(inner) => inner.send(destination, body).await,
        }
    }
}

/// Email channel selected from configuration.
#[derive(Debug)]
pub enum EmailChannel {
    Smtp(Box<SmtpEmail>),
    Log(LogEmail),
}

impl EmailDispatcher for EmailChannel {
    async fn send(&self, message: &EmailMessage) -> Result<(), DispatchError> {
        match self {
            Self::Smtp(inner) => inner.send(message).await,
            Self::Log(inner) => inner.send(message).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{EmailChannel, SmsChannel};
    use crate::adapters::log_dispatch::{LogEmail, LogSms};
    use domain::{EmailDispatcher as _, EmailMessage, SmsDispatcher as _};

    #[tokio::test]
    async fn log_variants_delegate() {
        let sms = SmsChannel::Log(LogSms::new());
        assert!(sms.send("+5511987654321", "x").await.is_ok());

        let email = EmailChannel::Log(LogEmail::new());
        let message = EmailMessage {
            to: "a@b.com".to_owned(),
            subject: "s".to_owned(),
            html: "<p>x</p>".to_owned(),
            text: None,
        };
        assert!(email.send(&message).await.is_ok());
    }
}
