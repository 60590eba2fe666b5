// Rust guideline compliant 2026-10-12

//! SMTP adapter for the `EmailDispatcher` port, via `lettre`.
//!
//! Submits over implicit TLS (port 465 by default) with login credentials.
//! Messages are `multipart/alternative` with a plain-text part derived from
//! the HTML when the caller supplies none.

use domain::{DispatchError, EmailDispatcher, EmailMessage};
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport as _, Message, Tokio1Executor};
use orchestrator::compose::html_to_text;

use crate::config::SmtpSettings;

/// Build the MIME message for `email` from `from`.
fn build_message(from: &Mailbox, email: &EmailMessage) -> Result<Message, DispatchError> {
    let to: Mailbox = email.to.parse().map_err(|e| DispatchError::InvalidMessage {
        reason: format!("recipient {:?}: {e}", email.to),
    })?;
    let text = email
        .text
        .clone()
        .unwrap_or_else(|| html_to_text(&email.html));
    Message::builder()
        .from(from.clone())
        .to(to)
        .subject(email.subject.as_str())
        .multipart(MultiPart::alternative_plain_html(text, email.html.clone()))
        .map_err(|e| DispatchError::InvalidMessage { reason: e.to_string() })
}

/// `EmailDispatcher` adapter submitting to an SMTP relay.
#[derive(Debug)]
pub struct SmtpEmail {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpEmail {
    /// Create a dispatcher for `settings`. No connection is opened yet.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::InvalidMessage` when the sender address does
    /// not parse, or `Unreachable` when the relay host is unusable for TLS.
    pub fn new(settings: &SmtpSettings) -> Result<Self, DispatchError> {
        let from: Mailbox = settings.from.parse().map_err(|e| DispatchError::InvalidMessage {
            reason: format!("sender {:?}: {e}", settings.from),
        })?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)
            .map_err(|e| DispatchError::Unreachable { reason: e.to_string() })?
            .port(settings.port)
            .credentials(Credentials::new(settings.username.clone(), settings.password.clone()))
            .build();
        Ok(Self { transport, from })
    }
}

impl EmailDispatcher for SmtpEmail {
    /// # Errors
    ///
    /// `InvalidMessage` for unparsable addresses, `Rejected` for permanent
    /// SMTP failures, `Unreachable` for everything else.
    async fn send(&self, message: &EmailMessage) -> Result<(), DispatchError> {
        let mime = build_message(&self.from, message)?;
        self.transport.send(mime).await.map_err(|e| {
            if e.is_permanent() {
                DispatchError::Rejected { reason: e.to_string() }
            } else {
                DispatchError::Unreachable { reason: e.to_string() }
            }
        })?;
        tracing::debug!(to = %message.to, "smtp.email.accepted");
        Ok(())
    }
}
