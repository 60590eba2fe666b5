// Rust guideline compliant 2026-10-12

//! One-shot directory commands: `register` and `unregister`.
//!
//! Each invocation is its own process, so the `Cadastro` cooldown is loaded
//! from and written back to SQLite around the welcome send.

use anyhow::Context as _;
use domain::{EmailDispatcher, SmsDispatcher};
use orchestrator::{Delivery, DeliveryStatus, WelcomeNotifier};
use rate_limiter::{RateLimiter, SystemClock};

use crate::adapters::sqlite_cooldowns::SqliteCooldowns;
use crate::adapters::sqlite_directory::SqliteDirectory;

/// Store a recipient, then send the welcome messages.
///
/// # Errors
///
/// Returns an error when the recipient is rejected (invalid or duplicate
/// contact) or a database call fails. Send failures are only logged.
pub async fn register<S: SmsDispatcher, E: EmailDispatcher>(
    directory: &SqliteDirectory,
    cooldowns: &SqliteCooldowns,
    sms: &S,
    email: &E,
    name: &str,
    phone: Option<&str>,
    email_address: Option<&str>,
) -> anyhow::Result<Vec<Delivery>> {
    let recipient = directory
        .register(name, phone, email_address)
        .await
        .context("failed to register recipient")?;

    let throttle = RateLimiter::new(
        cooldowns.load().await.context("failed to load cooldowns")?,
        SystemClock,
    );
    throttle.sweep();
    let deliveries = WelcomeNotifier::new().notify(&recipient, &throttle, sms, email).await;
    cooldowns
        .save(throttle.store())
        .await
        .context("failed to persist cooldowns")?;

    tracing::info!(
        recipient_id = recipient.id,
        sent = deliveries.iter().filter(|d| d.status == DeliveryStatus::Sent).count(),
        "register.done"
    );
    Ok(deliveries)
}

/// Remove the recipient holding `contact` (phone number or email address).
///
/// # Errors
///
/// Returns an error when nobody holds the contact or the database fails.
pub async fn unregister(directory: &SqliteDirectory, contact: &str) -> anyhow::Result<()> {
    directory
        .unregister(contact)
        .await
        .context("failed to unregister recipient")
}
