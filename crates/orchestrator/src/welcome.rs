// Rust guideline compliant 2026-10-12

//! Registration confirmation: one email, plus one SMS gated by the
//! `Cadastro` cooldown so repeated sign-up attempts cannot spam a phone.

use domain::{Channel, ChannelClass, EmailDispatcher, Recipient, SmsDispatcher, Throttle};

use crate::compose;
use crate::report::{Delivery, DeliveryStatus};

/// Sends the welcome messages for a newly registered recipient.
///
/// Best effort: failures are logged and reported, never returned as errors.
#[derive(Debug, Default)]
pub struct WelcomeNotifier;

impl WelcomeNotifier {
    /// Create a new welcome notifier.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Send the welcome SMS (when the phone is valid and the `Cadastro`
    /// window allows it) and the welcome email (when an address is present).
    pub async fn notify<T, S, E>(
        &self,
        recipient: &Recipient,
        throttle: &T,
        sms: &S,
        email: &E,
    ) -> Vec<Delivery>
    where
        T: Throttle,
        S: SmsDispatcher,
        E: EmailDispatcher,
    {
        let mut deliveries = vec![];

        if let Some(phone) = recipient.phone() {
            let status = if throttle.maybe_authorize(phone.digits(), ChannelClass::Cadastro) {
                let body = compose::welcome_sms(&recipient.display_name);
                match sms.send(&phone.destination(), &body).await {
                    Ok(_) => DeliveryStatus::Sent,
                    Err(e) => {
                        tracing::warn!(recipient_id = recipient.id, error = %e, "welcome.sms.failed");
                        DeliveryStatus::Failed(e)
                    }
                }
            } else {
                tracing::debug!(recipient_id = recipient.id, "welcome.sms.throttled");
                DeliveryStatus::Throttled
            };
            deliveries.push(Delivery {
                recipient_id: recipient.id,
                channel: Channel::Sms,
                warning_index: None,
                status,
            });
        }

        if let Some(address) = recipient.email() {
            let message = compose::welcome_email(&recipient.display_name, address);
            let status = match email.send(&message).await {
                Ok(()) => DeliveryStatus::Sent,
                Err(e) => {
                    tracing::warn!(recipient_id = recipient.id, error = %e, "welcome.email.failed");
                    DeliveryStatus::Failed(e)
                }
            };
            deliveries.push(Delivery {
                recipient_id: recipient.id,
                channel: Channel::Email,
                warning_index: None,
                status,
            });
        }

        tracing::info!(recipient_id = recipient.id, sends = deliveries.len(), "welcome.notified");
        deliveries
    }
}

#[cfg(test)]
mod tests {
    use super::WelcomeNotifier;
    use crate::DeliveryStatus;
    use domain::{
        Channel, Clock, DispatchError, EmailDispatcher, EmailMessage, Recipient, SmsDispatcher,
        SmsReceipt,
    };
    use rate_limiter::{InMemoryCooldownStore, RateLimiter};
    use std::cell::{Cell, RefCell};

    struct ManualClock {
        now: Cell<u64>,
    }

    impl Clock for &ManualClock {
        fn now_ms(&self) -> u64 {
            self.now.get()
        }
    }

    #[derive(Default)]
    struct RecordingSms {
        bodies: RefCell<Vec<String>>,
        fail: bool,
    }

    impl SmsDispatcher for RecordingSms {
        async fn send(&self, _destination: &str, body: &str) -> Result<SmsReceipt, DispatchError> {
            self.bodies.borrow_mut().push(body.to_owned());
            if self.fail {
                return Err(DispatchError::Unreachable { reason: "mock".to_owned() });
            }
            Ok(SmsReceipt { status: None })
        }
    }

    #[derive(Default)]
    struct RecordingEmail {
        subjects: RefCell<Vec<String>>,
    }

    impl EmailDispatcher for RecordingEmail {
        async fn send(&self, message: &EmailMessage) -> Result<(), DispatchError> {
            self.subjects.borrow_mut().push(message.subject.clone());
            Ok(())
        }
    }

    fn ana() -> Recipient {
        Recipient {
            id: 7,
            display_name: "Ana".to_owned(),
            phone_number: Some("11987654321".to_owned()),
            email_address: Some("ana@example.com".to_owned()),
        }
    }

    #[tokio::test]
    async fn sends_sms_and_email_once_per_hour() {
        let clock = ManualClock { now: Cell::new(0) };
        let limiter = RateLimiter::new(InMemoryCooldownStore::new(), &clock);
        let (sms, email) = (RecordingSms::default(), RecordingEmail::default());
        let notifier = WelcomeNotifier::new();

        let first = notifier.notify(&ana(), &limiter, &sms, &email).await;
        assert_eq!(first.len(), 2);
        assert!(first.iter().all(|d| d.status == DeliveryStatus::Sent));

        clock.now.set(30 * 60_000);
        let second = notifier.notify(&ana(), &limiter, &sms, &email).await;
        assert_eq!(second[0].channel, Channel::Sms);
        assert_eq!(second[0].status, DeliveryStatus::Throttled);
        assert_eq!(second[1].status, DeliveryStatus::Sent);

        clock.now.set(60 * 60_000);
        notifier.notify(&ana(), &limiter, &sms, &email).await;

        assert_eq!(sms.bodies.borrow().len(), 2);
        assert_eq!(email.subjects.borrow().len(), 3);
        assert!(sms.bodies.borrow()[0].starts_with("Olá, Ana!"));
    }

    #[tokio::test]
    async fn sms_failure_is_reported_and_email_still_sent() {
        let clock = ManualClock { now: Cell::new(0) };
        let limiter = RateLimiter::new(InMemoryCooldownStore::new(), &clock);
        let sms = RecordingSms { fail: true, ..RecordingSms::default() };
        let email = RecordingEmail::default();

        let deliveries = WelcomeNotifier::new().notify(&ana(), &limiter, &sms, &email).await;

        assert!(matches!(deliveries[0].status, DeliveryStatus::Failed(_)));
        assert_eq!(deliveries[1].status, DeliveryStatus::Sent);
    }

    #[tokio::test]
    async fn welcome_does_not_consume_alert_window() {
        let clock = ManualClock { now: Cell::new(0) };
        let limiter = RateLimiter::new(InMemoryCooldownStore::new(), &clock);
        let (sms, email) = (RecordingSms::default(), RecordingEmail::default());

        WelcomeNotifier::new().notify(&ana(), &limiter, &sms, &email).await;

        assert!(limiter.maybe_authorize("11987654321", domain::ChannelClass::Alerta));
    }
}
