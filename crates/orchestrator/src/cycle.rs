// Rust guideline compliant 2026-10-12

//! Alert fan-out orchestrator.
//!
//! One cycle: poll the warning source, short-circuit on no warnings, snapshot
//! the contact directory, then dispatch every warning to every recipient over
//! SMS (gated by the `Alerta` cooldown) and email (not gated). Send failures
//! are recorded and logged; they never stop the batch or escape the cycle.

use std::cell::{Cell, RefCell};

use domain::{
    Channel, ChannelClass, ContactDirectory, EmailDispatcher, Recipient, SmsDispatcher,
    SourceError, Throttle, WarningRecord, WarningSource,
};
use tokio::time::MissedTickBehavior;
use tracing::Instrument as _;
use uuid::Uuid;

use crate::compose;
use crate::report::{CycleOutcome, CycleReport, Delivery, DeliveryStatus};
use crate::AlertConfig;

// ---------------------------------------------------------------------------
// In-flight guard
// ---------------------------------------------------------------------------

/// Holds the orchestrator's in-flight flag for the duration of one cycle.
///
/// Released on drop, including when the cycle future is cancelled.
struct InFlight<'a>(&'a Cell<bool>);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a Cell<bool>) -> Option<Self> {
        if flag.replace(true) {
            None
        } else {
            Some(Self(flag))
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

// ---------------------------------------------------------------------------
// AlertOrchestrator
// ---------------------------------------------------------------------------

/// Periodic fan-out of official warnings to the contact directory.
///
/// Generic over the ports per call; holds only its configuration, the
/// in-flight flag and the last report.
#[derive(Debug)]
pub struct AlertOrchestrator {
    config: AlertConfig,
    /// Interior mutability required because all public methods take `&self`.
    in_flight: Cell<bool>,
    last_report: RefCell<Option<CycleReport>>,
}

impl AlertOrchestrator {
    /// Create a new orchestrator from `config`.
    #[must_use]
    pub fn new(config: AlertConfig) -> Self {
        Self {
            config,
            in_flight: Cell::new(false),
            last_report: RefCell::new(None),
        }
    }

    /// Report of the most recent cycle started by [`run`](Self::run).
    #[must_use]
    pub fn last_report(&self) -> Option<CycleReport> {
        self.last_report.borrow().clone()
    }

    /// Run one alert cycle and return what it did.
    ///
    /// Never fails: a missing credential yields [`CycleOutcome::Skipped`],
    /// upstream failures yield [`CycleOutcome::Aborted`], and a call made
    /// while another cycle is in flight yields [`CycleOutcome::Overlapping`].
    pub async fn run_cycle<W, D, T, S, E>(
        &self,
        source: &W,
        directory: &D,
        throttle: &T,
        sms: &S,
        email: &E,
    ) -> CycleReport
    where
        W: WarningSource,
        D: ContactDirectory,
        T: Throttle,
        S: SmsDispatcher,
        E: EmailDispatcher,
    {
        let cycle_id = Uuid::new_v4();
        let Some(_guard) = InFlight::acquire(&self.in_flight) else {
            tracing::warn!(%cycle_id, "alerts.cycle.overlapping: previous cycle still running");
            return CycleReport::empty(cycle_id, CycleOutcome::Overlapping);
        };

        self.fan_out(cycle_id, source, directory, throttle, sms, email)
            .instrument(tracing::info_span!("cycle", %cycle_id))
            .await
    }

    /// Run the alert schedule until the iteration bound is reached.
    ///
    /// The first cycle starts immediately; later ticks missed because a cycle
    /// overran the period are skipped rather than bunched up.
    pub async fn run<W, D, T, S, E>(
        &self,
        source: &W,
        directory: &D,
        throttle: &T,
        sms: &S,
        email: &E,
    ) where
        W: WarningSource,
        D: ContactDirectory,
        T: Throttle,
        S: SmsDispatcher,
        E: EmailDispatcher,
    {
        let mut ticker = tokio::time::interval(self.config.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut count = 0u64;
        loop {
            ticker.tick().await;
            let report = self.run_cycle(source, directory, throttle, sms, email).await;
            *self.last_report.borrow_mut() = Some(report);

            count += 1;
            if let Some(max) = self.config.iterations
                && count >= max
            {
                tracing::info!("alerts.run.stopped: iteration limit reached after {count} cycle(s)");
                return;
            }
        }
    }

    async fn fan_out<W, D, T, S, E>(
        &self,
        cycle_id: Uuid,
        source: &W,
        directory: &D,
        throttle: &T,
        sms: &S,
        email: &E,
    ) -> CycleReport
    where
        W: WarningSource,
        D: ContactDirectory,
        T: Throttle,
        S: SmsDispatcher,
        E: EmailDispatcher,
    {
        throttle.sweep();

        let warnings = match source.active_warnings().await {
            Ok(warnings) => warnings,
            Err(SourceError::MissingCredential) => {
                tracing::info!("alerts.cycle.skipped: weather credential not configured");
                return CycleReport::empty(cycle_id, CycleOutcome::Skipped);
            }
            Err(e) => {
                tracing::error!(error = %e, "alerts.cycle.aborted: warning source failed");
                return CycleReport::empty(cycle_id, CycleOutcome::Aborted { reason: e.to_string() });
            }
        };

        if warnings.is_empty() {
            tracing::debug!("alerts.cycle.idle: no active warnings");
            return CycleReport::empty(cycle_id, CycleOutcome::NoWarnings);
        }

        let recipients = match directory.recipients().await {
            Ok(recipients) => recipients,
            Err(e) => {
                tracing::error!(error = %e, "alerts.cycle.aborted: contact directory failed");
                return CycleReport::empty(cycle_id, CycleOutcome::Aborted { reason: e.to_string() });
            }
        };

        tracing::info!(
            warnings = warnings.len(),
            recipients = recipients.len(),
            "alerts.cycle.started"
        );

        let mut deliveries = vec![];
        for recipient in &recipients {
            Self::sms_path(recipient, &warnings, throttle, sms, &mut deliveries).await;
            self.email_path(recipient, &warnings, email, &mut deliveries).await;
        }

        let report = CycleReport {
            cycle_id,
            outcome: CycleOutcome::Completed {
                warnings: warnings.len(),
                recipients: recipients.len(),
            },
            deliveries,
        };
        tracing::info!(
            sms_sent = report.sent(Channel::Sms),
            sms_failed = report.failed(Channel::Sms),
            sms_throttled = report.throttled(Channel::Sms),
            email_sent = report.sent(Channel::Email),
            email_failed = report.failed(Channel::Email),
            "alerts.cycle.completed"
        );
        report
    }

    /// One `Alerta` authorization covers every warning of this cycle.
    async fn sms_path<T: Throttle, S: SmsDispatcher>(
        recipient: &Recipient,
        warnings: &[WarningRecord],
        throttle: &T,
        sms: &S,
        deliveries: &mut Vec<Delivery>,
    ) {
        let Some(phone) = recipient.phone() else {
            return;
        };

        if !throttle.maybe_authorize(phone.digits(), ChannelClass::Alerta) {
            tracing::debug!(recipient_id = recipient.id, "alerts.sms.throttled");
            deliveries.extend((0..warnings.len()).map(|i| Delivery {
                recipient_id: recipient.id,
                channel: Channel::Sms,
                warning_index: Some(i),
                status: DeliveryStatus::Throttled,
            }));
            return;
        }

        let destination = phone.destination();
        for (i, warning) in warnings.iter().enumerate() {
            let status = match sms.send(&destination, &compose::alert_sms(warning)).await {
                Ok(receipt) => {
                    tracing::info!(
                        recipient_id = recipient.id,
                        status = receipt.status.as_deref().unwrap_or("unknown"),
                        "alerts.sms.sent"
                    );
                    DeliveryStatus::Sent
                }
                Err(e) => {
                    tracing::warn!(recipient_id = recipient.id, error = %e, "alerts.sms.failed");
                    DeliveryStatus::Failed(e)
                }
            };
            deliveries.push(Delivery {
                recipient_id: recipient.id,
                channel: Channel::Sms,
                warning_index: Some(i),
                status,
            });
        }
    }

    async fn email_path<E: EmailDispatcher>(
        &self,
        recipient: &Recipient,
        warnings: &[WarningRecord],
        email: &E,
        deliveries: &mut Vec<Delivery>,
    ) {
        let Some(address) = recipient.email() else {
            return;
        };

        for (i, warning) in warnings.iter().enumerate() {
            let message = compose::alert_email(warning, &self.config.location_label, address);
            let status = match email.send(&message).await {
                Ok(()) => {
                    tracing::info!(recipient_id = recipient.id, to = address, "alerts.email.sent");
                    DeliveryStatus::Sent
                }
                Err(e) => {
                    tracing::warn!(recipient_id = recipient.id, to = address, error = %e, "alerts.email.failed");
                    DeliveryStatus::Failed(e)
                }
            };
            deliveries.push(Delivery {
                recipient_id: recipient.id,
                channel: Channel::Email,
                warning_index: Some(i),
                status,
            });
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
