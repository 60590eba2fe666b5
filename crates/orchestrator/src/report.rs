// Rust guideline compliant 2026-10-12

//! Typed per-send results collected by an alert cycle.

use domain::{Channel, DispatchError};
use uuid::Uuid;

/// How an alert cycle ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Another cycle was still in flight; nothing was fetched.
    Overlapping,
    /// The weather source has no credential configured.
    Skipped,
    /// The weather source or the directory failed; nothing was dispatched.
    Aborted {
        /// Human-readable description.
        reason: String,
    },
    /// No active warnings; the directory was not queried.
    NoWarnings,
    /// Fan-out ran over every recipient.
    Completed {
        /// Number of active warnings.
        warnings: usize,
        /// Size of the directory snapshot.
        recipients: usize,
    },
}

/// Result of one (recipient, channel, warning) send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryStatus {
    /// The dispatcher accepted the message.
    Sent,
    /// The rate limiter denied the recipient for this window; no call was made.
    Throttled,
    /// The dispatcher returned an error. Not retried.
    Failed(DispatchError),
}

/// One entry in a [`CycleReport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub recipient_id: i64,
    pub channel: Channel,
    /// Index into the cycle's warning list; `None` for welcome messages.
    pub warning_index: Option<usize>,
    pub status: DeliveryStatus,
}

impl Delivery {
    /// `true` when the dispatcher was actually called.
    #[must_use]
    pub fn attempted(&self) -> bool {
        !matches!(self.status, DeliveryStatus::Throttled)
    }
}

/// Everything an alert cycle did, in dispatch order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// Correlates the report with the cycle's log span.
    pub cycle_id: Uuid,
    pub outcome: CycleOutcome,
    pub deliveries: Vec<Delivery>,
}

impl CycleReport {
    /// Report for a cycle that dispatched nothing.
    #[must_use]
    pub fn empty(cycle_id: Uuid, outcome: CycleOutcome) -> Self {
        Self { cycle_id, outcome, deliveries: vec![] }
    }

    /// Number of dispatcher calls made on `channel`.
    #[must_use]
    pub fn attempts(&self, channel: Channel) -> usize {
        self.on(channel).filter(|d| d.attempted()).count()
    }

    /// Number of successful sends on `channel`.
    #[must_use]
    pub fn sent(&self, channel: Channel) -> usize {
        self.on(channel)
            .filter(|d| d.status == DeliveryStatus::Sent)
            .count()
    }

    /// Number of failed sends on `channel`.
    #[must_use]
    pub fn failed(&self, channel: Channel) -> usize {
        self.on(channel)
            .filter(|d| matches!(d.status, DeliveryStatus::Failed(_)))
            .count()
    }

    /// Number of sends suppressed by the rate limiter on `channel`.
    #[must_use]
    pub fn throttled(&self, channel: Channel) -> usize {
        self.on(channel)
            .filter(|d| d.status == DeliveryStatus::Throttled)
            .count()
    }

    fn on(&self, channel: Channel) -> impl Iterator<Item = &Delivery> {
        self.deliveries.iter().filter(move |d| d.channel == channel)
    }
}
