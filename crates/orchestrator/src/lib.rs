// Rust guideline compliant 2026-10-12

//! Orchestrator component -- polls official weather warnings and fans them out
//! to every registered recipient over SMS (rate limited) and email.
//!
//! Entry points: [`AlertOrchestrator::run_cycle`], [`AlertOrchestrator::run`],
//! [`WelcomeNotifier::notify`], [`ConditionsMonitor::run`].
//! Configuration via [`AlertConfig::builder`] and [`ConditionsConfig::builder`].

pub mod compose;
mod conditions;
mod cycle;
mod report;
mod welcome;

pub use conditions::{ConditionsConfig, ConditionsConfigBuilder, ConditionsMonitor};
pub use cycle::AlertOrchestrator;
pub use report::{CycleOutcome, CycleReport, Delivery, DeliveryStatus};
pub use welcome::WelcomeNotifier;

use std::time::Duration;

// ---------------------------------------------------------------------------
// OrchestratorError
// ---------------------------------------------------------------------------

/// Errors that can occur while configuring the orchestrator components.
///
/// Cycles themselves never fail; see [`CycleOutcome`].
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    /// The supplied configuration is invalid.
    #[error("invalid orchestrator configuration: {reason}")]
    InvalidConfig {
        /// Human-readable description of the problem.
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// AlertConfig + builder
// ---------------------------------------------------------------------------

/// Runtime configuration for an [`AlertOrchestrator`].
///
/// Construct via [`AlertConfig::builder`].
#[derive(Debug, Clone)]
pub struct AlertConfig {
    /// Delay between two scheduled alert cycles. The first cycle runs immediately.
    pub period: Duration,
    /// Optional upper bound on the number of cycles. `None` means infinite.
    pub iterations: Option<u64>,
    /// Place name shown in email subjects.
    pub location_label: String,
}

/// Builder for [`AlertConfig`].
///
/// Obtain via [`AlertConfig::builder`]; finalize with [`build`](Self::build).
#[derive(Debug)]
pub struct AlertConfigBuilder {
    period: Duration,
    iterations: Option<u64>,
    location_label: String,
}

impl AlertConfig {
    /// Create a builder.
    ///
    /// Default values: `period = 1 h`, `iterations = None`,
    /// `location_label = "Santa Isabel"`.
    #[must_use]
    pub fn builder() -> AlertConfigBuilder {
        AlertConfigBuilder {
            period: Duration::from_secs(3600),
            iterations: None,
            location_label: "Santa Isabel".to_owned(),
        }
    }
}

impl AlertConfigBuilder {
    /// Override the delay between scheduled cycles.
    #[must_use]
    pub fn period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// Set a finite cycle count. Without this the schedule runs forever.
    #[must_use]
    pub fn iterations(mut self, n: u64) -> Self {
        self.iterations = Some(n);
        self
    }

    /// Override the place name shown in email subjects.
    #[must_use]
    pub fn location_label(mut self, label: impl Into<String>) -> Self {
        self.location_label = label.into();
        self
    }

    /// Validate and build the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::InvalidConfig`] when `period` is zero or
    /// `location_label` is blank.
    #[must_use = "the Result must be checked; use ? or unwrap"]
    pub fn build(self) -> Result<AlertConfig, OrchestratorError> {
        if self.period.is_zero() {
            return Err(OrchestratorError::InvalidConfig {
                reason: "period must be > 0".to_owned(),
            });
        }
        let location_label = self.location_label.trim().to_owned();
        if location_label.is_empty() {
            return Err(OrchestratorError::InvalidConfig {
                reason: "location_label must not be blank".to_owned(),
            });
        }
        Ok(AlertConfig {
            period: self.period,
            iterations: self.iterations,
            location_label,
        })
    }
}
