// Rust guideline compliant 2026-10-12

//! Periodic current-conditions log for operators.

use std::time::Duration;

use domain::{CurrentConditions, SourceError, WarningSource};
use tokio::time::MissedTickBehavior;

use crate::OrchestratorError;

// ---------------------------------------------------------------------------
// ConditionsConfig + builder
// ---------------------------------------------------------------------------

/// Runtime configuration for a [`ConditionsMonitor`].
///
/// Construct via [`ConditionsConfig::builder`].
#[derive(Debug, Clone)]
pub struct ConditionsConfig {
    /// Delay between two readings. The first reading is taken immediately.
    pub period: Duration,
    /// Optional upper bound on the number of readings. `None` means infinite.
    pub iterations: Option<u64>,
}

/// Builder for [`ConditionsConfig`].
#[derive(Debug)]
pub struct ConditionsConfigBuilder {
    period: Duration,
    iterations: Option<u64>,
}

impl ConditionsConfig {
    /// Create a builder. Default values: `period = 15 min`, `iterations = None`.
    #[must_use]
    pub fn builder() -> ConditionsConfigBuilder {
        ConditionsConfigBuilder { period: Duration::from_secs(15 * 60), iterations: None }
    }
}

impl ConditionsConfigBuilder {
    /// Override the delay between readings.
    #[must_use]
    pub fn period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// Set a finite reading count.
    #[must_use]
    pub fn iterations(mut self, n: u64) -> Self {
        self.iterations = Some(n);
        self
    }

    /// Validate and build the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::InvalidConfig`] when `period` is zero.
    #[must_use = "the Result must be checked; use ? or unwrap"]
    pub fn build(self) -> Result<ConditionsConfig, OrchestratorError> {
        if self.period.is_zero() {
            return Err(OrchestratorError::InvalidConfig {
                reason: "conditions period must be > 0".to_owned(),
            });
        }
        Ok(ConditionsConfig { period: self.period, iterations: self.iterations })
    }
}

// ---------------------------------------------------------------------------
// ConditionsMonitor
// ---------------------------------------------------------------------------

/// Logs the current weather at a fixed cadence.
#[derive(Debug)]
pub struct ConditionsMonitor {
    config: ConditionsConfig,
}

impl ConditionsMonitor {
    /// Create a new monitor from `config`.
    #[must_use]
    pub fn new(config: ConditionsConfig) -> Self {
        Self { config }
    }

    /// Take one reading. Returns `None` when skipped or failed; both are logged.
    pub async fn check_once<W: WarningSource>(&self, source: &W) -> Option<CurrentConditions> {
        match source.current_conditions().await {
            Ok(c) => {
                tracing::info!(
                    condition = %c.condition_text,
                    temperature_c = c.temperature_c,
                    humidity = c.humidity,
                    wind_kph = c.wind_kph,
                    feels_like_c = c.feels_like_c,
                    "conditions.current"
                );
                Some(c)
            }
            Err(SourceError::MissingCredential) => {
                tracing::debug!("conditions.skipped: weather credential not configured");
                None
            }
            Err(e) => {
                tracing::error!(error = %e, "conditions.failed");
                None
            }
        }
    }

    /// Take readings until the iteration bound is reached.
    pub async fn run<W: WarningSource>(&self, source: &W) {
        let mut ticker = tokio::time::interval(self.config.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut count = 0u64;
        loop {
            ticker.tick().await;
            self.check_once(source).await;

            count += 1;
            if let Some(max) = self.config.iterations
                && count >= max
            {
                tracing::info!("conditions.run.stopped: iteration limit reached");
                return;
            }
        }
    }
}
