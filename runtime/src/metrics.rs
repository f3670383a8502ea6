//! Prometheus metrics for the governance runtime.
//!
//! Counters are recorded through the `metrics` facade wherever the work
//! happens. [`PrometheusMetrics::install`] wires a Prometheus recorder behind
//! the facade and describes every metric this crate emits.
//!
//! # Example
//!
//! ```rust,no_run
//! use intake_governance_runtime::metrics::PrometheusMetrics;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let metrics = PrometheusMetrics::install()?;
//! // Serve this from the application's /metrics endpoint
//! let body = metrics.render();
//! # Ok(())
//! # }
//! ```

use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use thiserror::Error;

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Installed Prometheus recorder.
pub struct PrometheusMetrics {
    handle: PrometheusHandle,
}

impl PrometheusMetrics {
    /// Describe all metrics and install the Prometheus recorder globally.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::Install`] if a recorder is already installed.
    pub fn install() -> Result<Self, MetricsError> {
        register_metrics();

        let handle = PrometheusBuilder::new()
            // Passes run for seconds to minutes, not milliseconds
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 15.0, 30.0, 60.0, 300.0],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?
            .install_recorder()
            .map_err(|e| MetricsError::Install(e.to_string()))?;

        tracing::info!("Prometheus metrics recorder installed");
        Ok(Self { handle })
    }

    /// Render current metrics in Prometheus text format.
    #[must_use]
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// Register all metric descriptions.
pub fn register_metrics() {
    // Expiration alert scheduler
    describe_counter!(
        "lcid_expiration_alerts_sent_total",
        "Total number of LCID expiration alerts sent, by kind"
    );
    describe_counter!(
        "lcid_expiration_alert_resets_total",
        "Total number of alert cycles reset after leaving the alert window"
    );
    describe_counter!(
        "lcid_expiration_alert_failures_total",
        "Total number of intakes skipped in a pass, by failing stage"
    );
    describe_counter!(
        "lcid_expiration_passes_total",
        "Total number of scheduler passes, by outcome"
    );
    describe_histogram!(
        "lcid_expiration_pass_duration_seconds",
        "Time taken by one scheduler pass"
    );

    // Store
    describe_counter!(
        "store_effects_executed_total",
        "Total number of effects executed by the store, by type"
    );
}
