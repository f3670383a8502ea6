//! LCID expiration alert scheduler.
//!
//! Once per tick the scheduler loads every intake, asks
//! [`expiration::evaluate`] what to do with each one and carries the decision
//! out: resolve recipients, send the alert email, record the alert cycle and
//! persist the intake.
//!
//! # Failure handling
//!
//! | Failure | Effect |
//! |---------|--------|
//! | `fetch_all` | pass aborted, [`SchedulerError::FetchFailed`] |
//! | unexpected requester lookup error | intake skipped, retried next tick |
//! | send | intake skipped, retried next tick |
//! | persist | pass aborted, [`SchedulerError::PersistFailed`] |
//!
//! A skipped intake is never mutated, so the next pass sees it unchanged.

use crate::config::AlertSchedulerConfig;
use crate::error::SchedulerError;
use crate::recipients::resolve_recipients;
use chrono::{DateTime, Utc};
use intake_governance_core::environment::Ticker;
use intake_governance_core::expiration::{self, AlertDecision};
use intake_governance_core::intake::SystemIntake;
use intake_governance_core::ports::{
    ExpirationAlert, ExpirationAlertSender, IntakeRepository, UserDirectory,
};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;

/// Counts from one scheduler pass
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Intakes examined
    pub scanned: usize,
    /// First alerts sent
    pub initial_alerts: usize,
    /// Follow-up alerts sent
    pub follow_up_alerts: usize,
    /// Alert cycles cleared after leaving the window
    pub resets: usize,
    /// Intakes skipped because of a lookup or send failure
    pub failures: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum AlertKind {
    Initial,
    FollowUp,
}

impl AlertKind {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::FollowUp => "follow_up",
        }
    }
}

/// Periodic LCID expiration alert scan
pub struct ExpirationAlertScheduler {
    repository: Arc<dyn IntakeRepository>,
    directory: Arc<dyn UserDirectory>,
    sender: Arc<dyn ExpirationAlertSender>,
    config: AlertSchedulerConfig,
}

impl ExpirationAlertScheduler {
    /// Creates a scheduler over the given collaborators
    #[must_use]
    pub fn new(
        repository: Arc<dyn IntakeRepository>,
        directory: Arc<dyn UserDirectory>,
        sender: Arc<dyn ExpirationAlertSender>,
        config: AlertSchedulerConfig,
    ) -> Self {
        Self {
            repository,
            directory,
            sender,
            config,
        }
    }

    /// Scheduler configuration
    #[must_use]
    pub const fn config(&self) -> &AlertSchedulerConfig {
        &self.config
    }

    /// Drive passes from `ticker` until `shutdown` becomes `true`
    ///
    /// Shutdown is observed while waiting for a tick, never in the middle of
    /// a pass. Dropping the shutdown sender also stops the loop. Pass errors
    /// are logged and the next tick retries.
    pub async fn run<T: Ticker>(&self, mut ticker: T, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            tick_interval_secs = self.config.tick_interval.as_secs(),
            "Expiration alert scheduler started"
        );

        while !*shutdown.borrow() {
            tokio::select! {
                () = ticker.sleep_until_next_tick() => {
                    // Pass errors are already logged and counted
                    let _ = self.run_pass(ticker.now()).await;
                },
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        tracing::info!("Shutdown sender dropped");
                        break;
                    }
                },
            }
        }

        tracing::info!("Expiration alert scheduler stopped");
    }

    /// Run a single pass at `now`
    ///
    /// # Errors
    ///
    /// - [`SchedulerError::FetchFailed`]: the intake list could not be loaded
    /// - [`SchedulerError::PersistFailed`]: an intake could not be saved after
    ///   its alert state changed; the rest of the pass is abandoned
    #[tracing::instrument(skip(self), name = "lcid_expiration_pass")]
    pub async fn run_pass(&self, now: DateTime<Utc>) -> Result<PassReport, SchedulerError> {
        let started = Instant::now();
        let result = self.scan(now).await;
        metrics::histogram!("lcid_expiration_pass_duration_seconds")
            .record(started.elapsed().as_secs_f64());

        match &result {
            Ok(report) => {
                metrics::counter!("lcid_expiration_passes_total", "outcome" => "ok").increment(1);
                tracing::info!(
                    scanned = report.scanned,
                    initial_alerts = report.initial_alerts,
                    follow_up_alerts = report.follow_up_alerts,
                    resets = report.resets,
                    failures = report.failures,
                    "Expiration alert pass complete"
                );
            },
            Err(error) => {
                metrics::counter!("lcid_expiration_passes_total", "outcome" => "error")
                    .increment(1);
                tracing::error!(%error, "Expiration alert pass failed");
            },
        }

        result
    }

    async fn scan(&self, now: DateTime<Utc>) -> Result<PassReport, SchedulerError> {
        let intakes = self
            .repository
            .fetch_all()
            .await
            .map_err(SchedulerError::FetchFailed)?;

        let mut report = PassReport::default();
        for mut intake in intakes {
            report.scanned += 1;

            match expiration::evaluate(&intake, now, &self.config.thresholds) {
                AlertDecision::Skip(reason) => {
                    tracing::trace!(intake_id = %intake.id, ?reason, "Not eligible for alerts");
                },
                AlertDecision::Wait | AlertDecision::Idle => {},
                AlertDecision::Reset => {
                    tracing::info!(intake_id = %intake.id, "LCID left alert window, resetting alert cycle");
                    intake.reset_expiration_alert();
                    self.persist(intake).await?;
                    metrics::counter!("lcid_expiration_alert_resets_total").increment(1);
                    report.resets += 1;
                },
                AlertDecision::SendInitial => {
                    if self.send_alert(&intake, AlertKind::Initial).await {
                        intake.record_initial_alert(now);
                        self.persist(intake).await?;
                        report.initial_alerts += 1;
                    } else {
                        report.failures += 1;
                    }
                },
                AlertDecision::SendFollowUp => {
                    if self.send_alert(&intake, AlertKind::FollowUp).await {
                        intake.record_follow_up_alert();
                        self.persist(intake).await?;
                        report.follow_up_alerts += 1;
                    } else {
                        report.failures += 1;
                    }
                },
            }
        }

        Ok(report)
    }

    /// Resolves recipients and sends one alert. Returns `false` if the intake
    /// should be skipped this pass.
    async fn send_alert(&self, intake: &SystemIntake, kind: AlertKind) -> bool {
        let Some(expires_at) = intake.lifecycle_expires_at else {
            return false;
        };

        let recipients = match resolve_recipients(
            self.directory.as_ref(),
            &intake.requester,
            &self.config.governance_mailbox,
        )
        .await
        {
            Ok(recipients) => recipients,
            Err(error) => {
                tracing::error!(
                    intake_id = %intake.id,
                    requester = %intake.requester,
                    %error,
                    "Failed to resolve alert recipients"
                );
                metrics::counter!("lcid_expiration_alert_failures_total", "stage" => "lookup")
                    .increment(1);
                return false;
            },
        };

        let requester_name = recipients
            .requester
            .map_or_else(|| intake.requester_name.clone(), |contact| contact.common_name);

        let alert = ExpirationAlert {
            recipients: recipients.addresses,
            intake_id: intake.id.clone(),
            project_name: intake.project_name.clone(),
            requester_name,
            lcid: intake.lifecycle_id.clone().unwrap_or_default(),
            expires_at,
            scope: intake.lifecycle_scope.clone().unwrap_or_default(),
            cost_baseline: intake.lifecycle_cost_baseline.clone().unwrap_or_default(),
            next_steps: intake.decision_next_steps.clone().unwrap_or_default(),
        };

        match self.sender.send_expiration_alert(alert).await {
            Ok(()) => {
                tracing::info!(
                    intake_id = %intake.id,
                    lcid = intake.lifecycle_id.as_deref().unwrap_or_default(),
                    %expires_at,
                    kind = kind.as_str(),
                    "LCID expiration alert sent"
                );
                metrics::counter!("lcid_expiration_alerts_sent_total", "kind" => kind.as_str())
                    .increment(1);
                true
            },
            Err(error) => {
                tracing::error!(
                    intake_id = %intake.id,
                    kind = kind.as_str(),
                    %error,
                    "Failed to send LCID expiration alert"
                );
                metrics::counter!("lcid_expiration_alert_failures_total", "stage" => "send")
                    .increment(1);
                false
            },
        }
    }

    async fn persist(&self, intake: SystemIntake) -> Result<(), SchedulerError> {
        let intake_id = intake.id.clone();
        match self.repository.persist(intake).await {
            Ok(_) => Ok(()),
            Err(source) => {
                tracing::error!(
                    intake_id = %intake_id,
                    error = %source,
                    "Failed to persist intake after alert state change"
                );
                Err(SchedulerError::PersistFailed { intake_id, source })
            },
        }
    }
}
