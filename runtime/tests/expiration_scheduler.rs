//! Integration tests for the LCID expiration alert scheduler.

#![allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect

use chrono::{DateTime, Duration, Utc};
use intake_governance_core::environment::Clock;
use intake_governance_core::error::{LookupError, NotificationError, RepositoryError};
use intake_governance_core::intake::{
    ExpirationAlertState, GovernanceStatus, IntakeId, SystemIntake,
};
use intake_governance_core::ports::{EmailAddress, IntakeRepository};
use intake_governance_runtime::config::AlertSchedulerConfig;
use intake_governance_runtime::{ExpirationAlertScheduler, PassReport, SchedulerError};
use intake_governance_testing::{
    InMemoryIntakeRepository, IntakeBuilder, ManualTicker, MockUserDirectory,
    RecordingAlertSender, init_test_tracing, test_clock,
};
use std::sync::Arc;
use tokio::sync::watch;

const MAILBOX: &str = "it_governance@example.gov";
const REQUESTER_EMAIL: &str = "alex.requester@example.gov";

struct Harness {
    repository: Arc<InMemoryIntakeRepository>,
    directory: Arc<MockUserDirectory>,
    sender: Arc<RecordingAlertSender>,
    scheduler: ExpirationAlertScheduler,
}

impl Harness {
    fn new(intakes: Vec<SystemIntake>) -> Self {
        Self::with_directory(
            intakes,
            MockUserDirectory::new().with_contact("ABCD", "Alex Requester", REQUESTER_EMAIL),
        )
    }

    fn with_directory(intakes: Vec<SystemIntake>, directory: MockUserDirectory) -> Self {
        init_test_tracing();
        let repository = Arc::new(InMemoryIntakeRepository::with_intakes(intakes));
        let directory = Arc::new(directory);
        let sender = Arc::new(RecordingAlertSender::new());
        let scheduler = ExpirationAlertScheduler::new(
            repository.clone(),
            directory.clone(),
            sender.clone(),
            AlertSchedulerConfig::new(EmailAddress::new(MAILBOX.to_string())),
        );
        Self {
            repository,
            directory,
            sender,
            scheduler,
        }
    }

    fn alert_state(&self, id: &str) -> ExpirationAlertState {
        self.repository.get(id).unwrap().expiration_alert
    }
}

fn now() -> DateTime<Utc> {
    test_clock().now()
}

fn expiring_in(id: &str, duration: Duration) -> SystemIntake {
    IntakeBuilder::new(id)
        .with_lcid("25001A", now() + duration)
        .build()
}

fn mailboxes(addresses: &[EmailAddress]) -> Vec<&str> {
    addresses.iter().map(EmailAddress::as_str).collect()
}

#[tokio::test]
async fn no_alert_more_than_sixty_days_out() {
    let harness = Harness::new(vec![expiring_in("intake-1", Duration::days(61))]);

    let report = harness.scheduler.run_pass(now()).await.unwrap();

    assert_eq!(report.scanned, 1);
    assert!(harness.sender.sent().is_empty());
    assert_eq!(harness.alert_state("intake-1"), ExpirationAlertState::NeverAlerted);
    assert_eq!(harness.repository.persist_count(), 0);
}

#[tokio::test]
async fn one_alert_at_window_edge_and_inside() {
    let harness = Harness::new(vec![
        expiring_in("at-edge", Duration::days(60)),
        expiring_in("inside", Duration::days(46)),
    ]);

    let report = harness.scheduler.run_pass(now()).await.unwrap();

    assert_eq!(report.initial_alerts, 2);
    assert_eq!(harness.sender.sent().len(), 2);
    assert_eq!(harness.alert_state("at-edge"), ExpirationAlertState::AlertedAt(now()));
    assert_eq!(harness.alert_state("inside"), ExpirationAlertState::AlertedAt(now()));
}

#[tokio::test]
async fn alert_carries_lcid_details_and_both_recipients() {
    let harness = Harness::new(vec![expiring_in("intake-1", Duration::days(30))]);

    harness.scheduler.run_pass(now()).await.unwrap();

    let sent = harness.sender.sent();
    assert_eq!(sent.len(), 1);
    let alert = &sent[0];
    assert_eq!(mailboxes(&alert.recipients), vec![REQUESTER_EMAIL, MAILBOX]);
    assert_eq!(alert.intake_id, IntakeId::new("intake-1".to_string()));
    assert_eq!(alert.project_name, "Project intake-1");
    assert_eq!(alert.requester_name, "Alex Requester");
    assert_eq!(alert.lcid, "25001A");
    assert_eq!(alert.expires_at, now() + Duration::days(30));
    assert_eq!(alert.scope, "Full project scope");
    assert_eq!(alert.cost_baseline, "$1.2M");
    assert_eq!(alert.next_steps, "Check back before expiration");
}

#[tokio::test]
async fn repeated_scan_at_same_time_alerts_once() {
    let harness = Harness::new(vec![expiring_in("intake-1", Duration::days(50))]);

    harness.scheduler.run_pass(now()).await.unwrap();
    let second = harness.scheduler.run_pass(now()).await.unwrap();

    assert_eq!(second, PassReport {
        scanned: 1,
        ..PassReport::default()
    });
    assert_eq!(harness.sender.sent().len(), 1);
}

#[tokio::test]
async fn follow_up_once_after_fourteen_days() {
    let harness = Harness::new(vec![expiring_in("intake-1", Duration::days(50))]);
    let t = now();

    harness.scheduler.run_pass(t).await.unwrap();
    assert_eq!(harness.sender.sent().len(), 1);

    harness.scheduler.run_pass(t + Duration::days(2)).await.unwrap();
    assert_eq!(harness.sender.sent().len(), 1);

    let report = harness.scheduler.run_pass(t + Duration::days(15)).await.unwrap();
    assert_eq!(report.follow_up_alerts, 1);
    assert_eq!(harness.sender.sent().len(), 2);
    assert_eq!(harness.alert_state("intake-1"), ExpirationAlertState::Suppressed);

    harness.scheduler.run_pass(t + Duration::days(17)).await.unwrap();
    harness.scheduler.run_pass(t + Duration::days(40)).await.unwrap();
    assert_eq!(harness.sender.sent().len(), 2);
}

#[tokio::test]
async fn extended_expiration_resets_and_realerts_on_reentry() {
    let harness = Harness::new(vec![expiring_in("intake-1", Duration::days(30))]);
    let t = now();

    harness.scheduler.run_pass(t).await.unwrap();
    assert_eq!(harness.sender.sent().len(), 1);

    // Someone pushes the expiration out past the window without going
    // through the LCID operations
    let mut extended = harness.repository.get("intake-1").unwrap();
    extended.lifecycle_expires_at = Some(t + Duration::days(120));
    harness.repository.persist(extended).await.unwrap();

    let report = harness.scheduler.run_pass(t + Duration::days(1)).await.unwrap();
    assert_eq!(report.resets, 1);
    assert_eq!(harness.alert_state("intake-1"), ExpirationAlertState::NeverAlerted);

    // 70 days later the new expiration is 49 days away
    let report = harness.scheduler.run_pass(t + Duration::days(71)).await.unwrap();
    assert_eq!(report.initial_alerts, 1);
    assert_eq!(harness.sender.sent().len(), 2);
}

#[tokio::test]
async fn expired_lcid_with_bookkeeping_is_reset() {
    let harness = Harness::new(vec![
        IntakeBuilder::new("intake-1")
            .with_lcid("25001A", now() - Duration::days(1))
            .expiration_alert(ExpirationAlertState::Suppressed)
            .build(),
    ]);

    let report = harness.scheduler.run_pass(now()).await.unwrap();

    assert_eq!(report.resets, 1);
    assert!(harness.sender.sent().is_empty());
    assert_eq!(harness.alert_state("intake-1"), ExpirationAlertState::NeverAlerted);
}

#[tokio::test]
async fn ineligible_intakes_are_skipped() {
    let harness = Harness::new(vec![
        IntakeBuilder::new("no-lcid").build(),
        IntakeBuilder::new("no-governance")
            .with_lcid("25001A", now() + Duration::days(10))
            .governance_status(GovernanceStatus::NoGovernanceNeeded)
            .build(),
        IntakeBuilder::new("no-requester")
            .requester("")
            .with_lcid("25001B", now() + Duration::days(10))
            .build(),
    ]);

    let report = harness.scheduler.run_pass(now()).await.unwrap();

    assert_eq!(report, PassReport {
        scanned: 3,
        ..PassReport::default()
    });
    assert!(harness.sender.sent().is_empty());
    assert_eq!(harness.directory.lookup_count(), 0);
}

#[tokio::test]
async fn expected_lookup_errors_alert_mailbox_only() {
    let harness = Harness::with_directory(
        vec![
            IntakeBuilder::new("unknown")
                .requester("GONE")
                .with_lcid("25001A", now() + Duration::days(10))
                .build(),
            IntakeBuilder::new("malformed")
                .requester("???")
                .with_lcid("25001B", now() + Duration::days(10))
                .build(),
        ],
        MockUserDirectory::new()
            .with_error("???", LookupError::InvalidInput("bad identifier".to_string())),
    );

    let report = harness.scheduler.run_pass(now()).await.unwrap();

    assert_eq!(report.initial_alerts, 2);
    assert_eq!(report.failures, 0);
    for alert in harness.sender.sent() {
        assert_eq!(mailboxes(&alert.recipients), vec![MAILBOX]);
        assert_eq!(alert.requester_name, "Alex Requester");
    }
    assert_eq!(harness.alert_state("unknown"), ExpirationAlertState::AlertedAt(now()));
}

#[tokio::test]
async fn unexpected_lookup_error_skips_only_that_intake() {
    let harness = Harness::with_directory(
        vec![
            IntakeBuilder::new("broken")
                .requester("BOOM")
                .with_lcid("25001A", now() + Duration::days(10))
                .build(),
            expiring_in("healthy", Duration::days(10)),
        ],
        MockUserDirectory::new()
            .with_contact("ABCD", "Alex Requester", REQUESTER_EMAIL)
            .with_error("BOOM", LookupError::Other("directory timeout".to_string())),
    );

    let report = harness.scheduler.run_pass(now()).await.unwrap();

    assert_eq!(report.failures, 1);
    assert_eq!(report.initial_alerts, 1);
    assert_eq!(harness.sender.sent().len(), 1);
    assert_eq!(harness.alert_state("broken"), ExpirationAlertState::NeverAlerted);
    assert_eq!(harness.alert_state("healthy"), ExpirationAlertState::AlertedAt(now()));
}

#[tokio::test]
async fn send_failure_is_retried_next_pass() {
    let harness = Harness::new(vec![expiring_in("intake-1", Duration::days(20))]);
    harness
        .sender
        .set_failure(Some(NotificationError::DeliveryFailed("smtp down".to_string())));

    let report = harness.scheduler.run_pass(now()).await.unwrap();
    assert_eq!(report.failures, 1);
    assert_eq!(harness.alert_state("intake-1"), ExpirationAlertState::NeverAlerted);
    assert_eq!(harness.repository.persist_count(), 0);

    harness.sender.set_failure(None);
    let later = now() + Duration::days(1);
    let report = harness.scheduler.run_pass(later).await.unwrap();
    assert_eq!(report.initial_alerts, 1);
    assert_eq!(harness.sender.attempts(), 2);
    assert_eq!(harness.alert_state("intake-1"), ExpirationAlertState::AlertedAt(later));
}

#[tokio::test]
async fn fetch_failure_aborts_pass() {
    let harness = Harness::new(vec![expiring_in("intake-1", Duration::days(20))]);
    let error = RepositoryError::Database("connection refused".to_string());
    harness.repository.set_fetch_error(Some(error.clone()));

    let result = harness.scheduler.run_pass(now()).await;

    assert_eq!(result, Err(SchedulerError::FetchFailed(error)));
    assert_eq!(harness.sender.attempts(), 0);
}

#[tokio::test]
async fn persist_failure_after_send_is_returned() {
    let harness = Harness::new(vec![
        expiring_in("intake-1", Duration::days(20)),
        expiring_in("intake-2", Duration::days(20)),
    ]);
    let error = RepositoryError::Conflict("stale version".to_string());
    harness.repository.set_persist_error(Some(error.clone()));

    let result = harness.scheduler.run_pass(now()).await;

    assert_eq!(
        result,
        Err(SchedulerError::PersistFailed {
            intake_id: IntakeId::new("intake-1".to_string()),
            source: error,
        })
    );
    // The email went out but the pass stopped before the next intake
    assert_eq!(harness.sender.sent().len(), 1);
}

#[tokio::test]
async fn run_loop_drives_passes_until_shutdown() {
    let harness = Harness::new(vec![expiring_in("intake-1", Duration::days(50))]);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Daily ticks for three weeks: first alert on day 0, follow-up on day 15
    let ticker = ManualTicker::new(now(), Duration::days(1), 21).with_shutdown(shutdown_tx);

    tokio::time::timeout(
        std::time::Duration::from_secs(5),
        harness.scheduler.run(ticker, shutdown_rx),
    )
    .await
    .expect("scheduler should stop after the ticker is exhausted");

    let sent = harness.sender.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(harness.alert_state("intake-1"), ExpirationAlertState::Suppressed);
}

#[tokio::test]
async fn run_loop_survives_failing_passes() {
    let harness = Harness::new(vec![expiring_in("intake-1", Duration::days(50))]);
    harness
        .repository
        .set_fetch_error(Some(RepositoryError::Database("down".to_string())));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let ticker = ManualTicker::new(now(), Duration::hours(1), 3).with_shutdown(shutdown_tx);

    tokio::time::timeout(
        std::time::Duration::from_secs(5),
        harness.scheduler.run(ticker, shutdown_rx),
    )
    .await
    .expect("scheduler should keep ticking through errors and then stop");

    assert!(harness.sender.sent().is_empty());
}

#[tokio::test]
async fn run_loop_stops_immediately_when_already_shut_down() {
    let harness = Harness::new(vec![expiring_in("intake-1", Duration::days(50))]);
    let (_shutdown_tx, shutdown_rx) = watch::channel(true);
    let ticker = ManualTicker::new(now(), Duration::days(1), 5);

    harness.scheduler.run(ticker, shutdown_rx).await;

    assert!(harness.sender.sent().is_empty());
}
