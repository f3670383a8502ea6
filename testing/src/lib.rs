//! # Intake Governance Testing
//!
//! Testing utilities for the intake governance engine.
//!
//! This crate provides:
//! - Deterministic clocks and a simulated-time scheduler ticker
//! - In-memory and recording implementations of the collaborator ports
//! - [`IntakeBuilder`] for intake fixtures
//! - [`ReducerTest`], a Given-When-Then harness for reducers
//!
//! ## Example
//!
//! ```ignore
//! use intake_governance_testing::{IntakeBuilder, InMemoryIntakeRepository, test_clock};
//!
//! #[tokio::test]
//! async fn alerts_once() {
//!     let now = test_clock().now();
//!     let repository = Arc::new(InMemoryIntakeRepository::with_intakes(vec![
//!         IntakeBuilder::new("intake-1")
//!             .with_lcid("25001A", now + Duration::days(30))
//!             .build(),
//!     ]));
//!     // ... build a scheduler over the repository and run a pass
//! }
//! ```

use chrono::{DateTime, Duration, Utc};
use intake_governance_core::environment::{Clock, Ticker};
use intake_governance_core::lcid::LcidGenerator;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::sync::watch;

pub mod fixtures;
pub mod port_mocks;
pub mod reducer_test;

/// Mock implementations of environment traits
pub mod mocks {
    use super::{
        AtomicU32, Clock, DateTime, Duration, LcidGenerator, Ordering, Ticker, Utc, watch,
    };

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use intake_governance_testing::mocks::FixedClock;
    /// use intake_governance_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }

    /// Simulated-time ticker for driving the scheduler loop
    ///
    /// The first tick fires at the start time, each later tick advances time
    /// by `step`. After `ticks` ticks the ticker raises the shutdown signal
    /// (if one was attached) and never ticks again.
    ///
    /// Without a shutdown sender an exhausted ticker waits forever.
    #[derive(Debug)]
    pub struct ManualTicker {
        now: DateTime<Utc>,
        step: Duration,
        remaining_ticks: usize,
        started: bool,
        shutdown: Option<watch::Sender<bool>>,
    }

    impl ManualTicker {
        /// Ticker starting at `start`, firing `ticks` times `step` apart
        #[must_use]
        pub const fn new(start: DateTime<Utc>, step: Duration, ticks: usize) -> Self {
            Self {
                now: start,
                step,
                remaining_ticks: ticks,
                started: false,
                shutdown: None,
            }
        }

        /// Signal `shutdown` once all ticks are spent
        #[must_use]
        pub fn with_shutdown(mut self, shutdown: watch::Sender<bool>) -> Self {
            self.shutdown = Some(shutdown);
            self
        }
    }

    impl Clock for ManualTicker {
        fn now(&self) -> DateTime<Utc> {
            self.now
        }
    }

    impl Ticker for ManualTicker {
        async fn sleep_until_next_tick(&mut self) {
            if self.remaining_ticks == 0 {
                if let Some(shutdown) = &self.shutdown {
                    let _ = shutdown.send(true);
                }
                std::future::pending::<()>().await;
            }

            if self.started {
                self.now += self.step;
            } else {
                self.started = true;
            }
            self.remaining_ticks -= 1;
        }
    }

    /// LCID generator producing `LCID-1`, `LCID-2`, ...
    #[derive(Debug, Default)]
    pub struct SequentialLcidGenerator {
        next: AtomicU32,
    }

    impl SequentialLcidGenerator {
        /// Create a generator starting at 1
        #[must_use]
        pub const fn new() -> Self {
            Self {
                next: AtomicU32::new(1),
            }
        }
    }

    impl LcidGenerator for SequentialLcidGenerator {
        fn generate(&self, _now: DateTime<Utc>) -> String {
            format!("LCID-{}", self.next.fetch_add(1, Ordering::SeqCst))
        }
    }
}

/// Test helpers and utilities
pub mod helpers {
    use tracing_subscriber::EnvFilter;

    /// Install a test-friendly tracing subscriber
    ///
    /// Honors `RUST_LOG`. Safe to call from every test; only the first call
    /// installs the subscriber.
    pub fn init_test_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }
}

// Re-export commonly used items
pub use fixtures::IntakeBuilder;
pub use helpers::init_test_tracing;
pub use mocks::{FixedClock, ManualTicker, SequentialLcidGenerator, test_clock};
pub use port_mocks::{InMemoryIntakeRepository, MockUserDirectory, RecordingAlertSender};
pub use reducer_test::{ReducerTest, assertions};
