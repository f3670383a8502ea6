//! Timer-backed ticker for the scheduler loop.

use chrono::{DateTime, Utc};
use intake_governance_core::environment::{Clock, Ticker};
use std::time::Duration;
use tokio::time::{Interval, MissedTickBehavior};

/// Production ticker: wall-clock time and a fixed-period tokio interval
///
/// The first tick completes immediately, so a freshly started scheduler runs
/// a pass right away. A tick missed because a pass overran is delayed rather
/// than burst.
#[derive(Debug)]
pub struct IntervalTicker {
    interval: Interval,
}

impl IntervalTicker {
    /// Creates a ticker firing every `period`
    ///
    /// Must be called inside a tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if `period` is zero (see [`tokio::time::interval`]).
    #[must_use]
    pub fn new(period: Duration) -> Self {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }

    /// Time between ticks
    #[must_use]
    pub fn period(&self) -> Duration {
        self.interval.period()
    }
}

impl Clock for IntervalTicker {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

impl Ticker for IntervalTicker {
    async fn sleep_until_next_tick(&mut self) {
        self.interval.tick().await;
    }
}
