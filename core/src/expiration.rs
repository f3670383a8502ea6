//! LCID expiration alert policy.
//!
//! [`evaluate`] decides, for a single intake at an explicit `now`, what the
//! alert scheduler should do. It never reads the wall clock and never performs
//! I/O; the scheduler in the runtime crate carries out the decision.
//!
//! # Alert cycle
//!
//! ```text
//!   NeverAlerted ──(in window)──▶ AlertedAt(t) ──(> follow-up gap)──▶ Suppressed
//!        ▲                             │                                   │
//!        └────────────(outside window: reset)─────────────────────────────┘
//! ```

use crate::intake::{ExpirationAlertState, GovernanceStatus, SystemIntake};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Hours before expiration during which alerts are sent (60 days)
pub const ALERT_WINDOW_HOURS: i64 = 1440;

/// Hours after the first alert before the follow-up is sent (14 days)
pub const FOLLOW_UP_AFTER_HOURS: i64 = 336;

/// Thresholds that drive the alert cycle
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertThresholds {
    /// Length of the alert window before expiration, in hours
    pub alert_window_hours: i64,
    /// Minimum gap between first alert and follow-up, in hours
    pub follow_up_after_hours: i64,
}

impl AlertThresholds {
    /// Alert window as a duration, saturating at [`Duration::MAX`]
    #[must_use]
    pub fn alert_window(&self) -> Duration {
        Duration::try_hours(self.alert_window_hours).unwrap_or(Duration::MAX)
    }

    /// Follow-up gap as a duration, saturating at [`Duration::MAX`]
    #[must_use]
    pub fn follow_up_after(&self) -> Duration {
        Duration::try_hours(self.follow_up_after_hours).unwrap_or(Duration::MAX)
    }

    /// Whether both thresholds fit in a [`Duration`]
    #[must_use]
    pub fn in_range(&self) -> bool {
        Duration::try_hours(self.alert_window_hours).is_some()
            && Duration::try_hours(self.follow_up_after_hours).is_some()
    }
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            alert_window_hours: ALERT_WINDOW_HOURS,
            follow_up_after_hours: FOLLOW_UP_AFTER_HOURS,
        }
    }
}

/// Why an intake is not considered for alerting at all
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// No expiration date is set
    NoExpiration,
    /// The intake does not need governance
    NoGovernanceNeeded,
    /// There is no requester to notify
    NoRequester,
}

/// What the scheduler should do with one intake
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AlertDecision {
    /// Not eligible for alerting
    Skip(SkipReason),
    /// In window and never alerted: send the first alert
    SendInitial,
    /// In window and the follow-up gap has elapsed: send the follow-up
    SendFollowUp,
    /// In window, nothing due yet (or follow-up already sent)
    Wait,
    /// Left the window with alert bookkeeping still set: clear it
    Reset,
    /// Outside the window with nothing to clear
    Idle,
}

/// Decides the alert action for `intake` at `now`.
///
/// The window is `0 < expires_at - now <= alert_window`. An expiration exactly
/// `alert_window` away is inside the window.
#[must_use]
pub fn evaluate(
    intake: &SystemIntake,
    now: DateTime<Utc>,
    thresholds: &AlertThresholds,
) -> AlertDecision {
    let Some(expires_at) = intake.lifecycle_expires_at else {
        return AlertDecision::Skip(SkipReason::NoExpiration);
    };
    if intake.governance_status == GovernanceStatus::NoGovernanceNeeded {
        return AlertDecision::Skip(SkipReason::NoGovernanceNeeded);
    }
    if intake.requester.is_empty() {
        return AlertDecision::Skip(SkipReason::NoRequester);
    }

    let until_expiration = expires_at - now;
    let in_window =
        until_expiration > Duration::zero() && until_expiration <= thresholds.alert_window();

    if !in_window {
        return match intake.expiration_alert {
            ExpirationAlertState::NeverAlerted => AlertDecision::Idle,
            ExpirationAlertState::AlertedAt(_) | ExpirationAlertState::Suppressed => {
                AlertDecision::Reset
            },
        };
    }

    match intake.expiration_alert {
        ExpirationAlertState::NeverAlerted => AlertDecision::SendInitial,
        ExpirationAlertState::AlertedAt(first_alert)
            if now - first_alert > thresholds.follow_up_after() =>
        {
            AlertDecision::SendFollowUp
        },
        ExpirationAlertState::AlertedAt(_) | ExpirationAlertState::Suppressed => {
            AlertDecision::Wait
        },
    }
}

impl SystemIntake {
    /// Records that the first alert of a cycle went out at `now`
    pub fn record_initial_alert(&mut self, now: DateTime<Utc>) {
        self.expiration_alert = ExpirationAlertState::AlertedAt(now);
    }

    /// Records that the follow-up went out; no more alerts this cycle
    pub fn record_follow_up_alert(&mut self) {
        self.expiration_alert = ExpirationAlertState::Suppressed;
    }

    /// Restarts the alert cycle
    pub fn reset_expiration_alert(&mut self) {
        self.expiration_alert = ExpirationAlertState::NeverAlerted;
    }
}
