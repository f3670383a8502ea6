//! Request snapshot for a governance intake.
//!
//! A [`SystemIntake`] holds the lifecycle-relevant fields of one governance
//! request: its review step, scheduled meeting dates, the issued Lifecycle ID
//! (LCID) and the expiration-alert bookkeeping owned by the alert scheduler.
//!
//! The snapshot is plain owned data. Callers load it, hand it to the step
//! machine, the LCID lifecycle or the scheduler, and persist the whole record
//! back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a system intake
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IntakeId(String);

impl IntakeId {
    /// Creates a new `IntakeId` from a string
    #[must_use]
    pub const fn new(id: String) -> Self {
        Self(id)
    }

    /// Returns the inner string value
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IntakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque identifier of the person who submitted the intake
///
/// Resolved to contact details through a
/// [`UserDirectory`](crate::ports::UserDirectory).
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequesterIdentifier(String);

impl RequesterIdentifier {
    /// Creates a new `RequesterIdentifier` from a string
    #[must_use]
    pub const fn new(id: String) -> Self {
        Self(id)
    }

    /// Returns the inner string value
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if there is no one to resolve
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for RequesterIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether the intake is still active
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntakeState {
    /// Request is active
    Open,
    /// Request is finished; no further step transitions
    Closed,
}

/// Review stage of an intake
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntakeStep {
    /// Requester is filling out the initial request form
    InitialForm,
    /// Draft business case is being prepared
    #[serde(rename = "DRAFT_BIZ_CASE")]
    DraftBusinessCase,
    /// Governance Review Team meeting
    #[serde(rename = "GRT_MEETING")]
    GrtMeeting,
    /// Final business case is being prepared
    #[serde(rename = "FINAL_BIZ_CASE")]
    FinalBusinessCase,
    /// Governance Review Board meeting
    #[serde(rename = "GRB_MEETING")]
    GrbMeeting,
    /// Decision has been recorded
    Decision,
}

impl IntakeStep {
    /// Steps a request may be explicitly progressed to
    pub const PROGRESSION_TARGETS: [Self; 4] = [
        Self::DraftBusinessCase,
        Self::GrtMeeting,
        Self::FinalBusinessCase,
        Self::GrbMeeting,
    ];

    /// Wire name of the step
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InitialForm => "INITIAL_FORM",
            Self::DraftBusinessCase => "DRAFT_BIZ_CASE",
            Self::GrtMeeting => "GRT_MEETING",
            Self::FinalBusinessCase => "FINAL_BIZ_CASE",
            Self::GrbMeeting => "GRB_MEETING",
            Self::Decision => "DECISION",
        }
    }

    /// Returns `true` if this step is a valid target for progression
    #[must_use]
    pub const fn is_progression_target(self) -> bool {
        matches!(
            self,
            Self::DraftBusinessCase | Self::GrtMeeting | Self::FinalBusinessCase | Self::GrbMeeting
        )
    }
}

impl fmt::Display for IntakeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress of the initial request form
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestFormState {
    /// Form has not been opened
    NotStarted,
    /// Form is partially filled out
    InProgress,
    /// Form has been submitted for review
    Submitted,
}

/// Overall governance outcome of an intake
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GovernanceStatus {
    /// No decision yet
    Pending,
    /// An LCID was issued
    LcidIssued,
    /// Request was not approved
    NotApproved,
    /// Request does not need governance review
    NoGovernanceNeeded,
}

/// Status of an issued LCID at a point in time
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LcidStatus {
    /// LCID is active
    Issued,
    /// Expiration date has passed
    Expired,
    /// Retirement date has passed
    Retired,
}

impl fmt::Display for LcidStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Issued => write!(f, "issued"),
            Self::Expired => write!(f, "expired"),
            Self::Retired => write!(f, "retired"),
        }
    }
}

/// Expiration-alert bookkeeping for the current expiration cycle
///
/// Only the alert scheduler moves this forward. LCID operations may reset it
/// to [`ExpirationAlertState::NeverAlerted`] when the expiration date changes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "sentAt", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExpirationAlertState {
    /// No alert has been sent for this expiration cycle
    #[default]
    NeverAlerted,
    /// First alert was sent at the given time; a follow-up may still be due
    AlertedAt(DateTime<Utc>),
    /// Follow-up has been sent; nothing more until the cycle resets
    Suppressed,
}

/// Snapshot of a governance intake's lifecycle fields
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemIntake {
    /// Intake identifier
    pub id: IntakeId,
    /// Open or closed
    pub state: IntakeState,
    /// Current review step
    pub step: IntakeStep,
    /// Initial form progress
    pub request_form_state: RequestFormState,
    /// Scheduled GRT meeting
    pub grt_date: Option<DateTime<Utc>>,
    /// Scheduled GRB meeting
    pub grb_date: Option<DateTime<Utc>>,
    /// Who submitted the request
    pub requester: RequesterIdentifier,
    /// Requester display name recorded on the intake
    pub requester_name: String,
    /// Project the request is for
    pub project_name: String,
    /// Issued LCID code
    pub lifecycle_id: Option<String>,
    /// LCID expiration date
    pub lifecycle_expires_at: Option<DateTime<Utc>>,
    /// LCID retirement date
    pub lifecycle_retires_at: Option<DateTime<Utc>>,
    /// Scope covered by the LCID
    pub lifecycle_scope: Option<String>,
    /// Cost baseline attached to the LCID
    pub lifecycle_cost_baseline: Option<String>,
    /// Next steps communicated with the decision
    pub decision_next_steps: Option<String>,
    /// Reason given when the LCID was expired by an administrator
    pub lifecycle_expiration_reason: Option<String>,
    /// Reason given when the LCID was retired
    pub lifecycle_retirement_reason: Option<String>,
    /// Alert bookkeeping, owned by the expiration alert scheduler
    pub expiration_alert: ExpirationAlertState,
    /// Overall governance outcome
    pub governance_status: GovernanceStatus,
    /// Last time a transition or LCID operation touched this intake
    pub updated_at: Option<DateTime<Utc>>,
}

impl SystemIntake {
    /// Creates a fresh, open intake at the initial form
    #[must_use]
    pub fn new(id: IntakeId, requester: RequesterIdentifier) -> Self {
        Self {
            id,
            state: IntakeState::Open,
            step: IntakeStep::InitialForm,
            request_form_state: RequestFormState::NotStarted,
            grt_date: None,
            grb_date: None,
            requester,
            requester_name: String::new(),
            project_name: String::new(),
            lifecycle_id: None,
            lifecycle_expires_at: None,
            lifecycle_retires_at: None,
            lifecycle_scope: None,
            lifecycle_cost_baseline: None,
            decision_next_steps: None,
            lifecycle_expiration_reason: None,
            lifecycle_retirement_reason: None,
            expiration_alert: ExpirationAlertState::NeverAlerted,
            governance_status: GovernanceStatus::Pending,
            updated_at: None,
        }
    }

    /// Returns `true` if the intake is closed
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        matches!(self.state, IntakeState::Closed)
    }

    /// Returns `true` if an LCID has been issued
    #[must_use]
    pub const fn has_lcid(&self) -> bool {
        self.lifecycle_id.is_some()
    }

    /// Status of the LCID at `now`, or `None` if no LCID has been issued
    ///
    /// Retirement takes precedence over expiration.
    #[must_use]
    pub fn lcid_status(&self, now: DateTime<Utc>) -> Option<LcidStatus> {
        self.lifecycle_id.as_ref()?;

        if self.lifecycle_retires_at.is_some_and(|at| at <= now) {
            return Some(LcidStatus::Retired);
        }
        if self.lifecycle_expires_at.is_some_and(|at| at <= now) {
            return Some(LcidStatus::Expired);
        }
        Some(LcidStatus::Issued)
    }

    /// Legacy single-timestamp view of the alert bookkeeping
    ///
    /// `Suppressed` is reported as the expiration date itself.
    #[must_use]
    pub fn alert_sent_at(&self) -> Option<DateTime<Utc>> {
        match self.expiration_alert {
            ExpirationAlertState::NeverAlerted => None,
            ExpirationAlertState::AlertedAt(at) => Some(at),
            ExpirationAlertState::Suppressed => self.lifecycle_expires_at,
        }
    }

    /// Sets the LCID expiration date, restarting the alert cycle if it changed
    pub(crate) fn set_lifecycle_expires_at(&mut self, expires_at: DateTime<Utc>) {
        if self.lifecycle_expires_at != Some(expires_at) {
            self.lifecycle_expires_at = Some(expires_at);
            self.expiration_alert = ExpirationAlertState::NeverAlerted;
        }
    }
}
