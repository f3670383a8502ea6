//! Intake fixtures.

use chrono::{DateTime, Utc};
use intake_governance_core::intake::{
    ExpirationAlertState, GovernanceStatus, IntakeId, IntakeState, IntakeStep, RequestFormState,
    RequesterIdentifier, SystemIntake,
};

/// Builder for [`SystemIntake`] test fixtures
///
/// Starts from an open intake at the initial form with a submitted request
/// form and requester `ABCD`.
///
/// # Example
///
/// ```
/// use intake_governance_testing::IntakeBuilder;
/// use intake_governance_core::intake::IntakeStep;
///
/// let intake = IntakeBuilder::new("intake-1").step(IntakeStep::GrtMeeting).build();
/// assert_eq!(intake.step, IntakeStep::GrtMeeting);
/// ```
#[derive(Clone, Debug)]
pub struct IntakeBuilder {
    intake: SystemIntake,
}

impl IntakeBuilder {
    /// Start a fixture with the given intake id
    #[must_use]
    pub fn new(id: &str) -> Self {
        let mut intake = SystemIntake::new(
            IntakeId::new(id.to_string()),
            RequesterIdentifier::new("ABCD".to_string()),
        );
        intake.request_form_state = RequestFormState::Submitted;
        intake.requester_name = "Alex Requester".to_string();
        intake.project_name = format!("Project {id}");
        Self { intake }
    }

    /// Set the requester identifier
    #[must_use]
    pub fn requester(mut self, requester: &str) -> Self {
        self.intake.requester = RequesterIdentifier::new(requester.to_string());
        self
    }

    /// Set the current step
    #[must_use]
    pub const fn step(mut self, step: IntakeStep) -> Self {
        self.intake.step = step;
        self
    }

    /// Set the request form progress
    #[must_use]
    pub const fn form_state(mut self, form_state: RequestFormState) -> Self {
        self.intake.request_form_state = form_state;
        self
    }

    /// Close the intake
    #[must_use]
    pub const fn closed(mut self) -> Self {
        self.intake.state = IntakeState::Closed;
        self
    }

    /// Set the GRT meeting date
    #[must_use]
    pub const fn grt_date(mut self, date: DateTime<Utc>) -> Self {
        self.intake.grt_date = Some(date);
        self
    }

    /// Set the GRB meeting date
    #[must_use]
    pub const fn grb_date(mut self, date: DateTime<Utc>) -> Self {
        self.intake.grb_date = Some(date);
        self
    }

    /// Give the intake an issued LCID, as if a decision had been made
    #[must_use]
    pub fn with_lcid(mut self, code: &str, expires_at: DateTime<Utc>) -> Self {
        self.intake.lifecycle_id = Some(code.to_string());
        self.intake.lifecycle_expires_at = Some(expires_at);
        self.intake.lifecycle_scope = Some("Full project scope".to_string());
        self.intake.lifecycle_cost_baseline = Some("$1.2M".to_string());
        self.intake.decision_next_steps = Some("Check back before expiration".to_string());
        self.intake.governance_status = GovernanceStatus::LcidIssued;
        self.intake.step = IntakeStep::Decision;
        self.intake.state = IntakeState::Closed;
        self
    }

    /// Set the LCID retirement date
    #[must_use]
    pub const fn retires_at(mut self, date: DateTime<Utc>) -> Self {
        self.intake.lifecycle_retires_at = Some(date);
        self
    }

    /// Set the governance outcome
    #[must_use]
    pub const fn governance_status(mut self, status: GovernanceStatus) -> Self {
        self.intake.governance_status = status;
        self
    }

    /// Set the expiration alert bookkeeping
    #[must_use]
    pub const fn expiration_alert(mut self, alert: ExpirationAlertState) -> Self {
        self.intake.expiration_alert = alert;
        self
    }

    /// Finish the fixture
    #[must_use]
    pub fn build(self) -> SystemIntake {
        self.intake
    }
}
