//! Lifecycle ID (LCID) operations.
//!
//! Each operation checks its precondition, mutates the LCID fields of a
//! [`SystemIntake`] in place and stamps `updated_at`. Any operation that
//! changes the expiration date restarts the expiration-alert cycle, so the
//! scheduler's hysteresis runs against the new date.
//!
//! | Operation | Precondition |
//! |---|---|
//! | [`issue`] | no LCID yet, intake open, request form submitted |
//! | [`confirm`] | LCID present |
//! | [`update`] | LCID present and still issued (not retired or expired) |
//! | [`expire`] | LCID present |
//! | [`retire`] | LCID present, no retirement date yet |
//! | [`change_retirement_date`] | retirement date already set |

use crate::error::ValidationError;
use crate::intake::{
    GovernanceStatus, IntakeState, IntakeStep, LcidStatus, RequestFormState, SystemIntake,
};
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Generates new LCID codes.
pub trait LcidGenerator: Send + Sync {
    /// Produce a fresh LCID code for an LCID issued at `now`
    fn generate(&self, now: DateTime<Utc>) -> String;
}

/// Generates codes of the form `YYDDD` followed by an alphabetic suffix.
///
/// `YY` is the two-digit year and `DDD` the zero-padded day of the year. The
/// suffix counts LCIDs issued on the same day: `A`, `B`, ... `Z`, `AA`, `AB`, ...
///
/// # Example
///
/// ```
/// use intake_governance_core::lcid::{DatedLcidGenerator, LcidGenerator};
/// use chrono::{TimeZone, Utc};
///
/// let generator = DatedLcidGenerator::new();
/// let now = Utc.with_ymd_and_hms(2025, 2, 1, 9, 0, 0).unwrap();
/// assert_eq!(generator.generate(now), "25032A");
/// assert_eq!(generator.generate(now), "25032B");
/// ```
#[derive(Debug, Default)]
pub struct DatedLcidGenerator {
    /// Day prefix and number of codes issued for it
    issued: Mutex<Option<(String, u32)>>,
}

impl DatedLcidGenerator {
    /// Creates a generator with no codes issued yet
    #[must_use]
    pub const fn new() -> Self {
        Self {
            issued: Mutex::new(None),
        }
    }
}

impl LcidGenerator for DatedLcidGenerator {
    fn generate(&self, now: DateTime<Utc>) -> String {
        let prefix = format!("{:02}{:03}", now.year().rem_euclid(100), now.ordinal());

        let mut issued = self
            .issued
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let sequence = match issued.as_mut() {
            Some((day, count)) if *day == prefix => {
                *count += 1;
                *count
            },
            _ => {
                *issued = Some((prefix.clone(), 0));
                0
            },
        };

        format!("{prefix}{}", alphabetic_suffix(sequence))
    }
}

/// `0 -> A`, `25 -> Z`, `26 -> AA`, ...
fn alphabetic_suffix(mut n: u32) -> String {
    let mut letters = Vec::new();
    loop {
        // n % 26 < 26, so the cast cannot truncate
        #[allow(clippy::cast_possible_truncation)]
        letters.push(char::from(b'A' + (n % 26) as u8));
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    letters.iter().rev().collect()
}

/// Input for [`issue`]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueLcid {
    /// Expiration date of the new LCID
    pub expires_at: DateTime<Utc>,
    /// Scope covered by the LCID
    pub scope: Option<String>,
    /// Cost baseline
    pub cost_baseline: Option<String>,
    /// Next steps communicated to the requester
    pub next_steps: Option<String>,
}

/// Input for [`confirm`]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmLcid {
    /// New expiration date, if it changes
    pub expires_at: Option<DateTime<Utc>>,
    /// Replacement scope
    pub scope: Option<String>,
    /// Replacement cost baseline
    pub cost_baseline: Option<String>,
    /// Replacement next steps
    pub next_steps: Option<String>,
}

/// Input for [`update`]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLcid {
    /// New expiration date
    pub expires_at: Option<DateTime<Utc>>,
    /// Replacement scope
    pub scope: Option<String>,
    /// Replacement cost baseline
    pub cost_baseline: Option<String>,
    /// Replacement next steps
    pub next_steps: Option<String>,
}

/// Input for [`expire`]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpireLcid {
    /// Why the LCID was expired
    pub reason: String,
    /// Replacement next steps
    pub next_steps: Option<String>,
}

/// Input for [`retire`]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetireLcid {
    /// When the LCID retires; may be before or after the expiration date
    pub retires_at: DateTime<Utc>,
    /// Why the LCID is being retired
    pub reason: Option<String>,
}

/// Issues a new LCID for `intake`.
///
/// Issuing records the decision: the intake moves to
/// [`IntakeStep::Decision`], closes, and its governance status becomes
/// [`GovernanceStatus::LcidIssued`].
///
/// # Errors
///
/// Returns [`ValidationError::InvalidState`] if the intake already has an
/// LCID, is closed, or its request form has not been submitted.
pub fn issue(
    intake: &mut SystemIntake,
    input: IssueLcid,
    generator: &dyn LcidGenerator,
    now: DateTime<Utc>,
) -> Result<(), ValidationError> {
    if intake.has_lcid() {
        return Err(ValidationError::invalid_state("LCID already issued"));
    }
    if intake.is_closed() {
        return Err(ValidationError::invalid_state("intake must be open to issue an LCID"));
    }
    if intake.request_form_state != RequestFormState::Submitted {
        return Err(ValidationError::invalid_state(
            "request form must be submitted to issue an LCID",
        ));
    }

    let code = generator.generate(now);
    tracing::info!(intake_id = %intake.id, lcid = %code, expires_at = %input.expires_at, "Issuing LCID");

    intake.lifecycle_id = Some(code);
    intake.set_lifecycle_expires_at(input.expires_at);
    intake.lifecycle_retires_at = None;
    intake.lifecycle_retirement_reason = None;
    intake.lifecycle_expiration_reason = None;
    intake.lifecycle_scope = input.scope;
    intake.lifecycle_cost_baseline = input.cost_baseline;
    intake.decision_next_steps = input.next_steps;
    intake.step = IntakeStep::Decision;
    intake.state = IntakeState::Closed;
    intake.governance_status = GovernanceStatus::LcidIssued;
    intake.updated_at = Some(now);
    Ok(())
}

/// Re-affirms an existing LCID without changing its code.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidState`] if no LCID has been issued.
pub fn confirm(
    intake: &mut SystemIntake,
    input: ConfirmLcid,
    now: DateTime<Utc>,
) -> Result<(), ValidationError> {
    require_lcid(intake, "confirm")?;

    if let Some(expires_at) = input.expires_at {
        intake.set_lifecycle_expires_at(expires_at);
    }
    apply_descriptions(intake, input.scope, input.cost_baseline, input.next_steps);
    intake.governance_status = GovernanceStatus::LcidIssued;
    intake.updated_at = Some(now);
    Ok(())
}

/// Updates the expiration date or descriptive fields of an active LCID.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidState`] if no LCID has been issued or the
/// LCID is retired or expired at `now`.
pub fn update(
    intake: &mut SystemIntake,
    input: UpdateLcid,
    now: DateTime<Utc>,
) -> Result<(), ValidationError> {
    require_lcid(intake, "update")?;
    if let Some(status @ (LcidStatus::Expired | LcidStatus::Retired)) = intake.lcid_status(now) {
        return Err(ValidationError::invalid_state(format!(
            "cannot update an LCID that is {status}"
        )));
    }

    if let Some(expires_at) = input.expires_at {
        intake.set_lifecycle_expires_at(expires_at);
    }
    apply_descriptions(intake, input.scope, input.cost_baseline, input.next_steps);
    intake.updated_at = Some(now);
    Ok(())
}

/// Expires an LCID administratively, effective `now`.
///
/// This is independent of the automatic expiration alerts.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidState`] if no LCID has been issued.
pub fn expire(
    intake: &mut SystemIntake,
    input: ExpireLcid,
    now: DateTime<Utc>,
) -> Result<(), ValidationError> {
    require_lcid(intake, "expire")?;

    tracing::info!(intake_id = %intake.id, reason = %input.reason, "Expiring LCID");
    intake.set_lifecycle_expires_at(now);
    intake.lifecycle_expiration_reason = Some(input.reason);
    if input.next_steps.is_some() {
        intake.decision_next_steps = input.next_steps;
    }
    intake.updated_at = Some(now);
    Ok(())
}

/// Sets the retirement date of an LCID.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidState`] if no LCID has been issued or a
/// retirement date is already set.
pub fn retire(
    intake: &mut SystemIntake,
    input: RetireLcid,
    now: DateTime<Utc>,
) -> Result<(), ValidationError> {
    require_lcid(intake, "retire")?;
    if intake.lifecycle_retires_at.is_some() {
        return Err(ValidationError::invalid_state("LCID already has a retirement date"));
    }

    intake.lifecycle_retires_at = Some(input.retires_at);
    intake.lifecycle_retirement_reason = input.reason;
    intake.updated_at = Some(now);
    Ok(())
}

/// Moves the retirement date of an already retiring LCID.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidState`] if no retirement date is set.
pub fn change_retirement_date(
    intake: &mut SystemIntake,
    retires_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<(), ValidationError> {
    if intake.lifecycle_retires_at.is_none() {
        return Err(ValidationError::invalid_state(
            "LCID has no retirement date to change",
        ));
    }

    intake.lifecycle_retires_at = Some(retires_at);
    intake.updated_at = Some(now);
    Ok(())
}

fn require_lcid(intake: &SystemIntake, operation: &str) -> Result<(), ValidationError> {
    if intake.has_lcid() {
        Ok(())
    } else {
        Err(ValidationError::invalid_state(format!(
            "cannot {operation} an LCID before one is issued"
        )))
    }
}

fn apply_descriptions(
    intake: &mut SystemIntake,
    scope: Option<String>,
    cost_baseline: Option<String>,
    next_steps: Option<String>,
) {
    if scope.is_some() {
        intake.lifecycle_scope = scope;
    }
    if cost_baseline.is_some() {
        intake.lifecycle_cost_baseline = cost_baseline;
    }
    if next_steps.is_some() {
        intake.decision_next_steps = next_steps;
    }
}
