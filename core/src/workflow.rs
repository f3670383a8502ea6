//! Request-handling reducer for a single intake.
//!
//! User commands arrive as [`IntakeAction::Command`]. The reducer first loads
//! the stored record, so fields written by other components (the expiration
//! alert bookkeeping in particular) are never overwritten with a stale copy.
//! The loaded record comes back as [`IntakeAction::Loaded`]; the command is
//! validated with the step machine or LCID lifecycle and applied to that
//! record, and an effect persists the result. The outcome is fed back as
//! [`IntakeAction::Persisted`] or [`IntakeAction::PersistFailed`].
//!
//! [`WorkflowState::intake`] only ever holds a record as it was loaded from
//! or stored in the repository. A failed write leaves it untouched, so the
//! same command can be retried.
//!
//! Validation failures never produce effects; they are recorded in
//! [`WorkflowState::last_error`] for the caller to report.

use crate::effect::Effect;
use crate::environment::Clock;
use crate::error::{RepositoryError, ValidationError};
use crate::intake::{IntakeId, IntakeStep, SystemIntake};
use crate::lcid::{self, ConfirmLcid, ExpireLcid, IssueLcid, LcidGenerator, RetireLcid, UpdateLcid};
use crate::ports::IntakeRepository;
use crate::reducer::Reducer;
use crate::step;
use crate::{SmallVec, smallvec};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Environment for the intake workflow
#[derive(Clone)]
pub struct IntakeEnvironment {
    /// Clock for stamping transitions
    pub clock: Arc<dyn Clock>,
    /// Where intakes are loaded from and persisted to
    pub repository: Arc<dyn IntakeRepository>,
    /// Source of new LCID codes
    pub lcid_generator: Arc<dyn LcidGenerator>,
}

impl IntakeEnvironment {
    /// Creates a new intake environment
    pub fn new(
        clock: Arc<dyn Clock>,
        repository: Arc<dyn IntakeRepository>,
        lcid_generator: Arc<dyn LcidGenerator>,
    ) -> Self {
        Self {
            clock,
            repository,
            lcid_generator,
        }
    }
}

/// State managed by the workflow reducer
#[derive(Clone, Debug, PartialEq)]
pub struct WorkflowState {
    /// Last known stored version of the intake
    pub intake: SystemIntake,
    /// Rejection reason of the most recent command, if it was rejected
    pub last_error: Option<ValidationError>,
    /// Most recent load or persist failure
    pub repository_error: Option<RepositoryError>,
}

impl WorkflowState {
    /// Wraps a loaded intake
    #[must_use]
    pub const fn new(intake: SystemIntake) -> Self {
        Self {
            intake,
            last_error: None,
            repository_error: None,
        }
    }
}

/// User commands against one intake
#[derive(Clone, Debug, PartialEq)]
pub enum IntakeCommand {
    /// Move the intake to another review step
    ProgressToStep {
        /// Target step
        target: IntakeStep,
        /// Meeting date for GRT/GRB targets
        meeting_date: Option<DateTime<Utc>>,
    },
    /// Issue a new LCID
    IssueLcid(IssueLcid),
    /// Re-affirm the existing LCID
    ConfirmLcid(ConfirmLcid),
    /// Update the existing LCID
    UpdateLcid(UpdateLcid),
    /// Expire the LCID administratively
    ExpireLcid(ExpireLcid),
    /// Set the LCID retirement date
    RetireLcid(RetireLcid),
    /// Move the LCID retirement date
    ChangeRetirementDate {
        /// New retirement date
        retires_at: DateTime<Utc>,
    },
}

impl IntakeCommand {
    /// Short name used in logs
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ProgressToStep { .. } => "ProgressToStep",
            Self::IssueLcid(_) => "IssueLcid",
            Self::ConfirmLcid(_) => "ConfirmLcid",
            Self::UpdateLcid(_) => "UpdateLcid",
            Self::ExpireLcid(_) => "ExpireLcid",
            Self::RetireLcid(_) => "RetireLcid",
            Self::ChangeRetirementDate { .. } => "ChangeRetirementDate",
        }
    }

    /// Validates the command and applies it to `intake`
    ///
    /// # Errors
    ///
    /// Returns the [`ValidationError`] of the step machine or LCID lifecycle;
    /// `intake` may be partially modified in that case.
    pub fn apply(
        self,
        intake: &mut SystemIntake,
        env: &IntakeEnvironment,
    ) -> Result<(), ValidationError> {
        let now = env.clock.now();
        match self {
            Self::ProgressToStep {
                target,
                meeting_date,
            } => step::apply_transition(intake, target, meeting_date, now),
            Self::IssueLcid(input) => lcid::issue(intake, input, env.lcid_generator.as_ref(), now),
            Self::ConfirmLcid(input) => lcid::confirm(intake, input, now),
            Self::UpdateLcid(input) => lcid::update(intake, input, now),
            Self::ExpireLcid(input) => lcid::expire(intake, input, now),
            Self::RetireLcid(input) => lcid::retire(intake, input, now),
            Self::ChangeRetirementDate { retires_at } => {
                lcid::change_retirement_date(intake, retires_at, now)
            },
        }
    }
}

/// Commands and feedback for the intake workflow
#[derive(Clone, Debug, PartialEq)]
pub enum IntakeAction {
    /// A user command; the stored intake is loaded before it is applied
    Command(IntakeCommand),

    // ========== Feedback ==========
    /// The stored intake was loaded for a pending command
    Loaded {
        /// Stored version of the intake
        intake: Box<SystemIntake>,
        /// Command to apply to it
        command: IntakeCommand,
    },
    /// The stored intake could not be loaded
    LoadFailed {
        /// Why the read failed
        error: RepositoryError,
    },
    /// The repository stored the intake
    Persisted {
        /// Stored version of the intake
        intake: Box<SystemIntake>,
    },
    /// The repository rejected the write
    PersistFailed {
        /// Why the write failed
        error: RepositoryError,
    },
}

impl From<IntakeCommand> for IntakeAction {
    fn from(command: IntakeCommand) -> Self {
        Self::Command(command)
    }
}

/// Reducer implementing the intake workflow
#[derive(Clone, Debug, Default)]
pub struct IntakeReducer;

impl IntakeReducer {
    /// Creates a new intake reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Creates an effect that loads the stored intake for `command`
    fn create_load_effect(
        repository: Arc<dyn IntakeRepository>,
        id: IntakeId,
        command: IntakeCommand,
    ) -> Effect<IntakeAction> {
        Effect::Future(Box::pin(async move {
            match repository.fetch(&id).await {
                Ok(intake) => Some(IntakeAction::Loaded {
                    intake: Box::new(intake),
                    command,
                }),
                Err(error) => Some(IntakeAction::LoadFailed { error }),
            }
        }))
    }

    /// Creates an effect that persists the intake and reports the outcome
    fn create_persist_effect(
        repository: Arc<dyn IntakeRepository>,
        intake: SystemIntake,
    ) -> Effect<IntakeAction> {
        Effect::Future(Box::pin(async move {
            match repository.persist(intake).await {
                Ok(stored) => Some(IntakeAction::Persisted {
                    intake: Box::new(stored),
                }),
                Err(error) => Some(IntakeAction::PersistFailed { error }),
            }
        }))
    }
}

impl Reducer for IntakeReducer {
    type State = WorkflowState;
    type Action = IntakeAction;
    type Environment = IntakeEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            IntakeAction::Command(command) => {
                tracing::debug!(intake_id = %state.intake.id, command = command.name(), "Loading intake");
                smallvec![Self::create_load_effect(
                    Arc::clone(&env.repository),
                    state.intake.id.clone(),
                    command,
                )]
            },

            IntakeAction::Loaded { intake, command } => {
                state.intake = *intake;
                let name = command.name();
                // Work on a copy so a rejected command leaves state untouched
                let mut updated = state.intake.clone();
                if let Err(error) = command.apply(&mut updated, env) {
                    tracing::warn!(intake_id = %state.intake.id, command = name, %error, "Command rejected");
                    state.last_error = Some(error);
                    return smallvec![Effect::None];
                }

                state.last_error = None;
                smallvec![Self::create_persist_effect(
                    Arc::clone(&env.repository),
                    updated,
                )]
            },

            IntakeAction::LoadFailed { error } => {
                tracing::error!(intake_id = %state.intake.id, %error, "Failed to load intake");
                state.repository_error = Some(error);
                smallvec![Effect::None]
            },

            IntakeAction::Persisted { intake } => {
                tracing::debug!(intake_id = %intake.id, "Intake persisted");
                state.intake = *intake;
                state.repository_error = None;
                smallvec![Effect::None]
            },

            IntakeAction::PersistFailed { error } => {
                tracing::error!(intake_id = %state.intake.id, %error, "Failed to persist intake");
                state.repository_error = Some(error);
                smallvec![Effect::None]
            },
        }
    }
}
