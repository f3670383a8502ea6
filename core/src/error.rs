//! Error types for governance operations.
//!
//! Errors fall into three groups:
//!
//! - [`ValidationError`]: caller mistakes from the step machine and LCID
//!   lifecycle. Never retried, never logged as system errors.
//! - [`LookupError`]: identity lookup failures, classified into expected and
//!   unexpected kinds.
//! - [`RepositoryError`] / [`NotificationError`]: infrastructure failures from
//!   injected collaborators.

use thiserror::Error;

/// Rejection of a step transition or LCID operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The action is not allowed in the intake's current state.
    #[error("Invalid action: {reason}")]
    InvalidAction {
        /// Why the action was rejected
        reason: String,
    },

    /// A value is outside the set of accepted values.
    #[error("Invalid value for {field}: {value}")]
    InvalidEnum {
        /// Name of the offending field
        field: &'static str,
        /// The rejected value
        value: String,
    },

    /// An LCID operation was attempted out of precondition order.
    #[error("Invalid state: {precondition}")]
    InvalidState {
        /// The precondition that does not hold
        precondition: String,
    },
}

impl ValidationError {
    pub(crate) fn invalid_action(reason: impl Into<String>) -> Self {
        Self::InvalidAction {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_state(precondition: impl Into<String>) -> Self {
        Self::InvalidState {
            precondition: precondition.into(),
        }
    }
}

/// Failure to resolve a requester through the user directory.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// No user exists for the identifier.
    #[error("User not found: {0}")]
    NotFound(String),

    /// The identifier or request parameters are malformed.
    #[error("Invalid lookup input: {0}")]
    InvalidInput(String),

    /// Any other failure (network, upstream outage, ...).
    #[error("User lookup failed: {0}")]
    Other(String),
}

impl LookupError {
    /// Returns `true` if the error means the requester record itself is bad.
    ///
    /// Expected errors degrade to notifying only the governance mailbox;
    /// anything else aborts processing of the current intake.
    ///
    /// # Examples
    ///
    /// ```
    /// # use intake_governance_core::error::LookupError;
    /// assert!(LookupError::NotFound("ABCD".into()).is_expected());
    /// assert!(!LookupError::Other("timeout".into()).is_expected());
    /// ```
    #[must_use]
    pub const fn is_expected(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::InvalidInput(_))
    }
}

/// Failure reading or writing intakes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// The intake does not exist.
    #[error("Intake not found: {0}")]
    NotFound(String),

    /// The write lost a concurrent-modification check.
    #[error("Concurrent modification of intake {0}")]
    Conflict(String),

    /// Backend failure.
    #[error("Database error: {0}")]
    Database(String),
}

/// Failure delivering a notification.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotificationError {
    /// The message could not be delivered.
    #[error("Failed to send email: {0}")]
    DeliveryFailed(String),

    /// The message has no recipients.
    #[error("No recipients for notification")]
    NoRecipients,
}
