//! Collaborator contracts injected into the governance engine.
//!
//! The engine supplies the algorithms; the application supplies the I/O by
//! implementing these traits. Each trait has a single responsibility so tests
//! can swap in in-memory or recording implementations.
//!
//! # Dyn Compatibility
//!
//! Methods return `Pin<Box<dyn Future>>` instead of `async fn` so the traits
//! can be used as `Arc<dyn Trait>`, which is how the scheduler and reducer
//! environment hold them.

use crate::error::{LookupError, NotificationError, RepositoryError};
use crate::intake::{IntakeId, RequesterIdentifier, SystemIntake};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by collaborator traits
pub type PortFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// An email address
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Creates a new `EmailAddress` from a string
    #[must_use]
    pub const fn new(address: String) -> Self {
        Self(address)
    }

    /// Returns the inner string value
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Contact details returned by the user directory
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfo {
    /// Display name
    pub common_name: String,
    /// Primary email
    pub email: EmailAddress,
}

/// Identity lookup.
pub trait UserDirectory: Send + Sync {
    /// Look up contact details for a requester.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::NotFound`] or [`LookupError::InvalidInput`] when
    /// the identifier itself is bad, and [`LookupError::Other`] for anything
    /// else.
    fn fetch_user_info<'a>(
        &'a self,
        requester: &'a RequesterIdentifier,
    ) -> PortFuture<'a, Result<ContactInfo, LookupError>>;
}

/// Read-modify-write access to intakes.
pub trait IntakeRepository: Send + Sync {
    /// Load every intake.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError`] if the backend cannot be read.
    fn fetch_all(&self) -> PortFuture<'_, Result<Vec<SystemIntake>, RepositoryError>>;

    /// Load one intake.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] if no intake has this id.
    fn fetch(&self, id: &IntakeId) -> PortFuture<'_, Result<SystemIntake, RepositoryError>>;

    /// Persist the whole intake record, returning the stored version.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError`] if the write fails or conflicts with a
    /// concurrent writer.
    fn persist(&self, intake: SystemIntake) -> PortFuture<'_, Result<SystemIntake, RepositoryError>>;
}

/// Everything an LCID expiration alert email needs
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpirationAlert {
    /// Who receives the alert
    pub recipients: Vec<EmailAddress>,
    /// Intake the LCID belongs to
    pub intake_id: IntakeId,
    /// Project name
    pub project_name: String,
    /// Requester display name
    pub requester_name: String,
    /// LCID code
    pub lcid: String,
    /// LCID expiration date
    pub expires_at: DateTime<Utc>,
    /// LCID scope
    pub scope: String,
    /// LCID cost baseline
    pub cost_baseline: String,
    /// Decision next steps
    pub next_steps: String,
}

/// Outbound LCID expiration notifications.
pub trait ExpirationAlertSender: Send + Sync {
    /// Send one expiration alert email.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationError`] if the email could not be sent.
    fn send_expiration_alert(
        &self,
        alert: ExpirationAlert,
    ) -> PortFuture<'_, Result<(), NotificationError>>;
}
