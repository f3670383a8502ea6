//! In-memory collaborator implementations
//!
//! Fast, deterministic stand-ins for the engine's ports:
//! - [`InMemoryIntakeRepository`]: `Vec`-backed intake storage with failure injection
//! - [`MockUserDirectory`]: canned directory lookups
//! - [`RecordingAlertSender`]: captures sent alerts, optionally failing

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Lock poisoning only follows a panicking test

use intake_governance_core::error::{LookupError, NotificationError, RepositoryError};
use intake_governance_core::intake::{IntakeId, RequesterIdentifier, SystemIntake};
use intake_governance_core::ports::{
    ContactInfo, EmailAddress, ExpirationAlert, ExpirationAlertSender, IntakeRepository,
    PortFuture, UserDirectory,
};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// In-memory intake repository.
///
/// Intakes are returned by `fetch_all` in insertion order.
///
/// # Example
///
/// ```
/// use intake_governance_testing::{InMemoryIntakeRepository, IntakeBuilder};
/// use intake_governance_core::ports::IntakeRepository;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let repository = InMemoryIntakeRepository::new();
/// repository.persist(IntakeBuilder::new("intake-1").build()).await?;
///
/// assert_eq!(repository.fetch_all().await?.len(), 1);
/// assert_eq!(repository.persist_count(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryIntakeRepository {
    intakes: Arc<RwLock<Vec<SystemIntake>>>,
    fetch_error: Arc<RwLock<Option<RepositoryError>>>,
    persist_error: Arc<RwLock<Option<RepositoryError>>>,
    persist_count: Arc<RwLock<usize>>,
}

impl InMemoryIntakeRepository {
    /// Create an empty repository
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository seeded with intakes
    #[must_use]
    pub fn with_intakes(intakes: Vec<SystemIntake>) -> Self {
        let repository = Self::new();
        *repository.intakes.write().unwrap() = intakes;
        repository
    }

    /// Current stored version of an intake
    #[must_use]
    pub fn get(&self, id: &str) -> Option<SystemIntake> {
        self.intakes
            .read()
            .unwrap()
            .iter()
            .find(|intake| intake.id.as_str() == id)
            .cloned()
    }

    /// Number of successful `persist` calls
    ///
    /// Seeding through [`InMemoryIntakeRepository::with_intakes`] does not count.
    #[must_use]
    pub fn persist_count(&self) -> usize {
        *self.persist_count.read().unwrap()
    }

    /// Make every `fetch_all` and `fetch` fail with `error` (or succeed again with `None`)
    pub fn set_fetch_error(&self, error: Option<RepositoryError>) {
        *self.fetch_error.write().unwrap() = error;
    }

    /// Make every `persist` fail with `error` (or succeed again with `None`)
    pub fn set_persist_error(&self, error: Option<RepositoryError>) {
        *self.persist_error.write().unwrap() = error;
    }
}

impl IntakeRepository for InMemoryIntakeRepository {
    fn fetch_all(&self) -> PortFuture<'_, Result<Vec<SystemIntake>, RepositoryError>> {
        Box::pin(async move {
            if let Some(error) = self.fetch_error.read().unwrap().clone() {
                return Err(error);
            }
            Ok(self.intakes.read().unwrap().clone())
        })
    }

    fn fetch(&self, id: &IntakeId) -> PortFuture<'_, Result<SystemIntake, RepositoryError>> {
        let id = id.clone();
        Box::pin(async move {
            if let Some(error) = self.fetch_error.read().unwrap().clone() {
                return Err(error);
            }
            self.get(id.as_str())
                .ok_or_else(|| RepositoryError::NotFound(id.to_string()))
        })
    }

    fn persist(&self, intake: SystemIntake) -> PortFuture<'_, Result<SystemIntake, RepositoryError>> {
        Box::pin(async move {
            if let Some(error) = self.persist_error.read().unwrap().clone() {
                return Err(error);
            }

            let mut intakes = self.intakes.write().unwrap();
            match intakes.iter_mut().find(|stored| stored.id == intake.id) {
                Some(stored) => *stored = intake.clone(),
                None => intakes.push(intake.clone()),
            }
            *self.persist_count.write().unwrap() += 1;
            Ok(intake)
        })
    }
}

/// Canned user directory.
///
/// Unknown requesters resolve to [`LookupError::NotFound`].
#[derive(Clone, Debug, Default)]
pub struct MockUserDirectory {
    entries: Arc<RwLock<HashMap<RequesterIdentifier, Result<ContactInfo, LookupError>>>>,
    lookups: Arc<RwLock<usize>>,
}

impl MockUserDirectory {
    /// Create an empty directory
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a requester's contact details
    #[must_use]
    pub fn with_contact(self, requester: &str, common_name: &str, email: &str) -> Self {
        self.entries.write().unwrap().insert(
            RequesterIdentifier::new(requester.to_string()),
            Ok(ContactInfo {
                common_name: common_name.to_string(),
                email: EmailAddress::new(email.to_string()),
            }),
        );
        self
    }

    /// Make lookups for a requester fail with `error`
    #[must_use]
    pub fn with_error(self, requester: &str, error: LookupError) -> Self {
        self.entries
            .write()
            .unwrap()
            .insert(RequesterIdentifier::new(requester.to_string()), Err(error));
        self
    }

    /// Number of lookups performed
    #[must_use]
    pub fn lookup_count(&self) -> usize {
        *self.lookups.read().unwrap()
    }
}

impl UserDirectory for MockUserDirectory {
    fn fetch_user_info<'a>(
        &'a self,
        requester: &'a RequesterIdentifier,
    ) -> PortFuture<'a, Result<ContactInfo, LookupError>> {
        Box::pin(async move {
            *self.lookups.write().unwrap() += 1;
            self.entries
                .read()
                .unwrap()
                .get(requester)
                .cloned()
                .unwrap_or_else(|| Err(LookupError::NotFound(requester.to_string())))
        })
    }
}

/// Alert sender that records every alert it is asked to send.
#[derive(Clone, Debug, Default)]
pub struct RecordingAlertSender {
    sent: Arc<RwLock<Vec<ExpirationAlert>>>,
    failure: Arc<RwLock<Option<NotificationError>>>,
    attempts: Arc<RwLock<usize>>,
}

impl RecordingAlertSender {
    /// Create a sender that always succeeds
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every send fail with `error` (or succeed again with `None`)
    pub fn set_failure(&self, error: Option<NotificationError>) {
        *self.failure.write().unwrap() = error;
    }

    /// Alerts sent successfully, in order
    #[must_use]
    pub fn sent(&self) -> Vec<ExpirationAlert> {
        self.sent.read().unwrap().clone()
    }

    /// Number of send attempts, including failed ones
    #[must_use]
    pub fn attempts(&self) -> usize {
        *self.attempts.read().unwrap()
    }
}

impl ExpirationAlertSender for RecordingAlertSender {
    fn send_expiration_alert(
        &self,
        alert: ExpirationAlert,
    ) -> PortFuture<'_, Result<(), NotificationError>> {
        Box::pin(async move {
            *self.attempts.write().unwrap() += 1;
            if let Some(error) = self.failure.read().unwrap().clone() {
                return Err(error);
            }
            self.sent.write().unwrap().push(alert);
            Ok(())
        })
    }
}
