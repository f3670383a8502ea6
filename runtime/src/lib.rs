//! # Intake Governance Runtime
//!
//! The imperative shell around the governance core.
//!
//! ## Core Components
//!
//! - **Store** ([`store::Store`]): runs the workflow reducer and executes its
//!   effects, feeding resulting actions back
//! - **Expiration alert scheduler** ([`scheduler::ExpirationAlertScheduler`]):
//!   periodic scan that emails stakeholders as LCIDs approach expiration
//! - **Recipient resolution** ([`recipients`]): turns a requester into alert
//!   recipients, degrading gracefully on bad requester data
//! - **Tickers** ([`ticker`]): timer-backed clock for the scheduler loop
//! - **Configuration** ([`config`]) and **metrics** ([`metrics`])
//!
//! ## Example
//!
//! ```ignore
//! use intake_governance_runtime::config::AlertSchedulerConfig;
//! use intake_governance_runtime::scheduler::ExpirationAlertScheduler;
//! use intake_governance_runtime::ticker::IntervalTicker;
//!
//! let config = AlertSchedulerConfig::from_env()?;
//! let scheduler = ExpirationAlertScheduler::new(repository, directory, sender, config.clone());
//! let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//!
//! tokio::spawn(async move {
//!     scheduler.run(IntervalTicker::new(config.tick_interval), shutdown_rx).await;
//! });
//! ```

pub mod config;
pub mod metrics;
pub mod recipients;
pub mod scheduler;
pub mod store;
pub mod ticker;

/// Error types for the runtime
pub mod error {
    use intake_governance_core::error::RepositoryError;
    use intake_governance_core::intake::IntakeId;
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug)]
    pub enum StoreError {
        /// A task join error occurred during parallel effect execution
        ///
        /// This typically means a spawned task panicked.
        #[error("Task failed during parallel execution: {0}")]
        TaskJoinError(#[from] tokio::task::JoinError),

        /// Store is shutting down and not accepting new actions
        #[error("Store is shutting down")]
        ShutdownInProgress,
    }

    /// Errors that abort a whole expiration alert pass
    ///
    /// Per-intake failures (lookup, send) are logged and skipped instead.
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum SchedulerError {
        /// The intake list could not be loaded; no work was attempted
        #[error("Failed to fetch intakes: {0}")]
        FetchFailed(#[source] RepositoryError),

        /// An intake could not be saved after its alert state changed
        ///
        /// If an email went out, it was sent but not recorded.
        #[error("Failed to persist intake {intake_id}: {source}")]
        PersistFailed {
            /// Intake that could not be saved
            intake_id: IntakeId,
            /// Underlying repository error
            #[source]
            source: RepositoryError,
        },
    }
}

pub use error::{SchedulerError, StoreError};
pub use scheduler::{ExpirationAlertScheduler, PassReport};
pub use store::Store;
