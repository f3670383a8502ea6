//! # Intake Governance Core
//!
//! Core types and algorithms for tracking a system intake through IT
//! governance review and managing its Lifecycle ID (LCID).
//!
//! ## Components
//!
//! - **Request snapshot** ([`intake`]): the lifecycle fields of one intake
//! - **Step state machine** ([`step`]): validates and applies step transitions,
//!   including GRT/GRB meeting-date handling
//! - **LCID lifecycle** ([`lcid`]): issue, confirm, update, expire, retire and
//!   change the retirement date of an LCID
//! - **Expiration policy** ([`expiration`]): pure decision function behind the
//!   expiration alert scheduler
//! - **Workflow reducer** ([`workflow`]): request-handling commands expressed
//!   as a [`reducer::Reducer`]
//!
//! ## Architecture Principles
//!
//! - Functional core, imperative shell: everything here is synchronous and
//!   free of I/O; collaborators are injected through [`ports`]
//! - Time is always passed in explicitly or read from an injected
//!   [`environment::Clock`]
//!
//! ## Example
//!
//! ```
//! use intake_governance_core::intake::{IntakeId, IntakeStep, RequestFormState, RequesterIdentifier, SystemIntake};
//! use intake_governance_core::step;
//! use chrono::Utc;
//!
//! let mut intake = SystemIntake::new(
//!     IntakeId::new("intake-1".to_string()),
//!     RequesterIdentifier::new("ABCD".to_string()),
//! );
//! intake.request_form_state = RequestFormState::Submitted;
//!
//! step::apply_transition(&mut intake, IntakeStep::GrtMeeting, None, Utc::now())?;
//! assert_eq!(intake.step, IntakeStep::GrtMeeting);
//! # Ok::<(), intake_governance_core::error::ValidationError>(())
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};
pub use smallvec::{SmallVec, smallvec};

pub mod error;
pub mod expiration;
pub mod intake;
pub mod lcid;
pub mod ports;
pub mod step;
pub mod workflow;

/// Reducer module - The core trait for request-handling logic
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`
pub mod reducer {
    use super::SmallVec;
    use super::effect::Effect;

    /// The Reducer trait
    ///
    /// # Type Parameters
    ///
    /// - `State`: The domain state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// 1. Validates the action
        /// 2. Updates state in place
        /// 3. Returns effect descriptions to be executed
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect module - Side effect descriptions
///
/// Effects describe side effects to be performed by the runtime.
/// They are values (not execution) and are composable.
pub mod effect {
    use std::future::Future;
    use std::pin::Pin;

    /// Effect type - describes a side effect to be executed
    ///
    /// Effects are NOT executed immediately. They are descriptions of what should happen,
    /// returned from reducers and executed by the Store runtime.
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Run effects in parallel
        Parallel(Vec<Effect<Action>>),

        /// Run effects sequentially
        Sequential(Vec<Effect<Action>>),

        /// Arbitrary async computation
        ///
        /// Returns `Option<Action>` - if Some, the action is fed back into the reducer
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),
    }

    // Manual Debug implementation since Future doesn't implement Debug
    impl<Action> std::fmt::Debug for Effect<Action>
    where
        Action: std::fmt::Debug,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Parallel(effects) => {
                    f.debug_tuple("Effect::Parallel").field(effects).finish()
                },
                Effect::Sequential(effects) => {
                    f.debug_tuple("Effect::Sequential").field(effects).finish()
                },
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Combine effects to run in parallel
        #[must_use]
        pub const fn merge(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Parallel(effects)
        }

        /// Chain effects to run sequentially
        #[must_use]
        pub const fn chain(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Sequential(effects)
        }

        /// Returns `true` for [`Effect::None`]
        #[must_use]
        pub const fn is_none(&self) -> bool {
            matches!(self, Effect::None)
        }
    }
}

/// Environment module - Time abstractions
///
/// All time is injected so the step machine, LCID lifecycle and alert
/// scheduler can be driven by simulated clocks in tests.
pub mod environment {
    use chrono::{DateTime, Utc};
    use std::future::Future;

    /// Clock trait - abstracts time operations for testability
    ///
    /// # Examples
    ///
    /// ```ignore
    /// // Production - uses system clock
    /// struct SystemClock;
    /// impl Clock for SystemClock {
    ///     fn now(&self) -> DateTime<Utc> {
    ///         Utc::now()
    ///     }
    /// }
    ///
    /// // Test - fixed time for deterministic tests
    /// struct FixedClock { time: DateTime<Utc> }
    /// impl Clock for FixedClock {
    ///     fn now(&self) -> DateTime<Utc> {
    ///         self.time
    ///     }
    /// }
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall-clock time
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }

    /// A clock that can also wait for the next scheduler tick
    ///
    /// Production tickers sleep on a timer; test tickers advance simulated
    /// time and return immediately.
    pub trait Ticker: Clock {
        /// Wait until the next tick is due
        fn sleep_until_next_tick(&mut self) -> impl Future<Output = ()> + Send;
    }
}
