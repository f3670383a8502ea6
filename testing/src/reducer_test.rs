//! Given-When-Then harness for driving one reducer step synchronously.
//!
//! Effects are returned for inspection, never executed; feed a feedback
//! action (such as [`IntakeAction::Loaded`]) to test what follows an effect.
//!
//! [`IntakeAction::Loaded`]: intake_governance_core::workflow::IntakeAction::Loaded

#![allow(clippy::module_name_repetitions)] // ReducerTest is the natural name

use intake_governance_core::{effect::Effect, reducer::Reducer};

type StateAssertion<S> = Box<dyn FnOnce(&S)>;
type EffectAssertion<A> = Box<dyn FnOnce(&[Effect<A>])>;

/// One reducer step with assertions on the resulting state and effects
///
/// ```ignore
/// let intake = IntakeBuilder::new("intake-1").build();
///
/// ReducerTest::new(IntakeReducer::new())
///     .with_env(env())
///     .given_state(WorkflowState::new(intake.clone()))
///     .when_action(IntakeAction::Loaded {
///         intake: Box::new(intake),
///         command: IntakeCommand::ProgressToStep {
///             target: IntakeStep::DraftBusinessCase,
///             meeting_date: None,
///         },
///     })
///     .then_effects(assertions::assert_has_future_effect)
///     .run();
/// ```
pub struct ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    reducer: R,
    environment: Option<E>,
    initial_state: Option<S>,
    action: Option<A>,
    state_assertions: Vec<StateAssertion<S>>,
    effect_assertions: Vec<EffectAssertion<A>>,
}

impl<R, S, A, E> ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
    S: Clone,
    A: Clone,
{
    /// Starts a test for `reducer`
    #[must_use]
    pub const fn new(reducer: R) -> Self {
        Self {
            reducer,
            environment: None,
            initial_state: None,
            action: None,
            state_assertions: Vec::new(),
            effect_assertions: Vec::new(),
        }
    }

    /// Environment passed to the reducer
    #[must_use]
    pub fn with_env(mut self, env: E) -> Self {
        self.environment = Some(env);
        self
    }

    /// State before the action
    #[must_use]
    pub fn given_state(mut self, state: S) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Action under test
    #[must_use]
    pub fn when_action(mut self, action: A) -> Self {
        self.action = Some(action);
        self
    }

    /// Checks the state after the action
    #[must_use]
    pub fn then_state<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&S) + 'static,
    {
        self.state_assertions.push(Box::new(assertion));
        self
    }

    /// Checks the effects returned by the reducer
    #[must_use]
    pub fn then_effects<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&[Effect<A>]) + 'static,
    {
        self.effect_assertions.push(Box::new(assertion));
        self
    }

    /// Runs the reducer once, then every assertion in the order added
    ///
    /// # Panics
    ///
    /// Panics if state, action or environment is missing, or an assertion fails.
    #[allow(clippy::panic)] // Test code can panic
    #[allow(clippy::expect_used)] // Test code can use expect
    pub fn run(self) {
        let mut state = self
            .initial_state
            .expect("Initial state must be set with given_state()");

        let action = self.action.expect("Action must be set with when_action()");

        let env = self
            .environment
            .expect("Environment must be set with with_env()");

        let effects = self.reducer.reduce(&mut state, action, &env);

        for assertion in self.state_assertions {
            assertion(&state);
        }
        for assertion in self.effect_assertions {
            assertion(&effects);
        }
    }
}

/// Effect assertions for [`ReducerTest::then_effects`]
pub mod assertions {
    use intake_governance_core::effect::Effect;

    /// Every effect is [`Effect::None`]
    ///
    /// # Panics
    ///
    /// Panics if any effect does work.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_no_effects<A: std::fmt::Debug>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().all(Effect::is_none),
            "Expected no effects, but found {}: {:?}",
            effects.len(),
            effects
        );
    }

    /// Exactly `expected` effects were returned
    ///
    /// # Panics
    ///
    /// Panics on a different count.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_effects_count<A>(effects: &[Effect<A>], expected: usize) {
        assert_eq!(
            effects.len(),
            expected,
            "Expected {} effects, but found {}",
            expected,
            effects.len()
        );
    }

    /// At least one [`Effect::Future`] was returned
    ///
    /// # Panics
    ///
    /// Panics if there is none.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_has_future_effect<A>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().any(|e| matches!(e, Effect::Future(_))),
            "Expected at least one Future effect, but none found"
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use crate::{InMemoryIntakeRepository, IntakeBuilder, SequentialLcidGenerator, test_clock};
    use intake_governance_core::error::ValidationError;
    use intake_governance_core::intake::IntakeStep;
    use intake_governance_core::workflow::{
        IntakeAction, IntakeCommand, IntakeEnvironment, IntakeReducer, WorkflowState,
    };
    use std::sync::Arc;

    fn env() -> IntakeEnvironment {
        IntakeEnvironment::new(
            Arc::new(test_clock()),
            Arc::new(InMemoryIntakeRepository::new()),
            Arc::new(SequentialLcidGenerator::new()),
        )
    }

    fn draft_business_case() -> IntakeCommand {
        IntakeCommand::ProgressToStep {
            target: IntakeStep::DraftBusinessCase,
            meeting_date: None,
        }
    }

    #[test]
    fn test_command_loads_before_changing_state() {
        let intake = IntakeBuilder::new("intake-1").build();
        let expected = intake.clone();

        ReducerTest::new(IntakeReducer::new())
            .with_env(env())
            .given_state(WorkflowState::new(intake))
            .when_action(draft_business_case().into())
            .then_state(move |state| assert_eq!(state.intake, expected))
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_has_future_effect(effects);
            })
            .run();
    }

    #[test]
    fn test_loaded_command_is_persisted_not_committed() {
        let intake = IntakeBuilder::new("intake-1").build();

        ReducerTest::new(IntakeReducer::new())
            .with_env(env())
            .given_state(WorkflowState::new(intake.clone()))
            .when_action(IntakeAction::Loaded {
                intake: Box::new(intake),
                command: draft_business_case(),
            })
            .then_state(|state| {
                assert_eq!(state.intake.step, IntakeStep::InitialForm);
                assert!(state.last_error.is_none());
            })
            .then_effects(assertions::assert_has_future_effect)
            .run();
    }

    #[test]
    fn test_rejected_command_has_no_effects() {
        let intake = IntakeBuilder::new("intake-1").closed().build();

        ReducerTest::new(IntakeReducer::new())
            .with_env(env())
            .given_state(WorkflowState::new(intake.clone()))
            .when_action(IntakeAction::Loaded {
                intake: Box::new(intake),
                command: IntakeCommand::ProgressToStep {
                    target: IntakeStep::GrtMeeting,
                    meeting_date: None,
                },
            })
            .then_state(|state| {
                assert_eq!(state.intake.step, IntakeStep::InitialForm);
                assert!(matches!(
                    state.last_error,
                    Some(ValidationError::InvalidAction { .. })
                ));
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_assertions_no_effects() {
        assertions::assert_no_effects::<IntakeAction>(&[Effect::None]);
        assertions::assert_no_effects::<IntakeAction>(&[]);
    }

    #[test]
    fn test_assertions_effects_count() {
        assertions::assert_effects_count(&[Effect::<IntakeAction>::None], 1);
        assertions::assert_effects_count::<IntakeAction>(&[], 0);
    }
}
