//! The Store - runtime coordinator for a reducer.
//!
//! The Store owns the reducer state behind a `RwLock`, runs the reducer for
//! each action and executes the returned effects. Actions produced by effects
//! are fed back into the reducer until no work remains.
//!
//! Unlike a fire-and-forget runtime, [`Store::send`] awaits every effect
//! before returning, so callers observe the persisted outcome of a command.

use crate::error::StoreError;
use futures::future::{BoxFuture, join_all};
use intake_governance_core::effect::Effect;
use intake_governance_core::reducer::Reducer;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

/// The Store
///
/// # Type Parameters
///
/// - `S`: State type
/// - `A`: Action type
/// - `E`: Environment type
/// - `R`: Reducer implementation
///
/// # Example
///
/// ```ignore
/// let store = Store::new(
///     WorkflowState::new(intake),
///     IntakeReducer::new(),
///     environment,
/// );
///
/// store.send(IntakeCommand::ProgressToStep {
///     target: IntakeStep::GrtMeeting,
///     meeting_date: None,
/// }.into()).await?;
///
/// let step = store.state(|s| s.intake.step).await;
/// ```
pub struct Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    state: Arc<RwLock<S>>,
    reducer: R,
    environment: E,
    shutdown: Arc<AtomicBool>,
}

impl<S, A, E, R> Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E> + Send + Sync,
    A: Send + 'static,
    S: Send + Sync,
    E: Send + Sync,
{
    /// Create a new store with initial state, reducer, and environment
    #[must_use]
    pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
        Self {
            state: Arc::new(RwLock::new(initial_state)),
            reducer,
            environment,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Send an action and run it, and every action its effects produce, to completion
    ///
    /// Actions are processed one at a time in the order they are produced.
    ///
    /// # Errors
    ///
    /// - [`StoreError::ShutdownInProgress`]: the store no longer accepts actions
    /// - [`StoreError::TaskJoinError`]: a parallel effect task panicked
    #[tracing::instrument(skip(self, action), name = "store_send")]
    pub async fn send(&self, action: A) -> Result<(), StoreError> {
        if self.shutdown.load(Ordering::SeqCst) {
            return Err(StoreError::ShutdownInProgress);
        }

        let mut pending = VecDeque::from([action]);
        while let Some(action) = pending.pop_front() {
            let effects = {
                let mut state = self.state.write().await;
                self.reducer.reduce(&mut state, action, &self.environment)
            };

            for effect in effects {
                pending.extend(execute_effect(effect).await?);
            }
        }

        Ok(())
    }

    /// Read state via a closure
    pub async fn state<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&S) -> T,
    {
        let state = self.state.read().await;
        f(&*state)
    }

    /// Stop accepting new actions
    ///
    /// Actions already inside [`Store::send`] run to completion.
    pub fn shutdown(&self) {
        tracing::info!("Store shutting down");
        self.shutdown.store(true, Ordering::SeqCst);
    }
}

/// Execute one effect, returning the actions it produced
fn execute_effect<A>(effect: Effect<A>) -> BoxFuture<'static, Result<Vec<A>, StoreError>>
where
    A: Send + 'static,
{
    Box::pin(async move {
        match effect {
            Effect::None => {
                tracing::trace!("Executing Effect::None (no-op)");
                metrics::counter!("store_effects_executed_total", "type" => "none").increment(1);
                Ok(Vec::new())
            },
            Effect::Future(fut) => {
                tracing::trace!("Executing Effect::Future");
                metrics::counter!("store_effects_executed_total", "type" => "future").increment(1);
                Ok(fut.await.into_iter().collect())
            },
            Effect::Sequential(effects) => {
                tracing::trace!("Executing Effect::Sequential with {} effects", effects.len());
                metrics::counter!("store_effects_executed_total", "type" => "sequential")
                    .increment(1);
                let mut produced = Vec::new();
                for effect in effects {
                    produced.extend(execute_effect(effect).await?);
                }
                Ok(produced)
            },
            Effect::Parallel(effects) => {
                tracing::trace!("Executing Effect::Parallel with {} effects", effects.len());
                metrics::counter!("store_effects_executed_total", "type" => "parallel")
                    .increment(1);
                let handles: Vec<_> = effects
                    .into_iter()
                    .map(|effect| tokio::spawn(execute_effect(effect)))
                    .collect();

                let mut produced = Vec::new();
                for result in join_all(handles).await {
                    produced.extend(result??);
                }
                Ok(produced)
            },
        }
    })
}
