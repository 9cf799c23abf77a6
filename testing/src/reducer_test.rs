//! Ergonomic testing utilities for reducers
//!
//! A fluent Given-When-Then API for exercising one reducer transition.

#![allow(clippy::module_name_repetitions)] // ReducerTest is the natural name

use reelmint_core::{effect::Effect, reducer::Reducer};

/// Type alias for state assertion functions
type StateAssertion<S> = Box<dyn FnOnce(&S)>;

/// Type alias for effect assertion functions
type EffectAssertion<A> = Box<dyn FnOnce(&[Effect<A>])>;

/// Fluent API for testing reducers with Given-When-Then syntax
///
/// # Example
///
/// ```ignore
/// use reelmint_testing::ReducerTest;
///
/// ReducerTest::new(PurchaseReducer::new())
///     .with_env(test_env())
///     .given_state(PurchaseState::new(catalog))
///     .when_action(PurchaseAction::CancelPurchase { request_id })
///     .then_state(move |state| {
///         assert!(state.request(request_id).is_none());
///     })
///     .run();
/// ```
pub struct ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    reducer: R,
    environment: Option<E>,
    initial_state: Option<S>,
    actions: Vec<A>,
    state_assertions: Vec<StateAssertion<S>>,
    effect_assertions: Vec<EffectAssertion<A>>,
}

impl<R, S, A, E> ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    /// Create a new reducer test with the given reducer
    #[must_use]
    pub const fn new(reducer: R) -> Self {
        Self {
            reducer,
            environment: None,
            initial_state: None,
            actions: Vec::new(),
            state_assertions: Vec::new(),
            effect_assertions: Vec::new(),
        }
    }

    /// Set the environment for the test
    #[must_use]
    pub fn with_env(mut self, env: E) -> Self {
        self.environment = Some(env);
        self
    }

    /// Set the initial state (Given)
    #[must_use]
    pub fn given_state(mut self, state: S) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Apply an action before the one under test (Given)
    ///
    /// Effects returned for setup actions are discarded.
    #[must_use]
    pub fn given_action(mut self, action: A) -> Self {
        self.actions.push(action);
        self
    }

    /// Set the action to test (When)
    ///
    /// Only the effects of the last action are handed to effect assertions.
    #[must_use]
    pub fn when_action(mut self, action: A) -> Self {
        self.actions.push(action);
        self
    }

    /// Add an assertion about the resulting state (Then)
    #[must_use]
    pub fn then_state<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&S) + 'static,
    {
        self.state_assertions.push(Box::new(assertion));
        self
    }

    /// Add an assertion about the resulting effects (Then)
    #[must_use]
    pub fn then_effects<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&[Effect<A>]) + 'static,
    {
        self.effect_assertions.push(Box::new(assertion));
        self
    }

    /// Run the test and execute all assertions
    ///
    /// # Panics
    ///
    /// Panics if initial state, action, or environment is not set,
    /// or if any assertions fail.
    #[allow(clippy::panic)] // Test code can panic
    #[allow(clippy::expect_used)] // Test code can use expect
    pub fn run(self) {
        let mut state = self
            .initial_state
            .expect("Initial state must be set with given_state()");

        assert!(
            !self.actions.is_empty(),
            "Action must be set with when_action()"
        );

        let env = self
            .environment
            .expect("Environment must be set with with_env()");

        let mut effects = Vec::new();
        for action in self.actions {
            effects = self.reducer.reduce(&mut state, action, &env).into_vec();
        }

        for assertion in self.state_assertions {
            assertion(&state);
        }

        for assertion in self.effect_assertions {
            assertion(&effects);
        }
    }
}

/// Helper assertions for effects
pub mod assertions {
    use reelmint_core::effect::Effect;
    use std::time::Duration;

    /// Assert that there are no effects
    ///
    /// # Panics
    ///
    /// Panics if effects is not empty.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_no_effects<A: std::fmt::Debug>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().all(Effect::is_none),
            "Expected no effects, but found {}: {:?}",
            effects.len(),
            effects
        );
    }

    /// Assert the number of effects
    ///
    /// # Panics
    ///
    /// Panics if the number of effects doesn't match expected.
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

    /// Assert that effects contain at least one Future effect
    ///
    /// # Panics
    ///
    /// Panics if no Future effect is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_has_future_effect<A>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().any(|e| matches!(e, Effect::Future(_))),
            "Expected at least one Future effect, but none found"
        );
    }

    /// Assert that effects contain a Delay of exactly `duration`
    ///
    /// # Panics
    ///
    /// Panics if no matching Delay effect is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_has_delay<A>(effects: &[Effect<A>], duration: Duration) {
        assert!(
            effects
                .iter()
                .any(|e| matches!(e, Effect::Delay { duration: d, .. } if *d == duration)),
            "Expected a Delay effect of {duration:?}"
        );
    }
}

/// Run effects to completion outside a Store
///
/// Awaits every `Future` effect and takes `Delay` actions without sleeping,
/// returning the actions they produce in order. Lets a test step a workflow
/// one transition at a time.
pub async fn drive<A>(effects: impl IntoIterator<Item = Effect<A>>) -> Vec<A> {
    let mut produced = Vec::new();
    for effect in effects {
        match effect {
            Effect::None => {},
            Effect::Delay { action, .. } => produced.push(*action),
            Effect::Future(fut) => {
                if let Some(action) = fut.await {
                    produced.push(action);
                }
            },
        }
    }
    produced
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelmint_core::{smallvec, SmallVec};
    use std::time::Duration;

    // Minimal seat picker: Pick stores the seat and asks for a confirmation.
    #[derive(Clone, Debug, Default)]
    struct SeatState {
        picked: Option<String>,
        confirmed: bool,
    }

    #[derive(Clone, Debug, PartialEq)]
    enum SeatAction {
        Pick(String),
        Confirm,
        Confirmed,
    }

    struct SeatReducer;

    struct SeatEnv;

    impl Reducer for SeatReducer {
        type State = SeatState;
        type Action = SeatAction;
        type Environment = SeatEnv;

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                SeatAction::Pick(seat) => {
                    state.picked = Some(seat);
                    smallvec![Effect::None]
                },
                SeatAction::Confirm => smallvec![Effect::Delay {
                    duration: Duration::from_millis(2000),
                    action: Box::new(SeatAction::Confirmed),
                }],
                SeatAction::Confirmed => {
                    state.confirmed = true;
                    smallvec![Effect::dispatch(SeatAction::Pick("A12".to_string()))]
                },
            }
        }
    }

    #[test]
    fn test_pick_seat() {
        ReducerTest::new(SeatReducer)
            .with_env(SeatEnv)
            .given_state(SeatState::default())
            .when_action(SeatAction::Pick("B8".to_string()))
            .then_state(|state| {
                assert_eq!(state.picked.as_deref(), Some("B8"));
            })
            .then_effects(|effects| {
                assertions::assert_no_effects(effects);
            })
            .run();
    }

    #[test]
    fn test_given_actions_are_applied_in_order() {
        ReducerTest::new(SeatReducer)
            .with_env(SeatEnv)
            .given_state(SeatState::default())
            .given_action(SeatAction::Pick("C15".to_string()))
            .when_action(SeatAction::Confirm)
            .then_state(|state| {
                assert_eq!(state.picked.as_deref(), Some("C15"));
                assert!(!state.confirmed);
            })
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_has_delay(effects, Duration::from_millis(2000));
            })
            .run();
    }

    #[tokio::test]
    async fn test_drive_collects_produced_actions() {
        let mut state = SeatState::default();
        let effects = SeatReducer.reduce(&mut state, SeatAction::Confirm, &SeatEnv);
        assert_eq!(drive(effects).await, vec![SeatAction::Confirmed]);

        let effects = SeatReducer.reduce(&mut state, SeatAction::Confirmed, &SeatEnv);
        assertions::assert_has_future_effect(&effects);
        assert_eq!(drive(effects).await, vec![SeatAction::Pick("A12".to_string())]);
    }
}
