//! # Reelmint Core
//!
//! Core traits and types for the reelmint ticket purchase workflow.
//!
//! The workflow is written as a reducer: a pure function that takes the
//! current state, an action and the injected environment, mutates the state
//! in place and returns descriptions of the side effects to run next. The
//! runtime crate executes those effects and feeds the actions they produce
//! back into the reducer.
//!
//! ## Core Concepts
//!
//! - **State**: the catalog and the in-flight purchase requests
//! - **Action**: commands (`BeginPurchase`, `ConfirmPurchase`, ...) and the
//!   events that answer them (`PaymentSettled`, `PurchaseCompleted`, ...)
//! - **Reducer**: `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: a description of ledger I/O or a timer, never executed here
//! - **Environment**: wallet, ledger client and clock, injected via traits
//!
//! ## Example
//!
//! ```ignore
//! use reelmint_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
//!
//! impl Reducer for PurchaseReducer {
//!     type State = PurchaseState;
//!     type Action = PurchaseAction;
//!     type Environment = PurchaseEnvironment<W, L, C>;
//!
//!     fn reduce(
//!         &self,
//!         state: &mut PurchaseState,
//!         action: PurchaseAction,
//!         env: &Self::Environment,
//!     ) -> SmallVec<[Effect<PurchaseAction>; 4]> {
//!         smallvec![Effect::None]
//!     }
//! }
//! ```

pub use chrono::{DateTime, Utc};
pub use smallvec::{smallvec, SmallVec};

/// Reducer module - the trait every workflow implements
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// The Reducer trait - core abstraction for business logic
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
        /// Validates the action, updates state in place and returns the
        /// effects to run. Must not perform I/O itself.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect module - side effect descriptions
///
/// Effects are values returned by reducers. The runtime executes them and
/// feeds any resulting action back into the reducer.
pub mod effect {
    use std::future::Future;
    use std::pin::Pin;
    use std::time::Duration;

    /// Effect type - describes a side effect to be executed
    ///
    /// # Type Parameters
    ///
    /// - `Action`: The action type that effects can produce (feedback loop)
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Dispatch `action` once `duration` has elapsed
        Delay {
            /// How long to wait
            duration: Duration,
            /// Action to dispatch after delay
            action: Box<Action>,
        },

        /// Arbitrary async computation
        ///
        /// Returns `Option<Action>` - if Some, the action is fed back into the reducer
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),
    }

    impl<Action> std::fmt::Debug for Effect<Action>
    where
        Action: std::fmt::Debug,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Delay { duration, action } => f
                    .debug_struct("Effect::Delay")
                    .field("duration", duration)
                    .field("action", action)
                    .finish(),
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Box an async computation into an [`Effect::Future`]
        #[must_use]
        pub fn future<F>(fut: F) -> Self
        where
            F: Future<Output = Option<Action>> + Send + 'static,
        {
            Effect::Future(Box::pin(fut))
        }

        /// Feed `action` back into the reducer on the next turn
        ///
        /// Used for outcomes the reducer decides synchronously (rejections,
        /// acknowledgements) so that waiters observe them like any other
        /// effect-produced action.
        #[must_use]
        pub fn dispatch(action: Action) -> Self
        where
            Action: Send + 'static,
        {
            Effect::Future(Box::pin(async move { Some(action) }))
        }

        /// True for [`Effect::None`]
        #[must_use]
        pub const fn is_none(&self) -> bool {
            matches!(self, Effect::None)
        }
    }
}

/// Environment module - dependency injection traits
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall clock backed by [`Utc::now`]
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::effect::Effect;
    use super::environment::{Clock, SystemClock};
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq)]
    enum Ping {
        Pong,
    }

    #[test]
    fn test_debug_formatting() {
        let delay = Effect::Delay {
            duration: Duration::from_millis(2000),
            action: Box::new(Ping::Pong),
        };
        let rendered = format!("{delay:?}");
        assert!(rendered.contains("Effect::Delay"));
        assert!(rendered.contains("Pong"));

        assert_eq!(format!("{:?}", Effect::<Ping>::None), "Effect::None");
        assert_eq!(
            format!("{:?}", Effect::dispatch(Ping::Pong)),
            "Effect::Future(<future>)"
        );
    }

    #[test]
    fn test_dispatch_resolves_to_action() {
        let Effect::Future(fut) = Effect::dispatch(Ping::Pong) else {
            unreachable!("dispatch always builds a future effect");
        };
        assert_eq!(tokio_test::block_on(fut), Some(Ping::Pong));
    }

    #[test]
    fn test_is_none() {
        assert!(Effect::<Ping>::None.is_none());
        assert!(!Effect::future(async { None::<Ping> }).is_none());
    }

    #[test]
    fn test_system_clock_advances() {
        let clock = SystemClock;
        let first = clock.now();
        let second = clock.now();
        assert!(second >= first);
    }
}
