//! # Reelmint Runtime
//!
//! The Store runtime that coordinates reducer execution and effect handling.
//!
//! ## Core Components
//!
//! - **Store**: owns the state, runs the reducer and executes effects
//! - **Feedback loop**: actions produced by effects are reduced, then
//!   broadcast to observers
//! - **Request/response**: [`Store::send_and_wait_for`] turns the loop into a
//!   call that returns once a terminal action has been reduced. Each caller
//!   gets its answer on its own channel, so slow observers never lose one.
//!
//! ## Example
//!
//! ```ignore
//! use reelmint_runtime::Store;
//!
//! let store = Store::new(PurchaseState::new(catalog), PurchaseReducer::new(), env);
//!
//! let outcome = store
//!     .send_and_wait_for(PurchaseAction::ConfirmPurchase { request_id }, move |a| {
//!         a.ends_confirmation(request_id)
//!     })
//!     .await?;
//! ```

use reelmint_core::{effect::Effect, reducer::Reducer};
use std::sync::{Arc, Mutex, PoisonError};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum StoreError {
        /// Store is shutting down and not accepting new actions
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Shutdown timed out waiting for effects to complete
        #[error("Shutdown timed out with {0} effects still running")]
        ShutdownTimeout(usize),

        /// Timeout waiting for terminal action
        #[error("Timeout waiting for action")]
        Timeout,

        /// Action broadcast channel closed
        #[error("Action broadcast channel closed")]
        ChannelClosed,
    }
}

pub use error::StoreError;
pub use store::Store;

/// Guard that decrements an atomic counter on drop (for shutdown tracking)
struct AtomicCounterGuard(Arc<AtomicUsize>);

impl Drop for AtomicCounterGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Store runtime for coordinating reducer execution and effect handling.
pub mod store {
    use super::{
        Arc, AtomicBool, AtomicCounterGuard, AtomicUsize, Duration, Effect, Mutex, Ordering,
        PoisonError, Reducer, RwLock, StoreError,
    };
    use tokio::sync::{broadcast, oneshot};

    /// Default capacity of the action broadcast channel
    const DEFAULT_BROADCAST_CAPACITY: usize = 64;

    /// A caller of [`Store::send_and_wait_for`] and the action it waits for
    struct Waiter<A> {
        predicate: Box<dyn Fn(&A) -> bool + Send + Sync>,
        reply: oneshot::Sender<A>,
    }

    type Waiters<A> = Arc<Mutex<Vec<Waiter<A>>>>;

    /// The Store - runtime coordinator for a reducer
    ///
    /// # Type Parameters
    ///
    /// - `S`: State type
    /// - `A`: Action type
    /// - `E`: Environment type
    /// - `R`: Reducer implementation
    ///
    /// Cloning a store is cheap; clones share state, reducer and environment.
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Arc<RwLock<S>>,
        reducer: Arc<R>,
        environment: Arc<E>,
        shutdown: Arc<AtomicBool>,
        pending_effects: Arc<AtomicUsize>,
        /// Every action produced by an effect, published after it was reduced.
        action_broadcast: broadcast::Sender<A>,
        /// Pending request/response callers, answered after the reduce.
        waiters: Waiters<A>,
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        fn clone(&self) -> Self {
            Self {
                state: Arc::clone(&self.state),
                reducer: Arc::clone(&self.reducer),
                environment: Arc::clone(&self.environment),
                shutdown: Arc::clone(&self.shutdown),
                pending_effects: Arc::clone(&self.pending_effects),
                action_broadcast: self.action_broadcast.clone(),
                waiters: Arc::clone(&self.waiters),
            }
        }
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        A: Send + Clone + std::fmt::Debug + 'static,
        S: Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        /// Create a new store with initial state, reducer, and environment
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::with_broadcast_capacity(
                initial_state,
                reducer,
                environment,
                DEFAULT_BROADCAST_CAPACITY,
            )
        }

        /// Create a new Store with custom action broadcast capacity
        ///
        /// Increase the capacity when many observers may lag behind.
        #[must_use]
        pub fn with_broadcast_capacity(
            initial_state: S,
            reducer: R,
            environment: E,
            capacity: usize,
        ) -> Self {
            let (action_broadcast, _) = broadcast::channel(capacity.max(1));

            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer: Arc::new(reducer),
                environment: Arc::new(environment),
                shutdown: Arc::new(AtomicBool::new(false)),
                pending_effects: Arc::new(AtomicUsize::new(0)),
                action_broadcast,
                waiters: Arc::new(Mutex::new(Vec::new())),
            }
        }

        /// Number of effects currently executing
        #[must_use]
        pub fn pending_effects(&self) -> usize {
            self.pending_effects.load(Ordering::Acquire)
        }

        /// Send an action to the store
        ///
        /// 1. Acquires write lock on state
        /// 2. Calls reducer with (state, action, environment)
        /// 3. Starts the returned effects in spawned tasks
        ///
        /// Returns once the reducer has run; effects may still be in flight.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> Result<(), StoreError> {
            if self.shutdown.load(Ordering::Acquire) {
                tracing::warn!("Rejected action: store is shutting down");
                metrics::counter!("store.shutdown.rejected_actions").increment(1);
                return Err(StoreError::ShutdownInProgress);
            }
            self.reduce(action).await;
            Ok(())
        }

        /// Run the reducer and start its effects, shutdown or not
        async fn reduce(&self, action: A) {
            tracing::debug!(?action, "Processing action");
            metrics::counter!("store.commands.total").increment(1);

            let effects = {
                let mut state = self.state.write().await;
                let span = tracing::debug_span!("reducer_execution");
                let _enter = span.enter();

                let start = std::time::Instant::now();
                let effects = self.reducer.reduce(&mut *state, action, &*self.environment);
                metrics::histogram!("store.reducer.duration_seconds")
                    .record(start.elapsed().as_secs_f64());

                tracing::trace!("Reducer completed, returned {} effects", effects.len());
                effects
            };

            for effect in effects {
                self.execute_effect(effect);
            }
        }

        /// Send an action and wait for a matching result action
        ///
        /// Registers the caller before sending, so a result produced
        /// immediately is not missed, and answers it on its own channel, so
        /// no amount of unrelated traffic can crowd the result out. The
        /// returned action has already been reduced when this returns, so
        /// state reads afterwards observe it. Waits without a deadline.
        ///
        /// # Errors
        ///
        /// - [`StoreError::ShutdownInProgress`]: store is shutting down
        /// - [`StoreError::ChannelClosed`]: the store went away before answering
        pub async fn send_and_wait_for<F>(&self, action: A, predicate: F) -> Result<A, StoreError>
        where
            F: Fn(&A) -> bool + Send + Sync + 'static,
        {
            let answer = self.register(predicate);
            if let Err(error) = self.send(action).await {
                drop(answer);
                self.forget_abandoned();
                return Err(error);
            }
            answer.await.map_err(|_| StoreError::ChannelClosed)
        }

        /// Like [`Store::send_and_wait_for`], bounded by `timeout`
        ///
        /// # Errors
        ///
        /// - [`StoreError::Timeout`]: no matching action within `timeout`
        /// - [`StoreError::ShutdownInProgress`]: store is shutting down
        /// - [`StoreError::ChannelClosed`]: the store went away before answering
        pub async fn send_and_wait_for_timeout<F>(
            &self,
            action: A,
            predicate: F,
            timeout: Duration,
        ) -> Result<A, StoreError>
        where
            F: Fn(&A) -> bool + Send + Sync + 'static,
        {
            let answer = self.register(predicate);
            if let Err(error) = self.send(action).await {
                drop(answer);
                self.forget_abandoned();
                return Err(error);
            }
            let Ok(answer) = tokio::time::timeout(timeout, answer).await else {
                self.forget_abandoned();
                return Err(StoreError::Timeout);
            };
            answer.map_err(|_| StoreError::ChannelClosed)
        }

        /// Number of callers still waiting for an answer
        #[must_use]
        pub fn pending_waiters(&self) -> usize {
            self.lock_waiters().len()
        }

        fn register<F>(&self, predicate: F) -> oneshot::Receiver<A>
        where
            F: Fn(&A) -> bool + Send + Sync + 'static,
        {
            let (reply, answer) = oneshot::channel();
            self.lock_waiters().push(Waiter {
                predicate: Box::new(predicate),
                reply,
            });
            answer
        }

        /// Hand `action` to every waiter it answers, and forget waiters that
        /// gave up.
        fn answer_waiters(&self, action: &A) {
            let mut waiters = self.lock_waiters();
            let mut index = 0;
            while index < waiters.len() {
                let waiter = &waiters[index];
                if waiter.reply.is_closed() {
                    waiters.swap_remove(index);
                } else if (waiter.predicate)(action) {
                    let waiter = waiters.swap_remove(index);
                    // The caller may have timed out since the check above.
                    let _ = waiter.reply.send(action.clone());
                } else {
                    index += 1;
                }
            }
        }

        fn forget_abandoned(&self) {
            self.lock_waiters().retain(|waiter| !waiter.reply.is_closed());
        }

        fn lock_waiters(&self) -> std::sync::MutexGuard<'_, Vec<Waiter<A>>> {
            self.waiters.lock().unwrap_or_else(PoisonError::into_inner)
        }

        /// Subscribe to all actions produced by effects
        ///
        /// Observers that fall more than the channel capacity behind skip
        /// actions; request/response callers are not affected.
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.action_broadcast.subscribe()
        }

        /// Read current state via a closure
        ///
        /// ```ignore
        /// let offerings = store.state(|s| s.catalog().list().cloned().collect::<Vec<_>>()).await;
        /// ```
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&*state)
        }

        /// Initiate graceful shutdown of the store
        ///
        /// Rejects new actions, then waits for in-flight effects. Actions those
        /// effects produce are still reduced, so chains already under way run
        /// to their end and their callers get an answer.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownTimeout`] if effects are still running
        /// when `timeout` expires.
        pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
            tracing::info!("Initiating graceful shutdown");
            self.shutdown.store(true, Ordering::Release);

            let start = tokio::time::Instant::now();
            let poll_interval = Duration::from_millis(50);

            loop {
                let pending = self.pending_effects.load(Ordering::Acquire);
                if pending == 0 {
                    tracing::info!("All effects completed, shutdown successful");
                    return Ok(());
                }
                if start.elapsed() >= timeout {
                    tracing::error!(pending_effects = pending, "Shutdown timeout");
                    return Err(StoreError::ShutdownTimeout(pending));
                }
                tokio::time::sleep(poll_interval).await;
            }
        }

        /// Reduce an effect-produced action, then publish it
        ///
        /// Publishing after the reduce is what lets waiters read the state
        /// the action produced. The next effect is started before this
        /// effect's guard drops, so `pending_effects` stays above zero until
        /// a chain ends.
        async fn feed_back(&self, action: A) {
            self.reduce(action.clone()).await;
            self.answer_waiters(&action);
            // No receivers is not an error: nobody is observing this action.
            let _ = self.action_broadcast.send(action);
        }

        fn track(&self) -> AtomicCounterGuard {
            self.pending_effects.fetch_add(1, Ordering::SeqCst);
            AtomicCounterGuard(Arc::clone(&self.pending_effects))
        }

        /// Execute one effect
        ///
        /// Effect tasks are fire-and-forget. Failures inside them are expected
        /// to come back as actions; a panicking task is isolated by tokio.
        fn execute_effect(&self, effect: Effect<A>) {
            match effect {
                Effect::None => {
                    metrics::counter!("store.effects.executed", "type" => "none").increment(1);
                },
                Effect::Future(fut) => {
                    metrics::counter!("store.effects.executed", "type" => "future").increment(1);
                    let guard = self.track();
                    let store = self.clone();

                    tokio::spawn(async move {
                        let _guard = guard;
                        if let Some(action) = fut.await {
                            store.feed_back(action).await;
                        } else {
                            tracing::trace!("Effect::Future completed with no action");
                        }
                    });
                },
                Effect::Delay { duration, action } => {
                    tracing::trace!(?duration, "Executing Effect::Delay");
                    metrics::counter!("store.effects.executed", "type" => "delay").increment(1);
                    let guard = self.track();
                    let store = self.clone();

                    tokio::spawn(async move {
                        let _guard = guard;
                        tokio::time::sleep(duration).await;
                        store.feed_back(*action).await;
                    });
                },
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use reelmint_core::{smallvec, SmallVec};

    // Seat hold: Hold → (future) Held → (delay) Released
    #[derive(Debug, Default)]
    struct SeatState {
        held: Vec<u32>,
        released: Vec<u32>,
    }

    #[derive(Debug, Clone, PartialEq)]
    enum SeatAction {
        Hold(u32),
        Held(u32),
        Release(u32),
        Released(u32),
        Ignore,
    }

    struct SeatEnv {
        hold_for: Duration,
    }

    struct SeatReducer;

    impl Reducer for SeatReducer {
        type State = SeatState;
        type Action = SeatAction;
        type Environment = SeatEnv;

        fn reduce(
            &self,
            state: &mut SeatState,
            action: SeatAction,
            env: &SeatEnv,
        ) -> SmallVec<[Effect<SeatAction>; 4]> {
            match action {
                SeatAction::Hold(seat) => {
                    smallvec![Effect::future(async move { Some(SeatAction::Held(seat)) })]
                },
                SeatAction::Held(seat) => {
                    state.held.push(seat);
                    smallvec![Effect::None]
                },
                SeatAction::Release(seat) => smallvec![Effect::Delay {
                    duration: env.hold_for,
                    action: Box::new(SeatAction::Released(seat)),
                }],
                SeatAction::Released(seat) => {
                    state.held.retain(|s| *s != seat);
                    state.released.push(seat);
                    smallvec![Effect::None]
                },
                SeatAction::Ignore => smallvec![Effect::future(async { None })],
            }
        }
    }

    fn seat_store() -> Store<SeatState, SeatAction, SeatEnv, SeatReducer> {
        Store::new(
            SeatState::default(),
            SeatReducer,
            SeatEnv {
                hold_for: Duration::from_millis(2000),
            },
        )
    }

    #[tokio::test]
    async fn test_send_and_wait_observes_reduced_state() {
        let store = seat_store();

        let result = store
            .send_and_wait_for(SeatAction::Hold(12), |a| matches!(a, SeatAction::Held(_)))
            .await
            .unwrap();

        assert_eq!(result, SeatAction::Held(12));
        assert_eq!(store.state(|s| s.held.clone()).await, vec![12]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_effect_dispatches_after_duration() {
        let store = seat_store();
        store
            .send_and_wait_for(SeatAction::Hold(8), |a| matches!(a, SeatAction::Held(_)))
            .await
            .unwrap();

        let started = tokio::time::Instant::now();
        let result = store
            .send_and_wait_for(SeatAction::Release(8), |a| matches!(a, SeatAction::Released(_)))
            .await
            .unwrap();

        assert_eq!(result, SeatAction::Released(8));
        assert!(started.elapsed() >= Duration::from_millis(2000));
        assert!(store.state(|s| s.held.is_empty()).await);
        assert_eq!(store.state(|s| s.released.clone()).await, vec![8]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_and_wait_for_timeout() {
        let store = seat_store();

        let result = store
            .send_and_wait_for_timeout(
                SeatAction::Ignore,
                |a| matches!(a, SeatAction::Held(_)),
                Duration::from_millis(100),
            )
            .await;

        assert_eq!(result, Err(StoreError::Timeout));
    }

    #[tokio::test]
    async fn test_shutdown_rejects_new_actions() {
        let store = seat_store();
        store.shutdown(Duration::from_secs(1)).await.unwrap();

        let result = store.send(SeatAction::Hold(1)).await;
        assert_eq!(result, Err(StoreError::ShutdownInProgress));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_lets_running_chains_finish() {
        let store = seat_store();
        store
            .send_and_wait_for(SeatAction::Hold(4), |a| matches!(a, SeatAction::Held(4)))
            .await
            .unwrap();

        let releasing = {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .send_and_wait_for(SeatAction::Release(4), |a| {
                        matches!(a, SeatAction::Released(4))
                    })
                    .await
            })
        };
        while store.pending_effects() == 0 {
            tokio::task::yield_now().await;
        }

        store.shutdown(Duration::from_secs(5)).await.unwrap();

        assert_eq!(releasing.await.unwrap(), Ok(SeatAction::Released(4)));
        assert_eq!(store.state(|s| s.released.clone()).await, vec![4]);
        assert_eq!(
            store.send(SeatAction::Hold(5)).await,
            Err(StoreError::ShutdownInProgress)
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_every_waiter_is_answered_past_broadcast_capacity() {
        let store = Store::with_broadcast_capacity(
            SeatState::default(),
            SeatReducer,
            SeatEnv {
                hold_for: Duration::from_millis(1),
            },
            1,
        );
        // An observer that never reads falls behind at once.
        let _idle_observer = store.subscribe_actions();

        let calls: Vec<_> = (0..300)
            .map(|seat| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .send_and_wait_for(SeatAction::Hold(seat), move |a| {
                            *a == SeatAction::Held(seat)
                        })
                        .await
                })
            })
            .collect();

        for (seat, call) in (0..300).zip(calls) {
            let answer = tokio::time::timeout(Duration::from_secs(5), call)
                .await
                .unwrap()
                .unwrap();
            assert_eq!(answer, Ok(SeatAction::Held(seat)));
        }
        assert_eq!(store.state(|s| s.held.len()).await, 300);
        assert_eq!(store.pending_waiters(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_out_waiters_are_forgotten() {
        let store = seat_store();
        store
            .send_and_wait_for_timeout(
                SeatAction::Ignore,
                |a| matches!(a, SeatAction::Held(_)),
                Duration::from_millis(100),
            )
            .await
            .unwrap_err();
        assert_eq!(store.pending_waiters(), 0);

        store
            .send_and_wait_for(SeatAction::Hold(2), |a| matches!(a, SeatAction::Held(2)))
            .await
            .unwrap();

        assert_eq!(store.pending_waiters(), 0);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let store = seat_store();
        let other = store.clone();

        store
            .send_and_wait_for(SeatAction::Hold(3), |a| matches!(a, SeatAction::Held(3)))
            .await
            .unwrap();

        assert_eq!(other.state(|s| s.held.len()).await, 1);
    }
}
