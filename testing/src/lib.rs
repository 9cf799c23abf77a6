//! # Reelmint Testing
//!
//! Testing utilities for reelmint reducers:
//! - [`ReducerTest`]: Given-When-Then harness for single transitions
//! - [`reducer_test::assertions`]: effect assertions
//! - [`drive`]: run effects to completion without a Store
//! - [`FixedClock`]: deterministic time
//!
//! Domain mocks (wallet, ledger client) live next to the traits they
//! implement, in `reelmint::mocks`.

use chrono::{DateTime, Utc};
use reelmint_core::environment::Clock;

pub mod reducer_test;

/// Mock implementations of environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// # Example
    ///
    /// ```
    /// use reelmint_testing::mocks::FixedClock;
    /// use reelmint_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Fixed clock at 2024-01-15 12:00:00 UTC, the morning of the first
    /// built-in showtime
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(DateTime::<Utc>::from_timestamp(1_705_320_000, 0).unwrap_or_default())
    }
}

pub use mocks::{FixedClock, test_clock};
pub use reducer_test::{ReducerTest, assertions, drive};
