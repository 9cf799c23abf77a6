//! Mock provider implementations for testing.
//!
//! In-memory, deterministic implementations of the provider traits for unit
//! and integration tests.

pub mod ledger;

pub use ledger::{LedgerCall, MockLedgerClient};
