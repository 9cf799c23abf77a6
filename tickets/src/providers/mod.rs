//! Providers the purchase workflow depends on.
//!
//! The reducer only sees these traits. The demo binary wires in
//! [`SessionWallet`] and the in-memory [`crate::simulated::SimulatedLedger`];
//! tests use [`crate::mocks`].

pub mod ledger;
pub mod wallet;

pub use ledger::{LedgerClient, TransferConfirmation};
pub use wallet::{SessionWallet, Wallet};
