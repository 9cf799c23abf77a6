//! # Reelmint
//!
//! Buy a movie ticket and receive it as a one-of-one token on a Solana-style
//! ledger.
//!
//! ## Features
//!
//! - **Catalog**: showtimes from a built-in list or a JSON feed
//! - **Two payment methods**: SOL transfer, or a simulated card charge
//! - **Issuance**: a fresh token class per ticket, one unit into the buyer's
//!   holding account
//! - **Testable**: wallet and ledger are traits, with mocks and an in-memory
//!   ledger
//!
//! ## Architecture
//!
//! The purchase workflow is a reducer running in a store:
//!
//! ```text
//! Command → Reducer → (State, Effects) → Ledger call → Event → Reducer → ...
//! ```
//!
//! [`PurchaseOrchestrator`] turns that loop into plain async calls.
//!
//! ## Example
//!
//! ```rust,ignore
//! use reelmint::*;
//!
//! let orchestrator = PurchaseOrchestrator::new(catalog, env);
//!
//! let request = orchestrator.begin_purchase(OfferingId::new(1)).await?;
//! orchestrator
//!     .select_payment_method(request.request_id, PaymentMethod::Crypto)
//!     .await?;
//! let outcome = orchestrator.confirm_purchase(request.request_id).await?;
//!
//! println!("{}", share::share_text(&offering, &outcome.token));
//! ```

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

pub mod catalog;
pub mod config;
pub mod error;
pub mod metrics;
pub mod providers;
pub mod purchase;
pub mod share;
pub mod simulated;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;

pub use catalog::{Catalog, CatalogFeed, JsonCatalogFeed, StaticCatalogFeed};
pub use config::Config;
pub use error::{CatalogError, ConfigError, LedgerError, PurchaseError, Result};
pub use providers::{LedgerClient, SessionWallet, Wallet};
pub use purchase::{PurchaseEnvironment, PurchaseOrchestrator, PurchaseSettings};
pub use simulated::SimulatedLedger;
pub use types::{
    AccountHandle, Address, Identity, IssuanceStage, IssuanceState, Lamports, OfferingId,
    PaymentMethod, PaymentReceipt, PurchaseOutcome, PurchasePhase, PurchaseRequest, RequestId,
    TicketOffering, TokenClassHandle,
};
