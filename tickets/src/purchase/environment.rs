//! Purchase environment.

use crate::providers::{LedgerClient, Wallet};
use crate::types::Address;
use reelmint_core::environment::Clock;
use std::time::Duration;

/// Fixed parameters of the purchase workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseSettings {
    /// Where crypto payments are sent
    pub destination: Address,
    /// How long a simulated card charge takes
    pub card_processing_delay: Duration,
}

impl Default for PurchaseSettings {
    fn default() -> Self {
        Self {
            destination: Address::new(crate::config::DEFAULT_DESTINATION),
            card_processing_delay: Duration::from_millis(crate::config::DEFAULT_CARD_DELAY_MS),
        }
    }
}

/// Purchase environment.
///
/// # Type Parameters
///
/// - `W`: wallet (identity source)
/// - `L`: ledger client
/// - `C`: clock
#[derive(Clone)]
pub struct PurchaseEnvironment<W, L, C>
where
    W: Wallet,
    L: LedgerClient,
    C: Clock,
{
    /// Connected signer.
    pub wallet: W,

    /// Ledger for payment and issuance.
    pub ledger: L,

    /// Clock for attempt timestamps.
    pub clock: C,

    /// Destination and card delay.
    pub settings: PurchaseSettings,
}

impl<W, L, C> PurchaseEnvironment<W, L, C>
where
    W: Wallet,
    L: LedgerClient,
    C: Clock,
{
    /// Create a new purchase environment.
    #[must_use]
    pub const fn new(wallet: W, ledger: L, clock: C, settings: PurchaseSettings) -> Self {
        Self {
            wallet,
            ledger,
            clock,
            settings,
        }
    }
}
