//! Domain types for the movie ticket purchase workflow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Identifiers and handles
// ============================================================================

/// Catalog-assigned offering identifier (stable within a catalog)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OfferingId(u32);

impl OfferingId {
    /// Wrap a raw catalog id
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Raw catalog id
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for OfferingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of one purchase attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Fresh random request id
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Underlying UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

macro_rules! string_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a ledger-issued string
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Borrow the underlying string
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

string_handle!(
    /// Public key of the signer authorizing payments and receiving tickets
    Identity
);
string_handle!(
    /// Ledger account address (payment destination)
    Address
);
string_handle!(
    /// Handle of a token class (mint) created for one ticket
    TokenClassHandle
);
string_handle!(
    /// Handle of a holding account for a token class
    AccountHandle
);

impl Identity {
    /// The identity's own ledger account
    #[must_use]
    pub fn address(&self) -> Address {
        Address(self.0.clone())
    }
}

// ============================================================================
// Money
// ============================================================================

/// Amount in the ledger's smallest currency unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Lamports(u64);

impl Lamports {
    /// Lamports in one SOL
    pub const PER_SOL: u64 = 1_000_000_000;

    /// Wrap a raw lamport amount
    #[must_use]
    pub const fn new(lamports: u64) -> Self {
        Self(lamports)
    }

    /// Convert a SOL amount, rounding to the nearest lamport
    ///
    /// Returns `None` for non-finite, non-positive, or out-of-range amounts,
    /// and for amounts that round to zero lamports.
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // PER_SOL is exactly representable
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // range checked
    pub fn from_sol(sol: f64) -> Option<Self> {
        if !sol.is_finite() || sol <= 0.0 {
            return None;
        }
        let lamports = (sol * Self::PER_SOL as f64).round();
        if lamports < 1.0 || lamports >= u64::MAX as f64 {
            return None;
        }
        Some(Self(lamports as u64))
    }

    /// Raw lamport amount
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Checked subtraction
    #[must_use]
    pub const fn checked_sub(self, other: Self) -> Option<Self> {
        match self.0.checked_sub(other.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Saturating addition
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

/// Renders as SOL without trailing zeros, e.g. `0.5 SOL`
impl fmt::Display for Lamports {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / Self::PER_SOL;
        let frac = self.0 % Self::PER_SOL;
        if frac == 0 {
            return write!(f, "{whole} SOL");
        }
        let digits = format!("{frac:09}");
        write!(f, "{whole}.{} SOL", digits.trim_end_matches('0'))
    }
}

// ============================================================================
// Offerings
// ============================================================================

/// Whether a ticket token has been issued for an offering
///
/// The token handle lives inside `Issued`, so an issued offering always has
/// one and an unissued offering never does.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IssuanceState {
    /// No ticket token yet
    #[default]
    NotIssued,
    /// Ticket token issued
    Issued {
        /// Token class created for this ticket
        token: TokenClassHandle,
    },
}

/// One purchasable showtime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketOffering {
    /// Catalog id
    pub id: OfferingId,
    /// Film title
    pub title: String,
    /// Synopsis
    pub description: String,
    /// Poster image URL
    pub image_url: String,
    /// Theater name
    pub theater: String,
    /// Seat label
    pub seat: String,
    /// Ticket price
    pub price: Lamports,
    /// Start of the screening
    pub showtime: DateTime<Utc>,
    issuance: IssuanceState,
}

impl TicketOffering {
    /// Create an unissued offering
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub const fn new(
        id: OfferingId,
        title: String,
        description: String,
        image_url: String,
        theater: String,
        seat: String,
        price: Lamports,
        showtime: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title,
            description,
            image_url,
            theater,
            seat,
            price,
            showtime,
            issuance: IssuanceState::NotIssued,
        }
    }

    /// Current issuance state
    #[must_use]
    pub const fn issuance(&self) -> &IssuanceState {
        &self.issuance
    }

    /// True once a ticket token has been issued
    #[must_use]
    pub const fn is_issued(&self) -> bool {
        matches!(self.issuance, IssuanceState::Issued { .. })
    }

    /// The issued token class, if any
    #[must_use]
    pub const fn token_identifier(&self) -> Option<&TokenClassHandle> {
        match &self.issuance {
            IssuanceState::Issued { token } => Some(token),
            IssuanceState::NotIssued => None,
        }
    }

    /// Record the issued token
    ///
    /// Returns `false` and leaves the offering untouched if it was already
    /// issued.
    pub(crate) fn mark_issued(&mut self, token: TokenClassHandle) -> bool {
        if self.is_issued() {
            return false;
        }
        self.issuance = IssuanceState::Issued { token };
        true
    }
}

// ============================================================================
// Payment
// ============================================================================

/// How the buyer pays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    /// Native-currency transfer on the ledger
    Crypto,
    /// Simulated card charge (no external call)
    CardSimulated,
}

impl PaymentMethod {
    /// Methods in the order the chooser lists them
    pub const ALL: [Self; 2] = [Self::Crypto, Self::CardSimulated];

    /// Chooser label
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Crypto => "Pay with SOL",
            Self::CardSimulated => "Credit/Debit Card",
        }
    }

    /// Chooser description
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Crypto => "Pay directly with Solana (SOL)",
            Self::CardSimulated => "Pay with traditional payment methods",
        }
    }

    /// Chooser icon
    #[must_use]
    pub const fn icon(self) -> &'static str {
        match self {
            Self::Crypto => "🟣",
            Self::CardSimulated => "💳",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Crypto => f.write_str("crypto"),
            Self::CardSimulated => f.write_str("card"),
        }
    }
}

/// Proof that the payment leg settled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentReceipt {
    /// Confirmed ledger transfer
    Transfer {
        /// Transaction signature
        signature: String,
    },
    /// Simulated card charge
    Simulated {
        /// Local reference for the simulated charge
        reference: String,
    },
}

// ============================================================================
// Purchase attempts
// ============================================================================

/// Phase of an in-flight purchase attempt
///
/// A request only exists while it is in one of these phases; completion and
/// failure end the attempt and are reported through its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PurchasePhase {
    /// Opened; payment method may be chosen, confirmed, or cancelled
    Selecting,
    /// Payment leg in flight
    Paying,
    /// Payment settled, issuance primitives in flight
    Issuing,
}

impl fmt::Display for PurchasePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Selecting => f.write_str("selecting"),
            Self::Paying => f.write_str("paying"),
            Self::Issuing => f.write_str("issuing"),
        }
    }
}

/// Issuance primitive, in the order they are invoked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssuanceStage {
    /// Create the ticket's token class
    CreateTokenClass,
    /// Create or fetch the buyer's holding account
    EnsureHoldingAccount,
    /// Issue exactly one unit into the holding account
    IssueUnit,
}

impl fmt::Display for IssuanceStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateTokenClass => f.write_str("create token class"),
            Self::EnsureHoldingAccount => f.write_str("ensure holding account"),
            Self::IssueUnit => f.write_str("issue unit"),
        }
    }
}

/// One purchase attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseRequest {
    /// Attempt id
    pub request_id: RequestId,
    /// Offering being bought
    pub offering_id: OfferingId,
    /// Buyer identity captured when the attempt opened
    pub identity: Identity,
    /// Chosen payment method
    pub method: Option<PaymentMethod>,
    /// Current phase
    pub phase: PurchasePhase,
    /// When the attempt opened
    pub opened_at: DateTime<Utc>,
    /// Set once the payment leg settles
    pub receipt: Option<PaymentReceipt>,
    /// Set once the token class exists
    pub token_class: Option<TokenClassHandle>,
    /// Set once the holding account exists
    pub holding_account: Option<AccountHandle>,
}

impl PurchaseRequest {
    /// New attempt in `Selecting`
    #[must_use]
    pub const fn new(
        request_id: RequestId,
        offering_id: OfferingId,
        identity: Identity,
        opened_at: DateTime<Utc>,
    ) -> Self {
        Self {
            request_id,
            offering_id,
            identity,
            method: None,
            phase: PurchasePhase::Selecting,
            opened_at,
            receipt: None,
            token_class: None,
            holding_account: None,
        }
    }
}

/// Result of a completed purchase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseOutcome {
    /// Attempt id
    pub request_id: RequestId,
    /// Offering bought
    pub offering_id: OfferingId,
    /// How it was paid
    pub method: PaymentMethod,
    /// Payment proof
    pub receipt: PaymentReceipt,
    /// Ticket token class
    pub token: TokenClassHandle,
    /// Account holding the ticket unit
    pub holding_account: AccountHandle,
}
