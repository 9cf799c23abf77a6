//! Error types for the ticket purchase workflow.

use crate::types::{IssuanceStage, OfferingId, PurchasePhase, RequestId};
use thiserror::Error;

/// Result type alias for purchase operations.
pub type Result<T> = std::result::Result<T, PurchaseError>;

/// Why a purchase operation failed.
///
/// Every variant ends the attempt it was raised for. Display strings are
/// shown to buyers as-is.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PurchaseError {
    // ═══════════════════════════════════════════════════════════
    // Validation Errors (no side effects happened)
    // ═══════════════════════════════════════════════════════════

    /// No wallet is connected, or it changed since the attempt opened.
    #[error("Please connect your wallet first")]
    NotAuthenticated,

    /// Offering id is not in the catalog.
    #[error("Ticket {offering_id} not found")]
    NotFound {
        /// Requested offering
        offering_id: OfferingId,
    },

    /// Offering already has its ticket token.
    #[error("Ticket {offering_id} has already been purchased")]
    AlreadyIssued {
        /// Requested offering
        offering_id: OfferingId,
    },

    /// No in-flight attempt with this id.
    #[error("Purchase request {request_id} not found")]
    RequestNotFound {
        /// Requested attempt
        request_id: RequestId,
    },

    /// Operation is not allowed in the attempt's current phase.
    #[error("Cannot {operation} purchase request {request_id} while {phase}")]
    InvalidPhase {
        /// Attempt id
        request_id: RequestId,
        /// Phase the attempt was in
        phase: PurchasePhase,
        /// Operation that was refused
        operation: &'static str,
    },

    /// Confirm was called before a payment method was chosen.
    #[error("Select a payment method before confirming request {request_id}")]
    PaymentMethodNotSelected {
        /// Attempt id
        request_id: RequestId,
    },

    // ═══════════════════════════════════════════════════════════
    // Ledger Errors
    // ═══════════════════════════════════════════════════════════

    /// Payment leg did not settle. No money moved, no ticket issued.
    #[error("Payment failed: {reason}")]
    PaymentFailed {
        /// Ledger or processor message
        reason: String,
    },

    /// Payment settled but the ticket could not be issued.
    #[error("Ticket issuance failed at {stage}: {reason}")]
    IssuanceFailed {
        /// Primitive that failed
        stage: IssuanceStage,
        /// Ledger message
        reason: String,
    },

    // ═══════════════════════════════════════════════════════════
    // Runtime Errors
    // ═══════════════════════════════════════════════════════════

    /// The purchase store stopped before answering.
    #[error("Purchase service unavailable: {reason}")]
    Runtime {
        /// Store error message
        reason: String,
    },
}

impl PurchaseError {
    /// True when the buyer was charged but holds no ticket.
    ///
    /// Payment is never rolled back, so this gap has to be surfaced to the
    /// caller and reconciled out of band.
    #[must_use]
    pub const fn paid_but_unissued(&self) -> bool {
        matches!(self, Self::IssuanceFailed { .. })
    }

    /// Short label used as a metrics tag.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NotAuthenticated => "not_authenticated",
            Self::NotFound { .. } => "not_found",
            Self::AlreadyIssued { .. } => "already_issued",
            Self::RequestNotFound { .. } => "request_not_found",
            Self::InvalidPhase { .. } => "invalid_phase",
            Self::PaymentMethodNotSelected { .. } => "method_not_selected",
            Self::PaymentFailed { .. } => "payment_failed",
            Self::IssuanceFailed { .. } => "issuance_failed",
            Self::Runtime { .. } => "runtime",
        }
    }
}

impl From<reelmint_runtime::StoreError> for PurchaseError {
    fn from(error: reelmint_runtime::StoreError) -> Self {
        Self::Runtime {
            reason: error.to_string(),
        }
    }
}

/// Failure reported by a ledger client.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Payer balance does not cover the amount.
    #[error("Insufficient funds: balance {balance} lamports, needed {needed}")]
    InsufficientFunds {
        /// Current balance
        balance: u64,
        /// Amount required
        needed: u64,
    },

    /// Ledger refused the instruction.
    #[error("Transaction rejected: {reason}")]
    Rejected {
        /// Ledger message
        reason: String,
    },

    /// Submitted but never confirmed.
    #[error("Transaction {signature} was not confirmed")]
    NotConfirmed {
        /// Submitted signature
        signature: String,
    },

    /// Account or authority does not belong to the token class.
    #[error("Account mismatch: {reason}")]
    AccountMismatch {
        /// What did not match
        reason: String,
    },

    /// Ledger could not be reached.
    #[error("Ledger unavailable: {reason}")]
    Unavailable {
        /// Transport message
        reason: String,
    },
}

/// Failure loading a catalog feed.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Price is zero, negative, or not a number.
    #[error("Offering {offering_id} has invalid price {price}")]
    InvalidPrice {
        /// Offending record
        offering_id: OfferingId,
        /// Price in SOL as supplied
        price: f64,
    },

    /// Showtime is not RFC 3339.
    #[error("Offering {offering_id} has invalid showtime {showtime:?}")]
    InvalidShowtime {
        /// Offending record
        offering_id: OfferingId,
        /// Showtime as supplied
        showtime: String,
    },

    /// Two records share an id.
    #[error("Duplicate offering id {offering_id}")]
    DuplicateId {
        /// Repeated id
        offering_id: OfferingId,
    },

    /// Feed file could not be read.
    #[error("Failed to read catalog feed: {0}")]
    Io(#[from] std::io::Error),

    /// Feed file is not valid JSON.
    #[error("Failed to parse catalog feed: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Invalid configuration value.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Environment variable is set but unparseable.
    #[error("Invalid value {value:?} for {key}")]
    Invalid {
        /// Variable name
        key: &'static str,
        /// Value found
        value: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_issuance_failure_is_paid_but_unissued() {
        let issuance = PurchaseError::IssuanceFailed {
            stage: IssuanceStage::EnsureHoldingAccount,
            reason: "boom".to_string(),
        };
        assert!(issuance.paid_but_unissued());
        assert!(!PurchaseError::PaymentFailed { reason: "declined".to_string() }.paid_but_unissued());
        assert!(!PurchaseError::NotAuthenticated.paid_but_unissued());
    }

    #[test]
    fn test_display_is_user_presentable() {
        assert_eq!(
            PurchaseError::NotAuthenticated.to_string(),
            "Please connect your wallet first"
        );
        let err = PurchaseError::IssuanceFailed {
            stage: IssuanceStage::IssueUnit,
            reason: "authority mismatch".to_string(),
        };
        assert_eq!(err.to_string(), "Ticket issuance failed at issue unit: authority mismatch");
    }

    #[test]
    fn test_store_error_maps_to_runtime() {
        let err = PurchaseError::from(reelmint_runtime::StoreError::ChannelClosed);
        assert!(matches!(err, PurchaseError::Runtime { .. }));
        assert_eq!(err.kind(), "runtime");
    }
}
