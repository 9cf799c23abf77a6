//! Purchase actions (commands + events).

use crate::error::PurchaseError;
use crate::types::{
    AccountHandle, OfferingId, PaymentMethod, PaymentReceipt, PurchaseOutcome, PurchaseRequest,
    RequestId, TokenClassHandle,
};

/// Actions for the purchase workflow.
///
/// Commands come from the orchestrator. Events come back from effects, or
/// are dispatched by the reducer itself to answer a command.
#[derive(Clone, Debug, PartialEq)]
pub enum PurchaseAction {
    // ═══════════════════════════════════════════════════════════
    // Commands
    // ═══════════════════════════════════════════════════════════

    /// Open an attempt to buy `offering_id`.
    BeginPurchase {
        /// Id for the new attempt
        request_id: RequestId,
        /// Offering to buy
        offering_id: OfferingId,
    },

    /// Choose or change the payment method.
    SelectPaymentMethod {
        /// Attempt
        request_id: RequestId,
        /// Chosen method
        method: PaymentMethod,
    },

    /// Pay and issue the ticket.
    ConfirmPurchase {
        /// Attempt
        request_id: RequestId,
    },

    /// Abandon an attempt before paying.
    CancelPurchase {
        /// Attempt
        request_id: RequestId,
    },

    // ═══════════════════════════════════════════════════════════
    // Events
    // ═══════════════════════════════════════════════════════════

    /// Attempt opened in `Selecting`.
    PurchaseOpened {
        /// Snapshot of the new attempt
        request: PurchaseRequest,
    },

    /// Payment method recorded.
    PaymentMethodSelected {
        /// Attempt
        request_id: RequestId,
        /// Chosen method
        method: PaymentMethod,
    },

    /// Attempt discarded before paying.
    PurchaseCancelled {
        /// Attempt
        request_id: RequestId,
    },

    /// Payment leg settled.
    PaymentSettled {
        /// Attempt
        request_id: RequestId,
        /// Payment proof
        receipt: PaymentReceipt,
    },

    /// Ticket token class exists.
    TokenClassCreated {
        /// Attempt
        request_id: RequestId,
        /// New token class
        token_class: TokenClassHandle,
    },

    /// Buyer's holding account exists.
    HoldingAccountReady {
        /// Attempt
        request_id: RequestId,
        /// Holding account
        account: AccountHandle,
    },

    /// Ticket unit issued; the attempt succeeded.
    PurchaseCompleted {
        /// Everything the buyer needs about the ticket
        outcome: PurchaseOutcome,
    },

    /// The attempt failed after confirmation.
    PurchaseFailed {
        /// Attempt
        request_id: RequestId,
        /// Why
        error: PurchaseError,
    },

    /// A command was refused; nothing changed.
    PurchaseRejected {
        /// Attempt the command named
        request_id: RequestId,
        /// Why
        error: PurchaseError,
    },
}

impl PurchaseAction {
    /// The attempt this action concerns.
    #[must_use]
    pub const fn request_id(&self) -> RequestId {
        match self {
            Self::BeginPurchase { request_id, .. }
            | Self::SelectPaymentMethod { request_id, .. }
            | Self::ConfirmPurchase { request_id }
            | Self::CancelPurchase { request_id }
            | Self::PaymentMethodSelected { request_id, .. }
            | Self::PurchaseCancelled { request_id }
            | Self::PaymentSettled { request_id, .. }
            | Self::TokenClassCreated { request_id, .. }
            | Self::HoldingAccountReady { request_id, .. }
            | Self::PurchaseFailed { request_id, .. }
            | Self::PurchaseRejected { request_id, .. } => *request_id,
            Self::PurchaseOpened { request } => request.request_id,
            Self::PurchaseCompleted { outcome } => outcome.request_id,
        }
    }

    /// True for the action that ends a `ConfirmPurchase` of `request_id`.
    #[must_use]
    pub fn ends_confirmation(&self, request_id: RequestId) -> bool {
        self.request_id() == request_id
            && matches!(
                self,
                Self::PurchaseCompleted { .. }
                    | Self::PurchaseFailed { .. }
                    | Self::PurchaseRejected { .. }
            )
    }

    /// True for commands.
    #[must_use]
    pub const fn is_command(&self) -> bool {
        matches!(
            self,
            Self::BeginPurchase { .. }
                | Self::SelectPaymentMethod { .. }
                | Self::ConfirmPurchase { .. }
                | Self::CancelPurchase { .. }
        )
    }
}
