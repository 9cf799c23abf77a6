//! Request/response facade over the purchase store.

use super::actions::PurchaseAction;
use super::environment::PurchaseEnvironment;
use super::reducer::PurchaseReducer;
use super::state::PurchaseState;
use crate::catalog::Catalog;
use crate::error::{PurchaseError, Result};
use crate::providers::{LedgerClient, Wallet};
use crate::types::{
    OfferingId, PaymentMethod, PurchaseOutcome, PurchaseRequest, RequestId, TicketOffering,
};
use reelmint_core::environment::Clock;
use reelmint_runtime::Store;
use std::time::Duration;

/// Store running the purchase reducer.
pub type PurchaseStore<W, L, C> = Store<
    PurchaseState,
    PurchaseAction,
    PurchaseEnvironment<W, L, C>,
    PurchaseReducer<W, L, C>,
>;

/// Entry point for buying tickets.
///
/// Each operation sends one command and returns once the store has reduced
/// its answer, so state reads right after a call observe its effect.
/// `confirm_purchase` waits for the whole payment and issuance sequence,
/// without a deadline.
pub struct PurchaseOrchestrator<W, L, C>
where
    W: Wallet + 'static,
    L: LedgerClient,
    C: Clock + 'static,
{
    store: PurchaseStore<W, L, C>,
}

impl<W, L, C> Clone for PurchaseOrchestrator<W, L, C>
where
    W: Wallet + 'static,
    L: LedgerClient,
    C: Clock + 'static,
{
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

fn unexpected(action: &PurchaseAction) -> PurchaseError {
    PurchaseError::Runtime {
        reason: format!("unexpected answer {action:?}"),
    }
}

impl<W, L, C> PurchaseOrchestrator<W, L, C>
where
    W: Wallet + 'static,
    L: LedgerClient,
    C: Clock + 'static,
{
    /// Orchestrator over `catalog`, using `env` for identity, ledger and time.
    #[must_use]
    pub fn new(catalog: Catalog, env: PurchaseEnvironment<W, L, C>) -> Self {
        Self {
            store: Store::new(PurchaseState::new(catalog), PurchaseReducer::new(), env),
        }
    }

    /// The underlying store.
    #[must_use]
    pub const fn store(&self) -> &PurchaseStore<W, L, C> {
        &self.store
    }

    /// Every offering, in catalog order.
    pub async fn list_offerings(&self) -> Vec<TicketOffering> {
        self.store
            .state(|state| state.catalog().list().cloned().collect())
            .await
    }

    /// One offering.
    ///
    /// # Errors
    ///
    /// Returns [`PurchaseError::NotFound`] for ids not in the catalog.
    pub async fn get_offering(&self, offering_id: OfferingId) -> Result<TicketOffering> {
        self.store
            .state(|state| state.offering(offering_id).cloned())
            .await
            .ok_or(PurchaseError::NotFound { offering_id })
    }

    /// In-flight attempt, if it still exists.
    pub async fn request(&self, request_id: RequestId) -> Option<PurchaseRequest> {
        self.store
            .state(|state| state.request(request_id).cloned())
            .await
    }

    /// Open an attempt to buy `offering_id` as the connected identity.
    ///
    /// # Errors
    ///
    /// - [`PurchaseError::NotAuthenticated`]: no wallet connected
    /// - [`PurchaseError::NotFound`]: unknown offering
    /// - [`PurchaseError::AlreadyIssued`]: ticket already sold
    #[tracing::instrument(skip(self))]
    pub async fn begin_purchase(&self, offering_id: OfferingId) -> Result<PurchaseRequest> {
        let request_id = RequestId::new();
        let answer = self
            .store
            .send_and_wait_for(
                PurchaseAction::BeginPurchase {
                    request_id,
                    offering_id,
                },
                move |action| {
                    action.request_id() == request_id
                        && matches!(
                            action,
                            PurchaseAction::PurchaseOpened { .. }
                                | PurchaseAction::PurchaseRejected { .. }
                        )
                },
            )
            .await?;

        match answer {
            PurchaseAction::PurchaseOpened { request } => Ok(request),
            PurchaseAction::PurchaseRejected { error, .. } => Err(error),
            other => Err(unexpected(&other)),
        }
    }

    /// Choose or change the payment method of an open attempt.
    ///
    /// # Errors
    ///
    /// - [`PurchaseError::RequestNotFound`]: unknown attempt
    /// - [`PurchaseError::InvalidPhase`]: attempt already confirmed
    #[tracing::instrument(skip(self))]
    pub async fn select_payment_method(
        &self,
        request_id: RequestId,
        method: PaymentMethod,
    ) -> Result<()> {
        let answer = self
            .store
            .send_and_wait_for(
                PurchaseAction::SelectPaymentMethod { request_id, method },
                move |action| {
                    action.request_id() == request_id
                        && matches!(
                            action,
                            PurchaseAction::PaymentMethodSelected { .. }
                                | PurchaseAction::PurchaseRejected { .. }
                        )
                },
            )
            .await?;

        match answer {
            PurchaseAction::PaymentMethodSelected { .. } => Ok(()),
            PurchaseAction::PurchaseRejected { error, .. } => Err(error),
            other => Err(unexpected(&other)),
        }
    }

    /// Pay for the attempt and issue its ticket.
    ///
    /// Returns once the ticket is issued or the attempt has failed. A failed
    /// attempt is gone; retrying starts again from
    /// [`begin_purchase`](Self::begin_purchase).
    ///
    /// # Errors
    ///
    /// - [`PurchaseError::RequestNotFound`] / [`PurchaseError::InvalidPhase`]
    /// - [`PurchaseError::PaymentMethodNotSelected`]
    /// - [`PurchaseError::NotAuthenticated`]: wallet disconnected or switched
    /// - [`PurchaseError::PaymentFailed`]: nothing was charged
    /// - [`PurchaseError::IssuanceFailed`]: charged, no ticket
    #[tracing::instrument(skip(self))]
    pub async fn confirm_purchase(&self, request_id: RequestId) -> Result<PurchaseOutcome> {
        let answer = self
            .store
            .send_and_wait_for(PurchaseAction::ConfirmPurchase { request_id }, move |action| {
                action.ends_confirmation(request_id)
            })
            .await?;

        match answer {
            PurchaseAction::PurchaseCompleted { outcome } => Ok(outcome),
            PurchaseAction::PurchaseFailed { error, .. }
            | PurchaseAction::PurchaseRejected { error, .. } => Err(error),
            other => Err(unexpected(&other)),
        }
    }

    /// Abandon an attempt that has not been confirmed.
    ///
    /// # Errors
    ///
    /// - [`PurchaseError::RequestNotFound`]: unknown attempt
    /// - [`PurchaseError::InvalidPhase`]: attempt already confirmed
    #[tracing::instrument(skip(self))]
    pub async fn cancel_purchase(&self, request_id: RequestId) -> Result<()> {
        let answer = self
            .store
            .send_and_wait_for(PurchaseAction::CancelPurchase { request_id }, move |action| {
                action.request_id() == request_id
                    && matches!(
                        action,
                        PurchaseAction::PurchaseCancelled { .. }
                            | PurchaseAction::PurchaseRejected { .. }
                    )
            })
            .await?;

        match answer {
            PurchaseAction::PurchaseCancelled { .. } => Ok(()),
            PurchaseAction::PurchaseRejected { error, .. } => Err(error),
            other => Err(unexpected(&other)),
        }
    }

    /// Stop accepting commands and wait for in-flight ledger calls.
    ///
    /// Attempts already confirmed keep going to completion or failure, and
    /// their `confirm_purchase` callers get that answer. New commands fail
    /// with [`PurchaseError::Runtime`].
    ///
    /// # Errors
    ///
    /// Returns [`PurchaseError::Runtime`] if calls are still running after
    /// `timeout`.
    pub async fn shutdown(&self, timeout: Duration) -> Result<()> {
        self.store.shutdown(timeout).await.map_err(PurchaseError::from)
    }
}
