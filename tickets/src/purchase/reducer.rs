//! Purchase reducer.
//!
//! One attempt moves `Selecting → Paying → Issuing` and leaves state when it
//! completes, fails, or is cancelled. Every ledger call is its own effect and
//! its result comes back as the next action, so issuance runs strictly in
//! order: token class, holding account, one unit.

use super::actions::PurchaseAction;
use super::environment::PurchaseEnvironment;
use super::state::PurchaseState;
use crate::error::{LedgerError, PurchaseError};
use crate::metrics;
use crate::providers::{LedgerClient, Wallet};
use crate::types::{
    AccountHandle, IssuanceStage, OfferingId, PaymentMethod, PaymentReceipt, PurchaseOutcome,
    PurchasePhase, PurchaseRequest, RequestId, TokenClassHandle,
};
use reelmint_core::{effect::Effect, environment::Clock, reducer::Reducer, smallvec, SmallVec};
use std::marker::PhantomData;

type Effects = SmallVec<[Effect<PurchaseAction>; 4]>;

/// Reducer for the purchase workflow.
///
/// # Type Parameters
///
/// - `W`: wallet
/// - `L`: ledger client
/// - `C`: clock
#[derive(Debug, Clone, Copy)]
pub struct PurchaseReducer<W, L, C> {
    _phantom: PhantomData<(W, L, C)>,
}

impl<W, L, C> PurchaseReducer<W, L, C> {
    /// Create a new purchase reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<W, L, C> Default for PurchaseReducer<W, L, C> {
    fn default() -> Self {
        Self::new()
    }
}

fn reject(request_id: RequestId, error: PurchaseError) -> Effects {
    tracing::info!(%request_id, %error, "Purchase command rejected");
    metrics::record_purchase_rejected(&error);
    smallvec![Effect::dispatch(PurchaseAction::PurchaseRejected { request_id, error })]
}

fn issuance_failed(request_id: RequestId, stage: IssuanceStage, error: &LedgerError) -> PurchaseAction {
    PurchaseAction::PurchaseFailed {
        request_id,
        error: PurchaseError::IssuanceFailed {
            stage,
            reason: error.to_string(),
        },
    }
}

/// The attempt, if it is in `Selecting`.
fn selecting<'a>(
    state: &'a mut PurchaseState,
    request_id: RequestId,
    operation: &'static str,
) -> Result<&'a mut PurchaseRequest, PurchaseError> {
    let request = state
        .requests
        .get_mut(&request_id)
        .ok_or(PurchaseError::RequestNotFound { request_id })?;
    if request.phase != PurchasePhase::Selecting {
        return Err(PurchaseError::InvalidPhase {
            request_id,
            phase: request.phase,
            operation,
        });
    }
    Ok(request)
}

/// The attempt an effect result belongs to, if it is still in `phase`.
///
/// Results for attempts that moved on or no longer exist are logged and
/// dropped.
fn awaiting<'a>(
    state: &'a mut PurchaseState,
    request_id: RequestId,
    phase: PurchasePhase,
    event: &'static str,
) -> Option<&'a mut PurchaseRequest> {
    match state.requests.get_mut(&request_id) {
        Some(request) if request.phase == phase => Some(request),
        Some(request) => {
            tracing::warn!(%request_id, phase = %request.phase, event, "Ignoring result for attempt in another phase");
            None
        },
        None => {
            tracing::warn!(%request_id, event, "Ignoring result for unknown attempt");
            None
        },
    }
}

impl<W, L, C> PurchaseReducer<W, L, C>
where
    W: Wallet,
    L: LedgerClient,
    C: Clock,
{
    fn begin(
        state: &mut PurchaseState,
        request_id: RequestId,
        offering_id: OfferingId,
        env: &PurchaseEnvironment<W, L, C>,
    ) -> Effects {
        let Some(identity) = env.wallet.current_identity() else {
            return reject(request_id, PurchaseError::NotAuthenticated);
        };
        let Some(offering) = state.catalog.get(offering_id) else {
            return reject(request_id, PurchaseError::NotFound { offering_id });
        };
        if offering.is_issued() {
            return reject(request_id, PurchaseError::AlreadyIssued { offering_id });
        }
        if let Some(existing) = state.requests.get(&request_id) {
            return reject(
                request_id,
                PurchaseError::InvalidPhase {
                    request_id,
                    phase: existing.phase,
                    operation: "reopen",
                },
            );
        }

        let request = PurchaseRequest::new(request_id, offering_id, identity, env.clock.now());
        state.requests.insert(request_id, request.clone());

        tracing::info!(%request_id, %offering_id, identity = %request.identity, "Purchase opened");
        metrics::record_purchase_opened();
        smallvec![Effect::dispatch(PurchaseAction::PurchaseOpened { request })]
    }

    fn select(state: &mut PurchaseState, request_id: RequestId, method: PaymentMethod) -> Effects {
        match selecting(state, request_id, "change the payment method of") {
            Ok(request) => {
                request.method = Some(method);
                tracing::debug!(%request_id, %method, "Payment method selected");
                smallvec![Effect::dispatch(PurchaseAction::PaymentMethodSelected {
                    request_id,
                    method
                })]
            },
            Err(error) => reject(request_id, error),
        }
    }

    fn cancel(state: &mut PurchaseState, request_id: RequestId) -> Effects {
        if let Err(error) = selecting(state, request_id, "cancel") {
            return reject(request_id, error);
        }
        state.requests.remove(&request_id);

        tracing::info!(%request_id, "Purchase cancelled");
        metrics::record_purchase_cancelled();
        smallvec![Effect::dispatch(PurchaseAction::PurchaseCancelled { request_id })]
    }

    fn confirm(
        state: &mut PurchaseState,
        request_id: RequestId,
        env: &PurchaseEnvironment<W, L, C>,
    ) -> Effects {
        let (offering_id, identity, method) = match selecting(state, request_id, "confirm") {
            Ok(request) => (request.offering_id, request.identity.clone(), request.method),
            Err(error) => return reject(request_id, error),
        };
        let Some(method) = method else {
            return reject(request_id, PurchaseError::PaymentMethodNotSelected { request_id });
        };
        if env.wallet.current_identity().as_ref() != Some(&identity) {
            return reject(request_id, PurchaseError::NotAuthenticated);
        }
        let Some(price) = state.catalog.get(offering_id).map(|offering| offering.price) else {
            return reject(request_id, PurchaseError::NotFound { offering_id });
        };

        if let Some(request) = state.requests.get_mut(&request_id) {
            request.phase = PurchasePhase::Paying;
        }
        tracing::info!(%request_id, %offering_id, %method, %price, "Paying for ticket");

        match method {
            PaymentMethod::Crypto => {
                let ledger = env.ledger.clone();
                let destination = env.settings.destination.clone();
                smallvec![Effect::future(async move {
                    let action = match ledger.submit_transfer(&identity, &destination, price).await {
                        Ok(confirmation) => PurchaseAction::PaymentSettled {
                            request_id,
                            receipt: PaymentReceipt::Transfer {
                                signature: confirmation.signature,
                            },
                        },
                        Err(error) => PurchaseAction::PurchaseFailed {
                            request_id,
                            error: PurchaseError::PaymentFailed {
                                reason: error.to_string(),
                            },
                        },
                    };
                    Some(action)
                })]
            },
            PaymentMethod::CardSimulated => smallvec![Effect::Delay {
                duration: env.settings.card_processing_delay,
                action: Box::new(PurchaseAction::PaymentSettled {
                    request_id,
                    receipt: PaymentReceipt::Simulated {
                        reference: format!("card-{request_id}"),
                    },
                }),
            }],
        }
    }

    fn payment_settled(
        state: &mut PurchaseState,
        request_id: RequestId,
        receipt: PaymentReceipt,
        env: &PurchaseEnvironment<W, L, C>,
    ) -> Effects {
        let Some(request) = awaiting(state, request_id, PurchasePhase::Paying, "payment settled")
        else {
            return SmallVec::new();
        };
        request.receipt = Some(receipt);
        request.phase = PurchasePhase::Issuing;
        let identity = request.identity.clone();
        let method = request.method;
        let offering_id = request.offering_id;

        if let (Some(method), Some(offering)) = (method, state.catalog.get(offering_id)) {
            metrics::record_payment_settled(method, offering.price);
        }
        tracing::info!(%request_id, %offering_id, "Payment settled, issuing ticket");

        let ledger = env.ledger.clone();
        smallvec![Effect::future(async move {
            let action = match ledger.create_token_class(&identity, &identity, 0).await {
                Ok(token_class) => PurchaseAction::TokenClassCreated {
                    request_id,
                    token_class,
                },
                Err(error) => issuance_failed(request_id, IssuanceStage::CreateTokenClass, &error),
            };
            Some(action)
        })]
    }

    fn token_class_created(
        state: &mut PurchaseState,
        request_id: RequestId,
        token_class: TokenClassHandle,
        env: &PurchaseEnvironment<W, L, C>,
    ) -> Effects {
        let Some(request) = awaiting(state, request_id, PurchasePhase::Issuing, "token class created")
        else {
            return SmallVec::new();
        };
        if request.token_class.is_some() {
            tracing::warn!(%request_id, %token_class, "Ignoring second token class for attempt");
            return SmallVec::new();
        }
        request.token_class = Some(token_class.clone());
        let identity = request.identity.clone();
        tracing::debug!(%request_id, %token_class, "Token class created");

        let ledger = env.ledger.clone();
        smallvec![Effect::future(async move {
            let action = match ledger
                .ensure_holding_account(&identity, &token_class, &identity)
                .await
            {
                Ok(account) => PurchaseAction::HoldingAccountReady {
                    request_id,
                    account,
                },
                Err(error) => {
                    issuance_failed(request_id, IssuanceStage::EnsureHoldingAccount, &error)
                },
            };
            Some(action)
        })]
    }

    fn holding_account_ready(
        state: &mut PurchaseState,
        request_id: RequestId,
        account: AccountHandle,
        env: &PurchaseEnvironment<W, L, C>,
    ) -> Effects {
        let Some(request) =
            awaiting(state, request_id, PurchasePhase::Issuing, "holding account ready")
        else {
            return SmallVec::new();
        };
        let (Some(token), Some(method), Some(receipt), None) = (
            request.token_class.clone(),
            request.method,
            request.receipt.clone(),
            request.holding_account.as_ref(),
        ) else {
            tracing::warn!(%request_id, %account, "Ignoring holding account out of order");
            return SmallVec::new();
        };
        request.holding_account = Some(account.clone());
        let identity = request.identity.clone();
        tracing::debug!(%request_id, %account, "Holding account ready");

        let outcome = PurchaseOutcome {
            request_id,
            offering_id: request.offering_id,
            method,
            receipt,
            token,
            holding_account: account,
        };

        let ledger = env.ledger.clone();
        smallvec![Effect::future(async move {
            let issued = ledger
                .issue_units(
                    &identity,
                    &outcome.token,
                    &outcome.holding_account,
                    &identity,
                    1,
                )
                .await;
            let action = match issued {
                Ok(()) => PurchaseAction::PurchaseCompleted { outcome },
                Err(error) => issuance_failed(request_id, IssuanceStage::IssueUnit, &error),
            };
            Some(action)
        })]
    }

    fn completed(
        state: &mut PurchaseState,
        outcome: &PurchaseOutcome,
        env: &PurchaseEnvironment<W, L, C>,
    ) -> Effects {
        let request_id = outcome.request_id;
        let Some(request) = state.requests.remove(&request_id) else {
            tracing::warn!(%request_id, "Ignoring completion for unknown attempt");
            return SmallVec::new();
        };

        match state.catalog.get_mut(outcome.offering_id) {
            Some(offering) => {
                if offering.mark_issued(outcome.token.clone()) {
                    tracing::info!(
                        %request_id,
                        offering_id = %offering.id,
                        token = %outcome.token,
                        "Ticket issued"
                    );
                } else {
                    tracing::warn!(
                        %request_id,
                        offering_id = %offering.id,
                        token = %outcome.token,
                        kept = ?offering.token_identifier(),
                        "Offering already issued, keeping first token"
                    );
                }
            },
            None => {
                tracing::warn!(%request_id, offering_id = %outcome.offering_id, "Completed attempt for unknown offering");
            },
        }

        let elapsed = (env.clock.now() - request.opened_at)
            .to_std()
            .map_or(0.0, |d| d.as_secs_f64());
        metrics::record_purchase_completed(elapsed);
        SmallVec::new()
    }

    fn failed(state: &mut PurchaseState, request_id: RequestId, error: &PurchaseError) -> Effects {
        let Some(request) = state.requests.remove(&request_id) else {
            tracing::warn!(%request_id, %error, "Ignoring failure for unknown attempt");
            return SmallVec::new();
        };

        if error.paid_but_unissued() {
            tracing::warn!(
                %request_id,
                offering_id = %request.offering_id,
                identity = %request.identity,
                receipt = ?request.receipt,
                %error,
                "Buyer was charged but no ticket was issued; payment is not refunded"
            );
        } else {
            tracing::info!(%request_id, offering_id = %request.offering_id, %error, "Purchase failed");
        }
        metrics::record_purchase_failed(request.method, error);
        SmallVec::new()
    }
}

impl<W, L, C> Reducer for PurchaseReducer<W, L, C>
where
    W: Wallet,
    L: LedgerClient,
    C: Clock,
{
    type State = PurchaseState;
    type Action = PurchaseAction;
    type Environment = PurchaseEnvironment<W, L, C>;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ========== Commands ==========
            PurchaseAction::BeginPurchase {
                request_id,
                offering_id,
            } => Self::begin(state, request_id, offering_id, env),
            PurchaseAction::SelectPaymentMethod { request_id, method } => {
                Self::select(state, request_id, method)
            },
            PurchaseAction::ConfirmPurchase { request_id } => Self::confirm(state, request_id, env),
            PurchaseAction::CancelPurchase { request_id } => Self::cancel(state, request_id),

            // ========== Effect results ==========
            PurchaseAction::PaymentSettled { request_id, receipt } => {
                Self::payment_settled(state, request_id, receipt, env)
            },
            PurchaseAction::TokenClassCreated {
                request_id,
                token_class,
            } => Self::token_class_created(state, request_id, token_class, env),
            PurchaseAction::HoldingAccountReady { request_id, account } => {
                Self::holding_account_ready(state, request_id, account, env)
            },
            PurchaseAction::PurchaseCompleted { outcome } => Self::completed(state, &outcome, env),
            PurchaseAction::PurchaseFailed { request_id, error } => {
                Self::failed(state, request_id, &error)
            },

            // Answers to commands; state already reflects them.
            PurchaseAction::PurchaseOpened { .. }
            | PurchaseAction::PaymentMethodSelected { .. }
            | PurchaseAction::PurchaseCancelled { .. }
            | PurchaseAction::PurchaseRejected { .. } => SmallVec::new(),
        }
    }
}
