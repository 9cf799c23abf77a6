//! End-to-end purchases against the in-memory ledger.

#![allow(clippy::unwrap_used)]

use reelmint::purchase::PurchaseSettings;
use reelmint::{
    Address, Catalog, Identity, Lamports, OfferingId, PaymentMethod, PurchaseEnvironment,
    PurchaseError, PurchaseOrchestrator, SessionWallet, SimulatedLedger, StaticCatalogFeed,
};
use reelmint_core::environment::SystemClock;
use std::time::Duration;

const TOP_GUN: OfferingId = OfferingId::new(2);

fn vault() -> Address {
    Address::from("TheaterVault111")
}

fn setup(
    buyer: &Identity,
    funds: Lamports,
) -> (
    PurchaseOrchestrator<SessionWallet, SimulatedLedger, SystemClock>,
    SimulatedLedger,
) {
    let ledger = SimulatedLedger::new();
    ledger.airdrop(&buyer.address(), funds).unwrap();
    let orchestrator = PurchaseOrchestrator::new(
        Catalog::load(&StaticCatalogFeed).unwrap(),
        PurchaseEnvironment::new(
            SessionWallet::connected(buyer.clone()),
            ledger.clone(),
            SystemClock,
            PurchaseSettings {
                destination: vault(),
                card_processing_delay: Duration::from_millis(2000),
            },
        ),
    );
    (orchestrator, ledger)
}

async fn buy(
    orchestrator: &PurchaseOrchestrator<SessionWallet, SimulatedLedger, SystemClock>,
    method: PaymentMethod,
) -> Result<reelmint::PurchaseOutcome, PurchaseError> {
    let request = orchestrator.begin_purchase(TOP_GUN).await?;
    orchestrator
        .select_payment_method(request.request_id, method)
        .await?;
    orchestrator.confirm_purchase(request.request_id).await
}

#[tokio::test]
async fn test_sol_purchase_moves_funds_and_mints_one_unit() {
    let alice = Identity::from("alice");
    let (orchestrator, ledger) = setup(&alice, Lamports::from_sol(1.0).unwrap());

    let outcome = buy(&orchestrator, PaymentMethod::Crypto).await.unwrap();

    assert_eq!(ledger.balance(&alice.address()).unwrap(), Lamports::new(700_000_000));
    assert_eq!(ledger.balance(&vault()).unwrap(), Lamports::new(300_000_000));
    assert_eq!(ledger.token_supply(&outcome.token).unwrap(), Some(1));
    assert_eq!(ledger.holding(&outcome.token, &alice).unwrap(), 1);
    assert_eq!(
        orchestrator
            .get_offering(TOP_GUN)
            .await
            .unwrap()
            .token_identifier(),
        Some(&outcome.token)
    );
}

#[tokio::test]
async fn test_unfunded_wallet_fails_payment() {
    let guest = Identity::from("guest");
    let (orchestrator, ledger) = setup(&guest, Lamports::new(1));

    let error = buy(&orchestrator, PaymentMethod::Crypto).await.unwrap_err();

    assert!(matches!(error, PurchaseError::PaymentFailed { ref reason } if reason.contains("Insufficient funds")));
    assert_eq!(ledger.balance(&guest.address()).unwrap(), Lamports::new(1));
    assert!(!orchestrator.get_offering(TOP_GUN).await.unwrap().is_issued());
}

#[tokio::test(start_paused = true)]
async fn test_card_purchase_leaves_balances_alone() {
    let bob = Identity::from("bob");
    let (orchestrator, ledger) = setup(&bob, Lamports::new(0));

    let outcome = buy(&orchestrator, PaymentMethod::CardSimulated).await.unwrap();

    assert_eq!(ledger.balance(&bob.address()).unwrap(), Lamports::new(0));
    assert_eq!(ledger.balance(&vault()).unwrap(), Lamports::new(0));
    assert_eq!(ledger.holding(&outcome.token, &bob).unwrap(), 1);
}
