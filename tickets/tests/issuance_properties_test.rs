//! Property tests for issuance and amounts.

#![allow(clippy::unwrap_used)]

use proptest::prelude::*;
use reelmint::mocks::{LedgerCall, MockLedgerClient};
use reelmint::purchase::PurchaseSettings;
use reelmint::{
    Address, Catalog, Identity, IssuanceStage, Lamports, LedgerError, OfferingId, PaymentMethod,
    PurchaseEnvironment, PurchaseError, PurchaseOrchestrator, SessionWallet, StaticCatalogFeed,
};
use reelmint_testing::test_clock;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
enum Failure {
    None,
    Transfer,
    Stage(IssuanceStage),
}

fn failure() -> impl Strategy<Value = Failure> {
    prop_oneof![
        Just(Failure::None),
        Just(Failure::Transfer),
        Just(Failure::Stage(IssuanceStage::CreateTokenClass)),
        Just(Failure::Stage(IssuanceStage::EnsureHoldingAccount)),
        Just(Failure::Stage(IssuanceStage::IssueUnit)),
    ]
}

fn method() -> impl Strategy<Value = PaymentMethod> {
    prop_oneof![Just(PaymentMethod::Crypto), Just(PaymentMethod::CardSimulated)]
}

fn ledger_for(failure: Failure) -> MockLedgerClient {
    let rejected = LedgerError::Rejected {
        reason: "simulated".to_string(),
    };
    match failure {
        Failure::None => MockLedgerClient::new(),
        Failure::Transfer => MockLedgerClient::new().failing_transfer(rejected),
        Failure::Stage(stage) => MockLedgerClient::new().failing_at(stage, rejected),
    }
}

proptest! {
    #[test]
    fn offering_is_issued_iff_confirm_succeeds(
        offering in 1u32..=3,
        method in method(),
        failure in failure(),
        connected in any::<bool>(),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .start_paused(true)
            .build()
            .unwrap();

        runtime.block_on(async {
            let offering_id = OfferingId::new(offering);
            let wallet = SessionWallet::new();
            if connected {
                wallet.connect(Identity::from("PropBuyer"));
            }
            let ledger = ledger_for(failure);
            let orchestrator = PurchaseOrchestrator::new(
                Catalog::load(&StaticCatalogFeed).unwrap(),
                PurchaseEnvironment::new(
                    wallet,
                    ledger.clone(),
                    test_clock(),
                    PurchaseSettings {
                        destination: Address::from("Vault"),
                        card_processing_delay: Duration::from_millis(10),
                    },
                ),
            );

            let result = match orchestrator.begin_purchase(offering_id).await {
                Ok(request) => {
                    orchestrator
                        .select_payment_method(request.request_id, method)
                        .await
                        .unwrap();
                    orchestrator.confirm_purchase(request.request_id).await
                }
                Err(error) => Err(error),
            };

            let issued = orchestrator.get_offering(offering_id).await.unwrap().is_issued();
            prop_assert_eq!(issued, result.is_ok());

            if !connected {
                prop_assert_eq!(result.unwrap_err(), PurchaseError::NotAuthenticated);
                prop_assert!(ledger.calls().is_empty());
                return Ok(());
            }

            let transferred = ledger
                .calls()
                .iter()
                .any(|call| matches!(call, LedgerCall::Transfer { .. }));
            prop_assert_eq!(transferred, method == PaymentMethod::Crypto);

            match (failure, method, result) {
                (Failure::Transfer, PaymentMethod::Crypto, Err(error)) => {
                    prop_assert!(matches!(error, PurchaseError::PaymentFailed { .. }), "expected PaymentFailed, got {:?}", error);
                    prop_assert!(ledger.stages().is_empty());
                }
                (Failure::Stage(stage), _, Err(error)) => {
                    prop_assert!(error.paid_but_unissued());
                    prop_assert_eq!(ledger.stages().last().copied(), Some(stage));
                }
                (Failure::None | Failure::Transfer, _, Ok(outcome)) => {
                    prop_assert_eq!(outcome.offering_id, offering_id);
                    prop_assert_eq!(ledger.stages().len(), 3);
                }
                (failure, method, result) => {
                    prop_assert!(false, "unexpected {:?} for {:?}/{:?}", result, failure, method);
                }
            }
            Ok::<(), TestCaseError>(())
        })?;
    }

    #[test]
    fn whole_lamport_amounts_convert_exactly(lamports in 1u64..=1_000_000 * Lamports::PER_SOL) {
        #[allow(clippy::cast_precision_loss)]
        let sol = lamports as f64 / Lamports::PER_SOL as f64;
        let converted = Lamports::from_sol(sol).unwrap();
        prop_assert!(converted.get().abs_diff(lamports) <= 1);
    }

    #[test]
    fn negative_or_non_finite_amounts_are_rejected(sol in prop_oneof![
        (-1.0e9f64..-1.0e-9),
        Just(f64::NAN),
        Just(f64::INFINITY),
    ]) {
        prop_assert_eq!(Lamports::from_sol(sol), None);
    }
}
