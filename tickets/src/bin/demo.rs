//! Reelmint Demo
//!
//! Walks through the purchase workflow against the in-memory ledger:
//! - Buying without a wallet
//! - Paying in SOL, then paying by (simulated) card
//! - Trying to buy a ticket that is already issued
//! - Cancelling before paying
//! - A wallet that cannot afford the ticket
//!
//! # Usage
//!
//! ```bash
//! RUST_LOG=reelmint=debug cargo run --bin demo
//! ```

use reelmint::{
    Catalog, Config, Identity, JsonCatalogFeed, LedgerClient, OfferingId, PaymentMethod,
    PurchaseEnvironment, PurchaseError, PurchaseOrchestrator, SessionWallet, SimulatedLedger,
    StaticCatalogFeed,
    share::{self, TicketDetails},
};
use reelmint_core::environment::{Clock, SystemClock};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

async fn buy<W, L, C>(
    orchestrator: &PurchaseOrchestrator<W, L, C>,
    offering_id: OfferingId,
    method: PaymentMethod,
) -> Result<reelmint::PurchaseOutcome, PurchaseError>
where
    W: reelmint::Wallet + 'static,
    L: LedgerClient,
    C: Clock + 'static,
{
    let request = orchestrator.begin_purchase(offering_id).await?;
    orchestrator
        .select_payment_method(request.request_id, method)
        .await?;
    orchestrator.confirm_purchase(request.request_id).await
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,reelmint=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    reelmint::metrics::register_business_metrics();

    println!("\n🎬 ============================================");
    println!("   Reelmint - Movie Ticket NFT Demo");
    println!("============================================\n");

    let config = Config::try_from_env()?;
    let catalog = match &config.catalog_path {
        Some(path) => Catalog::load(&JsonCatalogFeed::new(path))?,
        None => Catalog::load(&StaticCatalogFeed)?,
    };

    let ledger = SimulatedLedger::new().with_latency(Duration::from_millis(150));
    let wallet = SessionWallet::new();
    let orchestrator = PurchaseOrchestrator::new(
        catalog,
        PurchaseEnvironment::new(wallet.clone(), ledger.clone(), SystemClock, config.purchase_settings()),
    );

    println!("📋 Now showing:");
    for offering in orchestrator.list_offerings().await {
        println!(
            "   [{}] {} - {} - {} @ {} (seat {})",
            offering.id,
            offering.title,
            offering.price,
            offering.showtime.format("%Y-%m-%d %H:%M UTC"),
            offering.theater,
            offering.seat
        );
    }
    println!();

    // Step 1: no wallet connected
    println!("1️⃣  Buying without a wallet...");
    match orchestrator.begin_purchase(OfferingId::new(1)).await {
        Err(error) => println!("   ✗ {error}\n"),
        Ok(request) => println!("   ? unexpectedly opened {}\n", request.request_id),
    }

    // Step 2: connect and fund a wallet
    let alice = Identity::from("AliceWa11et1111111111111111111111111111111");
    ledger.airdrop(&alice.address(), config.demo_airdrop)?;
    wallet.connect(alice.clone());
    println!("2️⃣  Connected {alice} with {}\n", ledger.balance(&alice.address())?);

    // Step 3: pay in SOL
    println!("3️⃣  Buying ticket 1 with SOL...");
    let outcome = buy(&orchestrator, OfferingId::new(1), PaymentMethod::Crypto).await?;
    let offering = orchestrator.get_offering(outcome.offering_id).await?;
    println!("   ✓ Minted {}", outcome.token);
    println!("   Explorer: {}", share::explorer_url(&config.explorer, &outcome.token));
    println!("   Share: {}", share::share_text(&offering, &outcome.token).replace('\n', " | "));
    println!("   Balance now {}\n", ledger.balance(&alice.address())?);

    // Step 4: pay by card
    println!(
        "4️⃣  Buying ticket 2 by card ({} ms processing)...",
        config.card_delay_ms
    );
    let outcome = buy(&orchestrator, OfferingId::new(2), PaymentMethod::CardSimulated).await?;
    let offering = orchestrator.get_offering(outcome.offering_id).await?;
    if let Some(details) = TicketDetails::for_offering(&offering, &config.network_label) {
        println!("{details}\n");
    }

    // Step 5: already issued
    println!("5️⃣  Buying ticket 1 again...");
    match orchestrator.begin_purchase(OfferingId::new(1)).await {
        Err(error) => println!("   ✗ {error}\n"),
        Ok(request) => println!("   ? unexpectedly opened {}\n", request.request_id),
    }

    // Step 6: cancel before paying
    println!("6️⃣  Opening and cancelling ticket 3...");
    let request = orchestrator.begin_purchase(OfferingId::new(3)).await?;
    orchestrator.cancel_purchase(request.request_id).await?;
    let offering = orchestrator.get_offering(OfferingId::new(3)).await?;
    println!("   ✓ Cancelled, ticket 3 still available: {}\n", !offering.is_issued());

    // Step 7: unfunded wallet
    println!("7️⃣  Switching to an unfunded wallet and buying ticket 3 with SOL...");
    wallet.connect(Identity::from("GuestWa11et1111111111111111111111111111111"));
    match buy(&orchestrator, OfferingId::new(3), PaymentMethod::Crypto).await {
        Err(error) => println!(
            "   ✗ {error} (charged without ticket: {})\n",
            error.paid_but_unissued()
        ),
        Ok(outcome) => println!("   ? unexpectedly minted {}\n", outcome.token),
    }

    println!("🎟️  Final catalog:");
    for offering in orchestrator.list_offerings().await {
        let status = offering
            .token_identifier()
            .map_or_else(|| "available".to_string(), |token| format!("issued ({token})"));
        println!("   [{}] {} - {status}", offering.id, offering.title);
    }

    orchestrator.shutdown(Duration::from_secs(5)).await?;
    println!("\n✓ Demo complete");
    Ok(())
}
