//! Ticketing Ledger Demo
//!
//! Walks through the ledger's main flows against an in-memory payment book:
//! - Organizer authorization
//! - Event creation and selling out a 100-ticket event
//! - Paid purchase, and a purchase refused by the payment layer
//! - Ticket transfer and deactivation
//! - Journal replay and snapshot restore
//!
//! # Usage
//!
//! ```bash
//! RUST_LOG=info,nft_ticketing=debug cargo run --bin demo
//!
//! # With Prometheus metrics on :9090
//! METRICS_ENABLED=true cargo run --bin demo
//! ```

use nft_ticketing::{Config, TicketingEnvironment, TicketingLedger};
use std::sync::Arc;
use ticket_ledger_core::environment::{BlockCounter, BlockHeight};
use ticket_ledger_core::{Money, Principal};
use ticket_ledger_runtime::metrics::MetricsServer;
use ticket_ledger_testing::MockPayments;
use tokio::sync::broadcast::error::TryRecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,nft_ticketing=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    config.validate()?;

    let mut metrics_server = None;
    if config.metrics.enabled {
        let mut server = MetricsServer::new(config.metrics_addr()?);
        server.start()?;
        nft_ticketing::metrics::register_business_metrics();
        metrics_server = Some(server);
    }

    println!("\n============================================");
    println!("   NFT Ticketing Ledger - Demo");
    println!("============================================\n");

    let owner = config.contract_owner.clone();
    let organizer = Principal::from("ST2ORGANIZER");
    let buyer = Principal::from("ST3BUYER");
    let friend = Principal::from("ST4FRIEND");
    let broke = Principal::from("ST5BROKE");

    let payments = MockPayments::with_balances([("ST3BUYER", 1_000), ("ST5BROKE", 10)]);
    let ledger = TicketingLedger::in_memory(&config, payments.clone());
    let mut live = ledger.subscribe();

    // Step 1: authorization
    println!("1. Organizer authorization");
    let refused = ledger
        .create_event(&organizer, "Warehouse Party", 10, Money::from_units(20), 5)
        .await;
    println!("   before authorization: {refused:?}");
    ledger.authorize_organizer(&owner, &organizer).await?;
    let party = ledger
        .create_event(&organizer, "Warehouse Party", 10, Money::from_units(20), 5)
        .await?;
    println!("   after authorization: event {party}\n");

    // Step 2: sell out a concert
    println!("2. Selling out a 100-ticket concert");
    let concert = ledger
        .create_event(&owner, "Concert", 100, Money::from_units(50), 10)
        .await?;
    for seat in 1..=100 {
        ledger.mint_ticket(&buyer, concert, &format!("A{seat}")).await?;
    }
    let sold_out = ledger.mint_ticket(&buyer, concert, "A101").await;
    println!(
        "   remaining: {}, 101st mint: {sold_out:?}\n",
        ledger.get_tickets_remaining(concert).await
    );

    // Step 3: paid purchases
    println!("3. Purchases");
    let ticket = ledger.purchase_ticket(&buyer, party, "VIP").await?;
    println!(
        "   {buyer} bought ticket {ticket}, organizer balance {}",
        payments.balance_of(&organizer)
    );
    let refused = ledger.purchase_ticket(&broke, party, "GA").await;
    println!(
        "   {broke} refused: {refused:?}, tickets sold still {}\n",
        ledger
            .get_event_info(party)
            .await
            .map_or(0, |event| event.tickets_sold)
    );

    // Step 4: transfers
    println!("4. Transfers");
    let stolen = ledger.transfer_ticket(&friend, ticket, &buyer, &friend).await;
    println!("   transfer by non-owner: {stolen:?}");
    ledger.transfer_ticket(&buyer, ticket, &buyer, &friend).await?;
    println!(
        "   owner now {:?}, uri {:?}\n",
        ledger.get_ticket_owner(ticket).await,
        ledger.get_token_uri(ticket).await
    );

    // Step 5: deactivation
    println!("5. Deactivation");
    ledger.deactivate_event(&organizer, party).await?;
    let closed = ledger.purchase_ticket(&buyer, party, "GA").await;
    println!("   purchase after deactivation: {closed:?}\n");

    // Step 6: journal & snapshot
    println!("6. Journal and snapshot");
    let mut received = 0_u64;
    loop {
        match live.try_recv() {
            Ok(_) => received += 1,
            Err(TryRecvError::Lagged(missed)) => println!("   live stream lagged by {missed}"),
            Err(_) => break,
        }
    }
    let journal = ledger.journal_since(0).await;
    println!(
        "   {} events journaled, {received} seen live, last ticket id {}",
        journal.len(),
        ledger.get_last_token_id().await
    );

    let bytes = ledger.snapshot().await?;
    let environment = TicketingEnvironment::new(
        Arc::new(BlockCounter::starting_at(BlockHeight::new(1_000))),
        Arc::new(payments),
    );
    let restored = TicketingLedger::restore(&bytes, &config, environment)?;
    println!(
        "   restored {} bytes: owner of ticket {ticket} is {:?}",
        bytes.len(),
        restored.get_ticket_owner(ticket).await
    );

    if let Some(rendered) = metrics_server.as_ref().and_then(MetricsServer::render) {
        println!("\n{rendered}");
    }

    println!("\n============================================\n");
    Ok(())
}
