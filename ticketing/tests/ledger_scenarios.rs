//! End-to-end scenarios against the ledger facade.

#![allow(clippy::unwrap_used, clippy::panic)]

use nft_ticketing::{
    Config, EventId, LedgerEvent, SnapshotError, TicketId, TicketingEnvironment, TicketingError,
    TicketingLedger,
};
use std::sync::Arc;
use ticket_ledger_core::environment::BlockHeight;
use ticket_ledger_core::{Money, Principal};
use ticket_ledger_testing::helpers::init_test_tracing;
use ticket_ledger_testing::{FixedClock, MockPayments, test_clock};

fn owner() -> Principal {
    Config::default().contract_owner
}

fn organizer() -> Principal {
    Principal::from("ST2ORGANIZER")
}

fn buyer() -> Principal {
    Principal::from("ST3BUYER")
}

fn friend() -> Principal {
    Principal::from("ST4FRIEND")
}

fn ledger_with(payments: MockPayments) -> TicketingLedger {
    init_test_tracing();
    let env = TicketingEnvironment::new(Arc::new(test_clock()), Arc::new(payments));
    TicketingLedger::new(&Config::default(), env)
}

async fn concert(ledger: &TicketingLedger, total_supply: u64) -> EventId {
    ledger
        .create_event(&owner(), "Concert", total_supply, Money::from_units(50), 10)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_hundred_ticket_concert_sells_out() {
    let ledger = ledger_with(MockPayments::unlimited());

    let event_id = concert(&ledger, 100).await;
    assert_eq!(event_id, EventId::new(1));

    let first = ledger.mint_ticket(&buyer(), event_id, "A1").await.unwrap();
    assert_eq!(first, TicketId::new(1));
    assert_eq!(ledger.get_event_info(event_id).await.unwrap().tickets_sold, 1);

    for seat in 2..=100 {
        ledger
            .mint_ticket(&buyer(), event_id, &format!("A{seat}"))
            .await
            .unwrap();
    }

    let result = ledger.mint_ticket(&buyer(), event_id, "A101").await;
    assert_eq!(result, Err(TicketingError::SoldOut(1)));

    let event = ledger.get_event_info(event_id).await.unwrap();
    assert_eq!(event.tickets_sold, 100);
    assert_eq!(ledger.get_tickets_remaining(event_id).await, 0);
    assert_eq!(ledger.get_last_token_id().await, 100);
}

#[tokio::test]
async fn test_failed_payment_leaves_no_trace() {
    let payments = MockPayments::refusing();
    let ledger = ledger_with(payments.clone());
    let event_id = concert(&ledger, 10).await;
    let before = ledger.get_event_info(event_id).await;

    let result = ledger.purchase_ticket(&buyer(), event_id, "A1").await;

    assert!(matches!(result, Err(TicketingError::InsufficientPayment(_))));
    assert_eq!(ledger.get_event_info(event_id).await, before);
    assert_eq!(ledger.get_ticket_info(TicketId::new(1)).await, None);
    assert_eq!(ledger.get_last_token_id().await, 0);
    assert!(payments.settled().is_empty());
}

#[tokio::test]
async fn test_purchase_moves_price_to_organizer() {
    let payments = MockPayments::with_balances([("ST3BUYER", 75)]);
    let ledger = ledger_with(payments.clone());
    ledger.authorize_organizer(&owner(), &organizer()).await.unwrap();
    let event_id = ledger
        .create_event(&organizer(), "Jazz Night", 3, Money::from_units(25), 0)
        .await
        .unwrap();

    for seat in ["B1", "B2", "B3"] {
        ledger.purchase_ticket(&buyer(), event_id, seat).await.unwrap();
    }

    assert_eq!(payments.balance_of(&buyer()), Money::ZERO);
    assert_eq!(payments.balance_of(&organizer()), Money::from_units(75));
    assert_eq!(payments.settled().len(), 3);
    assert_eq!(
        ledger.tickets_of(&buyer()).await,
        vec![TicketId::new(1), TicketId::new(2), TicketId::new(3)]
    );
}

#[tokio::test]
async fn test_transfer_requires_true_owner() {
    let ledger = ledger_with(MockPayments::unlimited());
    let event_id = concert(&ledger, 5).await;
    let ticket_id = ledger.mint_ticket(&buyer(), event_id, "C7").await.unwrap();

    let stolen = ledger
        .transfer_ticket(&friend(), ticket_id, &friend(), &organizer())
        .await;
    assert!(matches!(stolen, Err(TicketingError::Unauthorized(_))));

    let impersonated = ledger
        .transfer_ticket(&friend(), ticket_id, &buyer(), &friend())
        .await;
    assert!(matches!(impersonated, Err(TicketingError::Unauthorized(_))));

    ledger
        .transfer_ticket(&buyer(), ticket_id, &buyer(), &friend())
        .await
        .unwrap();

    assert_eq!(ledger.get_ticket_owner(ticket_id).await, Some(friend()));
    assert_eq!(ledger.get_ticket_info(ticket_id).await.unwrap().owner, friend());

    let again = ledger
        .transfer_ticket(&buyer(), ticket_id, &buyer(), &organizer())
        .await;
    assert!(matches!(again, Err(TicketingError::Unauthorized(_))));

    let missing = ledger
        .transfer_ticket(&buyer(), TicketId::new(99), &buyer(), &friend())
        .await;
    assert!(matches!(missing, Err(TicketingError::NotFound(_))));
}

#[tokio::test]
async fn test_authorization_gates_event_creation() {
    let ledger = ledger_with(MockPayments::unlimited());

    let denied = ledger
        .create_event(&organizer(), "Gala", 10, Money::from_units(5), 0)
        .await;
    assert!(matches!(denied, Err(TicketingError::Unauthorized(_))));

    assert_eq!(
        ledger.authorize_organizer(&buyer(), &organizer()).await,
        Err(TicketingError::OwnerOnly)
    );

    ledger.authorize_organizer(&owner(), &organizer()).await.unwrap();
    assert!(ledger.is_authorized_organizer(&organizer()).await);
    let event_id = ledger
        .create_event(&organizer(), "Gala", 10, Money::from_units(5), 0)
        .await
        .unwrap();
    assert_eq!(event_id, EventId::new(1));

    ledger.revoke_organizer(&owner(), &organizer()).await.unwrap();
    let revoked = ledger
        .create_event(&organizer(), "Gala II", 10, Money::from_units(5), 0)
        .await;
    assert!(matches!(revoked, Err(TicketingError::Unauthorized(_))));

    // Existing events stay with their organizer.
    ledger.deactivate_event(&organizer(), event_id).await.unwrap();
}

#[tokio::test]
async fn test_event_ids_have_no_gaps() {
    let ledger = ledger_with(MockPayments::unlimited());

    let mut ids = Vec::new();
    for round in 0..5_u8 {
        ids.push(concert(&ledger, 1).await);
        let rejected = ledger
            .create_event(&owner(), "", 1, Money::from_units(1), 0)
            .await;
        assert!(matches!(rejected, Err(TicketingError::InvalidParams(_))), "round {round}");
    }

    let expected: Vec<EventId> = (1..=5).map(EventId::new).collect();
    assert_eq!(ids, expected);
}

#[tokio::test]
async fn test_invalid_event_params() {
    let ledger = ledger_with(MockPayments::unlimited());
    let too_long = "x".repeat(51);

    let cases = [
        (too_long.as_str(), 10, 5, 0),
        ("Show", 0, 5, 0),
        ("Show", 10, 0, 0),
        ("Show", 10, 5, 51),
    ];
    for (name, supply, price, royalty) in cases {
        let result = ledger
            .create_event(&owner(), name, supply, Money::from_units(price), royalty)
            .await;
        assert_eq!(result.unwrap_err().code(), 105);
    }
}

#[tokio::test]
async fn test_deactivate_twice() {
    let ledger = ledger_with(MockPayments::unlimited());
    let event_id = concert(&ledger, 10).await;

    ledger.deactivate_event(&owner(), event_id).await.unwrap();
    ledger.deactivate_event(&owner(), event_id).await.unwrap();
    assert!(!ledger.get_event_info(event_id).await.unwrap().is_active);

    let stranger = ledger.deactivate_event(&buyer(), event_id).await;
    assert!(matches!(stranger, Err(TicketingError::Unauthorized(_))));

    let missing = ledger.deactivate_event(&owner(), EventId::new(7)).await;
    assert!(matches!(missing, Err(TicketingError::NotFound(_))));

    let mint = ledger.mint_ticket(&buyer(), event_id, "A1").await;
    assert!(matches!(mint, Err(TicketingError::NotFound(_))));
}

#[tokio::test]
async fn test_reads_of_absent_entities() {
    let ledger = ledger_with(MockPayments::unlimited());

    assert_eq!(ledger.get_event_info(EventId::new(1)).await, None);
    assert_eq!(ledger.get_ticket_info(TicketId::new(1)).await, None);
    assert_eq!(ledger.get_tickets_remaining(EventId::new(1)).await, 0);
    assert_eq!(ledger.get_ticket_owner(TicketId::new(1)).await, None);
    assert_eq!(ledger.get_last_token_id().await, 0);
    assert_eq!(ledger.get_token_uri(TicketId::new(1)).await, None);
    assert_eq!(ledger.contract_owner().await, owner());
}

#[tokio::test]
async fn test_token_uri_appends_decimal_id() {
    let ledger = ledger_with(MockPayments::unlimited());
    let event_id = concert(&ledger, 20).await;
    let mut last = TicketId::new(0);
    for _ in 0..11 {
        last = ledger.mint_ticket(&buyer(), event_id, "GA").await.unwrap();
    }

    assert_eq!(
        ledger.get_token_uri(last).await.as_deref(),
        Some("https://tickets.example/metadata/11")
    );
}

#[tokio::test]
async fn test_records_carry_ledger_height() {
    let env = TicketingEnvironment::new(
        Arc::new(FixedClock::new(BlockHeight::new(4_242))),
        Arc::new(MockPayments::unlimited()),
    );
    let ledger = TicketingLedger::new(&Config::default(), env);
    let event_id = concert(&ledger, 2).await;
    let ticket_id = ledger.mint_ticket(&buyer(), event_id, "A1").await.unwrap();

    let event = ledger.get_event_info(event_id).await.unwrap();
    let ticket = ledger.get_ticket_info(ticket_id).await.unwrap();
    assert_eq!(event.created_at, BlockHeight::new(4_242));
    assert_eq!(ticket.minted_at, BlockHeight::new(4_242));
    assert_eq!(ticket.seat_zone, "A1");
    assert!(!ticket.is_used);
}

#[tokio::test]
async fn test_in_memory_ledger_advances_blocks() {
    let ledger = TicketingLedger::in_memory(&Config::default(), MockPayments::unlimited());
    let event_id = concert(&ledger, 2).await;
    let ticket_id = ledger.mint_ticket(&buyer(), event_id, "A1").await.unwrap();

    let created_at = ledger.get_event_info(event_id).await.unwrap().created_at;
    let minted_at = ledger.get_ticket_info(ticket_id).await.unwrap().minted_at;
    assert_eq!(created_at, BlockHeight::new(1));
    assert_eq!(minted_at, BlockHeight::new(2));
}

#[tokio::test]
async fn test_journal_records_committed_events_only() {
    let ledger = ledger_with(MockPayments::with_balances([("ST3BUYER", 50)]));
    let mut live = ledger.subscribe();

    let event_id = concert(&ledger, 5).await;
    ledger.purchase_ticket(&buyer(), event_id, "A1").await.unwrap();
    let _ = ledger.purchase_ticket(&buyer(), event_id, "A2").await;

    let journal = ledger.journal_since(0).await;
    let types: Vec<&str> = journal.iter().map(|entry| entry.event_type()).collect();
    assert_eq!(
        types,
        vec!["EventCreated.v1", "PaymentSettled.v1", "TicketMinted.v1"]
    );
    let sequences: Vec<u64> = journal.iter().map(|entry| entry.sequence).collect();
    assert_eq!(sequences, vec![1, 2, 3]);
    assert_eq!(ledger.journal_since(1).await.len(), 2);

    let first = live.recv().await.unwrap();
    assert!(matches!(first.event, LedgerEvent::EventCreated { .. }));

    let json = serde_json::to_value(&journal[1].event).unwrap();
    assert_eq!(json["PaymentSettled"]["amount"], 50);
}

#[tokio::test]
async fn test_snapshot_restores_full_ledger() {
    let ledger = ledger_with(MockPayments::unlimited());
    ledger.authorize_organizer(&owner(), &organizer()).await.unwrap();
    let event_id = concert(&ledger, 3).await;
    let ticket_id = ledger.mint_ticket(&buyer(), event_id, "A1").await.unwrap();

    let bytes = ledger.snapshot().await.unwrap();
    let env = TicketingEnvironment::new(Arc::new(test_clock()), Arc::new(MockPayments::unlimited()));
    let restored = TicketingLedger::restore(&bytes, &Config::default(), env).unwrap();

    assert_eq!(restored.get_ticket_owner(ticket_id).await, Some(buyer()));
    assert_eq!(restored.get_tickets_remaining(event_id).await, 2);
    assert!(restored.is_authorized_organizer(&organizer()).await);

    let next = restored.mint_ticket(&buyer(), event_id, "A2").await.unwrap();
    assert_eq!(next, TicketId::new(2));
    assert_eq!(restored.journal_since(0).await[0].sequence, 4);
}

#[tokio::test]
async fn test_restore_rejects_garbage() {
    let env = TicketingEnvironment::new(Arc::new(test_clock()), Arc::new(MockPayments::unlimited()));
    assert!(TicketingLedger::restore(&[1, 2, 3], &Config::default(), env).is_err());
}

#[tokio::test]
async fn test_restore_refuses_rewound_ticket_counter() {
    let ledger = ledger_with(MockPayments::unlimited());
    let event_id = concert(&ledger, 3).await;
    ledger.mint_ticket(&buyer(), event_id, "A1").await.unwrap();
    let bytes = ledger.snapshot().await.unwrap();

    // Layout: last sequence, next event id, next ticket id, then the rest.
    assert_eq!(bytes[16..24], 2_u64.to_le_bytes());

    for rewound in [1_u64, 0] {
        let mut tampered = bytes.clone();
        tampered[16..24].copy_from_slice(&rewound.to_le_bytes());

        let env =
            TicketingEnvironment::new(Arc::new(test_clock()), Arc::new(MockPayments::unlimited()));
        let result = TicketingLedger::restore(&tampered, &Config::default(), env);
        assert!(
            matches!(result, Err(SnapshotError::InvalidSnapshot(_))),
            "next ticket id {rewound} was accepted"
        );
    }
}

#[tokio::test]
async fn test_journal_keeps_configured_tail() {
    let config = Config {
        journal_retention: 2,
        ..Config::default()
    };
    let env = TicketingEnvironment::new(Arc::new(test_clock()), Arc::new(MockPayments::unlimited()));
    let ledger = TicketingLedger::new(&config, env);

    let event_id = concert(&ledger, 5).await;
    for seat in ["A1", "A2", "A3"] {
        ledger.mint_ticket(&buyer(), event_id, seat).await.unwrap();
    }

    let journal = ledger.journal_since(0).await;
    let sequences: Vec<u64> = journal.iter().map(|entry| entry.sequence).collect();
    assert_eq!(sequences, vec![3, 4]);
    assert_eq!(ledger.get_last_token_id().await, 3);
}

#[tokio::test]
async fn test_concurrent_mints_never_oversell() {
    let ledger = ledger_with(MockPayments::unlimited());
    let event_id = concert(&ledger, 10).await;

    let mut handles = Vec::new();
    for i in 0..25 {
        let ledger = ledger.clone();
        handles.push(tokio::spawn(async move {
            let buyer = Principal::new(format!("ST{i:02}CONCURRENT"));
            ledger.mint_ticket(&buyer, event_id, "GA").await
        }));
    }

    let mut minted = Vec::new();
    let mut sold_out = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(ticket_id) => minted.push(ticket_id),
            Err(TicketingError::SoldOut(_)) => sold_out += 1,
            Err(other) => panic!("unexpected rejection: {other}"),
        }
    }

    minted.sort();
    let expected: Vec<TicketId> = (1..=10).map(TicketId::new).collect();
    assert_eq!(minted, expected);
    assert_eq!(sold_out, 15);
    assert_eq!(ledger.get_event_info(event_id).await.unwrap().tickets_sold, 10);
}
