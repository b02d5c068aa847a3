//! NFT Event Ticketing Ledger
//!
//! A single-writer ledger in which tickets are non-fungible assets bound to
//! events. It combines:
//!
//! - **Inventory accounting**: each event has a fixed supply; `tickets_sold`
//!   only ever grows and never passes `total_supply`
//! - **Access control**: the contract owner authorizes organizers, organizers
//!   create and deactivate their own events
//! - **Atomic paid minting**: a purchase pays the organizer and mints the
//!   ticket as one unit, or does neither
//! - **NFT ownership**: one current owner per ticket, transferable until the
//!   ticket is used
//!
//! # Architecture
//!
//! ```text
//!                   ┌─────────────────────┐
//!   callers ──────▶ │   TicketingLedger   │  async facade, metrics, logging
//!                   └──────────┬──────────┘
//!                              │ send(command)
//!                   ┌──────────▼──────────┐
//!                   │  Store (runtime)    │  write lock, journal, snapshots
//!                   └──────────┬──────────┘
//!                              │ reduce
//!                   ┌──────────▼──────────┐
//!                   │  TicketingReducer   │──▶ PaymentPrimitive
//!                   └──────────┬──────────┘
//!        ┌───────────────┬─────┴─────────┬────────────────┐
//!   IdAllocator  OrganizerRegistry  EventLedger     TicketLedger
//! ```
//!
//! # Example
//!
//! ```
//! use nft_ticketing::{Config, TicketingLedger};
//! use ticket_ledger_core::{Money, Principal};
//! use ticket_ledger_testing::MockPayments;
//!
//! # tokio_test_block_on(async {
//! let config = Config::default();
//! let owner = config.contract_owner.clone();
//! let payments = MockPayments::with_balances([("ST1BUYER", 500)]);
//! let ledger = TicketingLedger::in_memory(&config, payments);
//!
//! let event_id = ledger
//!     .create_event(&owner, "Concert", 100, Money::from_units(50), 10)
//!     .await
//!     .unwrap();
//! let ticket_id = ledger
//!     .purchase_ticket(&Principal::from("ST1BUYER"), event_id, "A1")
//!     .await
//!     .unwrap();
//!
//! assert_eq!(ledger.get_tickets_remaining(event_id).await, 99);
//! assert_eq!(ledger.get_ticket_owner(ticket_id).await, Some(Principal::from("ST1BUYER")));
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod app;
pub mod components;
pub mod config;
pub mod error;
pub mod metrics;
pub mod service;
pub mod types;

pub use app::{SnapshotError, TicketingLedger};
pub use config::{Config, ConfigError};
pub use error::{TicketingError, TicketingResult};
pub use service::{
    LedgerEvent, TicketingCommand, TicketingEnvironment, TicketingOutput, TicketingReducer,
    TicketingState,
};
pub use types::{Event, EventId, Ticket, TicketId};
