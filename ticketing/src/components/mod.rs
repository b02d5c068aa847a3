//! Ledger components.
//!
//! Each component exclusively owns one slice of the ledger state and is only
//! changed through its own methods. Cross-component rules live in the
//! reducer in [`crate::service`].

pub mod allocator;
pub mod authorization;
pub mod event_ledger;
pub mod ticket_ledger;

pub use allocator::IdAllocator;
pub use authorization::OrganizerRegistry;
pub use event_ledger::{EventLedger, NewEvent, OpenSale};
pub use ticket_ledger::TicketLedger;
