//! Domain types for the ticketing ledger.
//!
//! Events and tickets are plain records. All rules about how they change
//! live in the components that own them.

use serde::{Deserialize, Serialize};
use std::fmt;
use ticket_ledger_core::environment::BlockHeight;
use ticket_ledger_core::{Money, Principal};

/// Maximum length of an event name, in characters
pub const MAX_EVENT_NAME_LEN: usize = 50;

/// Maximum length of a seat zone, in characters
pub const MAX_SEAT_ZONE_LEN: usize = 20;

/// Highest royalty an event may declare
pub const MAX_ROYALTY_PERCENT: u8 = 50;

// ============================================================================
// Identifiers
// ============================================================================

/// Identifier of an event, assigned sequentially from 1
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct EventId(u64);

impl EventId {
    /// Creates an `EventId` from its raw value
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw value
    #[must_use]
    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a ticket, assigned sequentially from 1 across all events
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TicketId(u64);

impl TicketId {
    /// Creates a `TicketId` from its raw value
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw value
    #[must_use]
    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Records
// ============================================================================

/// An event tickets are sold for
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Unique identifier
    pub event_id: EventId,
    /// Principal that created the event and receives its payments
    pub organizer: Principal,
    /// Display name (1 to 50 characters)
    pub event_name: String,
    /// Number of tickets that can ever be minted
    pub total_supply: u64,
    /// Number of tickets minted so far
    pub tickets_sold: u64,
    /// Price of one ticket
    pub ticket_price: Money,
    /// Resale royalty (0 to 50), stored but not enforced
    pub royalty_percent: u8,
    /// Ledger height at creation
    pub created_at: BlockHeight,
    /// False once the organizer deactivates the event
    pub is_active: bool,
}

impl Event {
    /// Tickets still available
    #[must_use]
    pub const fn remaining(&self) -> u64 {
        self.total_supply.saturating_sub(self.tickets_sold)
    }

    /// True when every ticket has been minted
    #[must_use]
    pub const fn is_sold_out(&self) -> bool {
        self.tickets_sold >= self.total_supply
    }
}

/// A minted ticket
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    /// Unique identifier
    pub ticket_id: TicketId,
    /// Event this ticket admits to
    pub event_id: EventId,
    /// Current holder; mirrors the ledger's ownership map
    pub owner: Principal,
    /// Seat or zone label (at most 20 characters)
    pub seat_zone: String,
    /// Ledger height at mint
    pub minted_at: BlockHeight,
    /// Set once the ticket is consumed at the door
    pub is_used: bool,
}
