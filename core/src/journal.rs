//! Journal envelope for committed ledger events.
//!
//! Every event a successful command produces is appended to the journal in
//! commit order. The sequence number is the event's position in the ledger's
//! total order and is never reused.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An event that can be recorded in the ledger journal.
///
/// # Event Naming Convention
///
/// `event_type()` returns a stable identifier with a version suffix, so
/// consumers can route and evolve schemas independently:
///
/// - `"TicketMinted.v1"`
/// - `"EventDeactivated.v1"`
pub trait JournalEvent: Clone + Send + Sync + 'static {
    /// Returns the stable, versioned event type identifier
    fn event_type(&self) -> &'static str;
}

/// A committed event together with its position in the journal
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Committed<E> {
    /// Position in the ledger's total order, starting at 1
    pub sequence: u64,
    /// Wall-clock time at which the owning command committed
    pub recorded_at: DateTime<Utc>,
    /// The event itself
    pub event: E,
}

impl<E: JournalEvent> Committed<E> {
    /// Wraps an event at the given journal position
    #[must_use]
    pub const fn new(sequence: u64, recorded_at: DateTime<Utc>, event: E) -> Self {
        Self {
            sequence,
            recorded_at,
            event,
        }
    }

    /// Returns the wrapped event's type identifier
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        self.event.event_type()
    }
}
