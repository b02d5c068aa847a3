//! Sequential identifier allocation.

use crate::types::{EventId, TicketId};
use serde::{Deserialize, Serialize};

/// Two independent counters for event and ticket ids, both starting at 1
///
/// Ids are never reused. Callers allocate only after every validation for
/// the creation has passed, so a rejected command never consumes an id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdAllocator {
    next_event_id: u64,
    next_ticket_id: u64,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self {
            next_event_id: 1,
            next_ticket_id: 1,
        }
    }
}

impl IdAllocator {
    /// Returns the next event id and advances the counter
    pub fn allocate_event_id(&mut self) -> EventId {
        let id = EventId::new(self.next_event_id);
        self.next_event_id += 1;
        id
    }

    /// Returns the next ticket id and advances the counter
    pub fn allocate_ticket_id(&mut self) -> TicketId {
        let id = TicketId::new(self.next_ticket_id);
        self.next_ticket_id += 1;
        id
    }

    /// Id of the most recently minted ticket, 0 if none
    #[must_use]
    pub const fn last_ticket_id(&self) -> u64 {
        self.next_ticket_id.saturating_sub(1)
    }

    /// Id of the most recently created event, 0 if none
    #[must_use]
    pub const fn last_event_id(&self) -> u64 {
        self.next_event_id.saturating_sub(1)
    }

    /// Both counters must start from 1
    pub(crate) fn check_counters(&self) -> Result<(), String> {
        if self.next_event_id == 0 || self.next_ticket_id == 0 {
            return Err(format!(
                "counters must be at least 1, found event {} ticket {}",
                self.next_event_id, self.next_ticket_id
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_start_at_one_and_are_independent() {
        let mut ids = IdAllocator::default();
        assert_eq!(ids.last_ticket_id(), 0);

        assert_eq!(ids.allocate_event_id(), EventId::new(1));
        assert_eq!(ids.allocate_event_id(), EventId::new(2));
        assert_eq!(ids.allocate_ticket_id(), TicketId::new(1));

        assert_eq!(ids.last_event_id(), 2);
        assert_eq!(ids.last_ticket_id(), 1);
        assert_eq!(ids.check_counters(), Ok(()));
    }

    #[test]
    fn test_zeroed_counter_is_rejected_not_underflowed() {
        let ids = IdAllocator {
            next_event_id: 1,
            next_ticket_id: 0,
        };
        assert_eq!(ids.last_ticket_id(), 0);
        assert!(ids.check_counters().is_err());
    }
}
