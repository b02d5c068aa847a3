//! Ticket records and NFT ownership.
//!
//! The ownership map is the authoritative answer to "who holds ticket N".
//! Each ticket record caches its owner for convenient reads; both are only
//! ever written together, by the one private method that changes an owner.

use super::allocator::IdAllocator;
use crate::error::{TicketingError, TicketingResult};
use crate::types::{EventId, Ticket, TicketId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ticket_ledger_core::Principal;
use ticket_ledger_core::environment::BlockHeight;

/// All tickets plus the NFT ownership map
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketLedger {
    tickets: BTreeMap<TicketId, Ticket>,
    owners: BTreeMap<TicketId, Principal>,
}

impl TicketLedger {
    /// Mints a ticket for `event_id` held by `owner`
    ///
    /// The caller must already have checked that the event is on sale and
    /// must record the sale in the same command.
    pub fn mint(
        &mut self,
        ids: &mut IdAllocator,
        event_id: EventId,
        owner: Principal,
        seat_zone: String,
        now: BlockHeight,
    ) -> Ticket {
        let ticket = Ticket {
            ticket_id: ids.allocate_ticket_id(),
            event_id,
            owner,
            seat_zone,
            minted_at: now,
            is_used: false,
        };
        self.tickets.insert(ticket.ticket_id, ticket.clone());
        self.set_owner(ticket.ticket_id, ticket.owner.clone());
        ticket
    }

    /// Current NFT holder
    #[must_use]
    pub fn owner_of(&self, ticket_id: TicketId) -> Option<&Principal> {
        self.owners.get(&ticket_id)
    }

    /// Looks up a ticket
    #[must_use]
    pub fn get(&self, ticket_id: TicketId) -> Option<&Ticket> {
        self.tickets.get(&ticket_id)
    }

    /// Moves a ticket from `sender` to `recipient`
    ///
    /// `caller_is_sender` is the outer permission check: only the sender may
    /// move their own ticket. Ownership is checked against the ownership map,
    /// never against the cached field on the record.
    ///
    /// # Errors
    ///
    /// - [`TicketingError::NotFound`] if the ticket does not exist
    /// - [`TicketingError::Unauthorized`] if the caller is not the sender, the
    ///   sender does not hold the ticket, or the ticket has been used
    pub fn transfer(
        &mut self,
        caller_is_sender: bool,
        sender: &Principal,
        recipient: &Principal,
        ticket_id: TicketId,
    ) -> TicketingResult<()> {
        let ticket = self
            .tickets
            .get(&ticket_id)
            .ok_or_else(|| TicketingError::NotFound(format!("ticket {ticket_id}")))?;

        if !caller_is_sender {
            return Err(TicketingError::Unauthorized(format!(
                "only {sender} may transfer their ticket {ticket_id}"
            )));
        }
        if self.owners.get(&ticket_id) != Some(sender) {
            return Err(TicketingError::Unauthorized(format!(
                "{sender} does not hold ticket {ticket_id}"
            )));
        }
        if ticket.is_used {
            return Err(TicketingError::Unauthorized(format!(
                "ticket {ticket_id} has been used"
            )));
        }

        self.set_owner(ticket_id, recipient.clone());
        Ok(())
    }

    /// Tickets currently held by `owner`, in id order
    #[must_use]
    pub fn tickets_of(&self, owner: &Principal) -> Vec<TicketId> {
        self.owners
            .iter()
            .filter(|(_, holder)| *holder == owner)
            .map(|(ticket_id, _)| *ticket_id)
            .collect()
    }

    /// Metadata URI for an existing ticket: `base` followed by the decimal id
    #[must_use]
    pub fn token_uri(&self, base: &str, ticket_id: TicketId) -> Option<String> {
        self.tickets
            .contains_key(&ticket_id)
            .then(|| format!("{base}{ticket_id}"))
    }

    /// Iterates tickets in id order
    pub fn iter(&self) -> impl Iterator<Item = &Ticket> {
        self.tickets.values()
    }

    /// Number of tickets ever minted
    #[must_use]
    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    /// True before the first mint
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }

    /// Checks records are filed under their own id and both ownership views agree
    pub(crate) fn check_records(&self) -> Result<(), String> {
        if self.owners.len() != self.tickets.len() {
            return Err(format!(
                "{} ownership entries for {} tickets",
                self.owners.len(),
                self.tickets.len()
            ));
        }
        for (key, ticket) in &self.tickets {
            if *key != ticket.ticket_id {
                return Err(format!("ticket filed under {key} has id {}", ticket.ticket_id));
            }
            if self.owners.get(key) != Some(&ticket.owner) {
                return Err(format!("ticket {key} owner differs from the ownership map"));
            }
        }
        Ok(())
    }

    fn set_owner(&mut self, ticket_id: TicketId, owner: Principal) {
        if let Some(ticket) = self.tickets.get_mut(&ticket_id) {
            ticket.owner = owner.clone();
        }
        self.owners.insert(ticket_id, owner);
    }

    /// Rewrites only the cached owner field, breaking the lockstep on purpose
    #[cfg(test)]
    pub(crate) fn desync_cached_owner(&mut self, ticket_id: TicketId, owner: Principal) {
        if let Some(ticket) = self.tickets.get_mut(&ticket_id) {
            ticket.owner = owner;
        }
    }

    /// Marks a ticket as consumed; nothing in the ledger does this yet
    #[cfg(test)]
    pub(crate) fn mark_used(&mut self, ticket_id: TicketId) {
        if let Some(ticket) = self.tickets.get_mut(&ticket_id) {
            ticket.is_used = true;
        }
    }
}
