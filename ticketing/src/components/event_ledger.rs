//! Event records and supply accounting.

use super::allocator::IdAllocator;
use crate::error::{TicketingError, TicketingResult};
use crate::types::{Event, EventId, MAX_EVENT_NAME_LEN, MAX_ROYALTY_PERCENT};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ticket_ledger_core::environment::BlockHeight;
use ticket_ledger_core::{Money, Principal};

/// Parameters for a new event, as supplied by the organizer
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEvent {
    /// Display name (1 to 50 characters)
    pub event_name: String,
    /// Number of tickets, must be positive
    pub total_supply: u64,
    /// Price per ticket, must be positive
    pub ticket_price: Money,
    /// Resale royalty, 0 to 50
    pub royalty_percent: u8,
}

impl NewEvent {
    /// Checks every creation rule
    ///
    /// # Errors
    ///
    /// Returns [`TicketingError::InvalidParams`] naming the first violated rule.
    pub fn validate(&self) -> TicketingResult<()> {
        let name_len = self.event_name.chars().count();
        if name_len == 0 {
            return Err(TicketingError::InvalidParams("event name is empty".into()));
        }
        if name_len > MAX_EVENT_NAME_LEN {
            return Err(TicketingError::InvalidParams(format!(
                "event name is {name_len} characters, limit is {MAX_EVENT_NAME_LEN}"
            )));
        }
        if self.total_supply == 0 {
            return Err(TicketingError::InvalidParams(
                "total supply must be positive".into(),
            ));
        }
        if self.ticket_price.is_zero() {
            return Err(TicketingError::InvalidParams(
                "ticket price must be positive".into(),
            ));
        }
        if self.royalty_percent > MAX_ROYALTY_PERCENT {
            return Err(TicketingError::InvalidParams(format!(
                "royalty {}% exceeds {MAX_ROYALTY_PERCENT}%",
                self.royalty_percent
            )));
        }
        Ok(())
    }
}

/// All events, keyed by id
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLedger {
    events: BTreeMap<EventId, Event>,
}

impl EventLedger {
    /// Validates `params` and stores a new active event under a fresh id
    ///
    /// The id is allocated only once validation has passed.
    ///
    /// # Errors
    ///
    /// Returns [`TicketingError::InvalidParams`] if `params` breaks a creation rule.
    pub fn create(
        &mut self,
        ids: &mut IdAllocator,
        organizer: Principal,
        params: NewEvent,
        now: BlockHeight,
    ) -> TicketingResult<Event> {
        params.validate()?;

        let event = Event {
            event_id: ids.allocate_event_id(),
            organizer,
            event_name: params.event_name,
            total_supply: params.total_supply,
            tickets_sold: 0,
            ticket_price: params.ticket_price,
            royalty_percent: params.royalty_percent,
            created_at: now,
            is_active: true,
        };
        self.events.insert(event.event_id, event.clone());
        Ok(event)
    }

    /// Looks up an event
    #[must_use]
    pub fn get(&self, event_id: EventId) -> Option<&Event> {
        self.events.get(&event_id)
    }

    /// Checks that a ticket could be sold for the event right now
    ///
    /// # Errors
    ///
    /// - [`TicketingError::NotFound`] if the event is missing or inactive
    /// - [`TicketingError::SoldOut`] if no tickets remain
    pub fn ensure_on_sale(&self, event_id: EventId) -> TicketingResult<OpenSale> {
        let event = self
            .events
            .get(&event_id)
            .filter(|event| event.is_active)
            .ok_or_else(|| TicketingError::NotFound(format!("event {event_id}")))?;
        if event.is_sold_out() {
            return Err(TicketingError::SoldOut(event_id.value()));
        }
        Ok(OpenSale {
            event_id,
            ticket_price: event.ticket_price,
            organizer: event.organizer.clone(),
        })
    }

    /// Counts one more ticket as sold and returns the updated event
    ///
    /// # Errors
    ///
    /// Same as [`ensure_on_sale`](Self::ensure_on_sale); nothing changes on error.
    pub fn record_sale(&mut self, event_id: EventId) -> TicketingResult<Event> {
        let sale = self.ensure_on_sale(event_id)?;
        self.commit_sale(sale);
        self.events
            .get(&event_id)
            .cloned()
            .ok_or_else(|| TicketingError::NotFound(format!("event {event_id}")))
    }

    /// Counts the sale checked earlier in the same command
    ///
    /// The [`OpenSale`] proves the event was active with a ticket left, so
    /// this cannot fail.
    pub fn commit_sale(&mut self, sale: OpenSale) {
        if let Some(event) = self.events.get_mut(&sale.event_id) {
            event.tickets_sold += 1;
        }
    }

    /// Takes the event off sale for good
    ///
    /// Deactivating an inactive event again is allowed for its organizer and
    /// changes nothing.
    ///
    /// # Errors
    ///
    /// - [`TicketingError::NotFound`] if the event does not exist
    /// - [`TicketingError::Unauthorized`] if `caller` is not the organizer
    pub fn deactivate(&mut self, caller: &Principal, event_id: EventId) -> TicketingResult<()> {
        let event = self
            .events
            .get_mut(&event_id)
            .ok_or_else(|| TicketingError::NotFound(format!("event {event_id}")))?;
        if event.organizer != *caller {
            return Err(TicketingError::Unauthorized(format!(
                "{caller} is not the organizer of event {event_id}"
            )));
        }
        event.is_active = false;
        Ok(())
    }

    /// Tickets still available, 0 for an unknown event
    #[must_use]
    pub fn remaining(&self, event_id: EventId) -> u64 {
        self.events.get(&event_id).map_or(0, Event::remaining)
    }

    /// Iterates events in id order
    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.values()
    }

    /// Number of events ever created
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True before the first event is created
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Checks records are filed under their own id and never oversold
    pub(crate) fn check_records(&self) -> Result<(), String> {
        for (key, event) in &self.events {
            if *key != event.event_id {
                return Err(format!("event filed under {key} has id {}", event.event_id));
            }
            if event.tickets_sold > event.total_supply {
                return Err(format!(
                    "event {key} sold {} of {} tickets",
                    event.tickets_sold, event.total_supply
                ));
            }
        }
        Ok(())
    }
}

/// An event that had a ticket left when it was checked
///
/// Only [`EventLedger::ensure_on_sale`] creates one. It is consumed by
/// [`EventLedger::commit_sale`] within the same command, before anything
/// else can change the event.
#[derive(Clone, Debug, PartialEq, Eq)]
#[must_use]
pub struct OpenSale {
    event_id: EventId,
    ticket_price: Money,
    organizer: Principal,
}

impl OpenSale {
    /// Event the ticket is for
    pub const fn event_id(&self) -> EventId {
        self.event_id
    }

    /// Price a buyer pays
    pub const fn ticket_price(&self) -> Money {
        self.ticket_price
    }

    /// Who receives the payment
    pub const fn organizer(&self) -> &Principal {
        &self.organizer
    }
}
