//! The ticketing state machine.
//!
//! [`TicketingReducer`] composes the allocator, the organizer registry, the
//! event ledger, the ticket ledger and the external payment primitive. Each
//! command checks every rejection condition before it changes anything, so a
//! rejected command leaves the state as it found it. In a purchase the
//! payment is the last step that can fail; once it has gone through, the
//! sale and the mint cannot.

use crate::components::{EventLedger, IdAllocator, NewEvent, OrganizerRegistry, TicketLedger};
use crate::error::{TicketingError, TicketingResult};
use crate::types::{Event, EventId, MAX_SEAT_ZONE_LEN, Ticket, TicketId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use ticket_ledger_core::environment::LedgerClock;
use ticket_ledger_core::journal::JournalEvent;
use ticket_ledger_core::payment::PaymentPrimitive;
use ticket_ledger_core::reducer::{Reducer, Transition};
use ticket_ledger_core::{Money, Principal, smallvec};

// ============================================================================
// Commands
// ============================================================================

/// Commands that change the ledger
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TicketingCommand {
    /// Allow `organizer` to create events (contract owner only)
    AuthorizeOrganizer {
        /// Who is asking
        caller: Principal,
        /// Principal to authorize
        organizer: Principal,
    },
    /// Withdraw `organizer`'s permission to create events (contract owner only)
    RevokeOrganizer {
        /// Who is asking
        caller: Principal,
        /// Principal to revoke
        organizer: Principal,
    },
    /// Create an event organized by `caller`
    CreateEvent {
        /// Organizer of the new event
        caller: Principal,
        /// Display name
        event_name: String,
        /// Number of tickets
        total_supply: u64,
        /// Price per ticket
        ticket_price: Money,
        /// Resale royalty, 0 to 50
        royalty_percent: u8,
    },
    /// Mint a ticket to `caller` without collecting payment
    MintTicket {
        /// Recipient of the ticket
        caller: Principal,
        /// Event to mint for
        event_id: EventId,
        /// Seat label
        seat_zone: String,
    },
    /// Pay the ticket price to the organizer, then mint to `caller`
    PurchaseTicket {
        /// Buyer and recipient
        caller: Principal,
        /// Event to buy for
        event_id: EventId,
        /// Seat label
        seat_zone: String,
    },
    /// Move a ticket from `sender` to `recipient`
    TransferTicket {
        /// Who is asking; must be `sender`
        caller: Principal,
        /// Ticket to move
        ticket_id: TicketId,
        /// Current holder
        sender: Principal,
        /// New holder
        recipient: Principal,
    },
    /// Take an event off sale permanently (organizer only)
    DeactivateEvent {
        /// Who is asking
        caller: Principal,
        /// Event to deactivate
        event_id: EventId,
    },
}

impl TicketingCommand {
    /// Short name used in logs and metrics labels
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AuthorizeOrganizer { .. } => "authorize-organizer",
            Self::RevokeOrganizer { .. } => "revoke-organizer",
            Self::CreateEvent { .. } => "create-event",
            Self::MintTicket { .. } => "mint-ticket",
            Self::PurchaseTicket { .. } => "purchase-ticket",
            Self::TransferTicket { .. } => "transfer-ticket",
            Self::DeactivateEvent { .. } => "deactivate-event",
        }
    }
}

/// What a successful command hands back
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TicketingOutput {
    /// Nothing to return
    Unit,
    /// Id of the event just created
    EventCreated(EventId),
    /// Id of the ticket just minted
    TicketIssued(TicketId),
}

impl TryFrom<TicketingOutput> for EventId {
    type Error = TicketingOutput;

    fn try_from(output: TicketingOutput) -> Result<Self, TicketingOutput> {
        match output {
            TicketingOutput::EventCreated(event_id) => Ok(event_id),
            other => Err(other),
        }
    }
}

impl TryFrom<TicketingOutput> for TicketId {
    type Error = TicketingOutput;

    fn try_from(output: TicketingOutput) -> Result<Self, TicketingOutput> {
        match output {
            TicketingOutput::TicketIssued(ticket_id) => Ok(ticket_id),
            other => Err(other),
        }
    }
}

// ============================================================================
// Ledger events
// ============================================================================

/// Facts committed to the journal
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    /// A principal may now create events
    OrganizerAuthorized {
        /// The organizer
        organizer: Principal,
    },
    /// A principal may no longer create events
    OrganizerRevoked {
        /// The organizer
        organizer: Principal,
    },
    /// An event was created
    EventCreated {
        /// The new event
        event: Event,
    },
    /// The payment primitive moved the ticket price to the organizer
    PaymentSettled {
        /// Event paid for
        event_id: EventId,
        /// Buyer
        payer: Principal,
        /// Organizer
        payee: Principal,
        /// Amount moved
        amount: Money,
        /// Payment primitive's receipt reference
        reference: u64,
    },
    /// A ticket was minted
    TicketMinted {
        /// The new ticket
        ticket: Ticket,
        /// Whether the mint was paid for
        paid: bool,
    },
    /// A ticket changed hands
    TicketTransferred {
        /// Ticket moved
        ticket_id: TicketId,
        /// Previous holder
        from: Principal,
        /// New holder
        to: Principal,
    },
    /// An event went off sale
    EventDeactivated {
        /// Event deactivated
        event_id: EventId,
    },
}

impl JournalEvent for LedgerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::OrganizerAuthorized { .. } => "OrganizerAuthorized.v1",
            Self::OrganizerRevoked { .. } => "OrganizerRevoked.v1",
            Self::EventCreated { .. } => "EventCreated.v1",
            Self::PaymentSettled { .. } => "PaymentSettled.v1",
            Self::TicketMinted { .. } => "TicketMinted.v1",
            Self::TicketTransferred { .. } => "TicketTransferred.v1",
            Self::EventDeactivated { .. } => "EventDeactivated.v1",
        }
    }
}

// ============================================================================
// State & environment
// ============================================================================

/// The whole ledger: counters, authorization, events and tickets
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketingState {
    ids: IdAllocator,
    registry: OrganizerRegistry,
    events: EventLedger,
    tickets: TicketLedger,
}

impl TicketingState {
    /// An empty ledger owned by `contract_owner`
    #[must_use]
    pub fn new(contract_owner: Principal) -> Self {
        Self {
            ids: IdAllocator::default(),
            registry: OrganizerRegistry::new(contract_owner),
            events: EventLedger::default(),
            tickets: TicketLedger::default(),
        }
    }

    /// Identifier counters
    #[must_use]
    pub const fn ids(&self) -> &IdAllocator {
        &self.ids
    }

    /// Organizer authorization
    #[must_use]
    pub const fn registry(&self) -> &OrganizerRegistry {
        &self.registry
    }

    /// Event records
    #[must_use]
    pub const fn events(&self) -> &EventLedger {
        &self.events
    }

    /// Ticket records and ownership
    #[must_use]
    pub const fn tickets(&self) -> &TicketLedger {
        &self.tickets
    }

    /// Checks the invariants every state built by the reducer satisfies
    ///
    /// - both id counters start at 1 and every stored id is below them
    /// - event and ticket ids run from 1 with no gaps
    /// - no event has sold more than its supply
    /// - each event's sold count matches the tickets minted for it
    /// - the ownership map and each ticket's owner agree
    ///
    /// States decoded from outside the ledger go through this before use.
    ///
    /// # Errors
    ///
    /// Returns a description of the first violated invariant.
    pub fn validate(&self) -> Result<(), String> {
        self.ids.check_counters()?;
        self.events.check_records()?;
        self.tickets.check_records()?;

        let last_event = self.ids.last_event_id();
        let last_ticket = self.ids.last_ticket_id();
        if u64::try_from(self.events.len()).ok() != Some(last_event) {
            return Err(format!(
                "{} events stored but {last_event} allocated",
                self.events.len()
            ));
        }
        if u64::try_from(self.tickets.len()).ok() != Some(last_ticket) {
            return Err(format!(
                "{} tickets stored but {last_ticket} allocated",
                self.tickets.len()
            ));
        }

        let mut minted: BTreeMap<EventId, u64> = BTreeMap::new();
        for ticket in self.tickets.iter() {
            if !(1..=last_ticket).contains(&ticket.ticket_id.value()) {
                return Err(format!("ticket {} was never allocated", ticket.ticket_id));
            }
            if self.events.get(ticket.event_id).is_none() {
                return Err(format!(
                    "ticket {} belongs to missing event {}",
                    ticket.ticket_id, ticket.event_id
                ));
            }
            *minted.entry(ticket.event_id).or_default() += 1;
        }

        for event in self.events.iter() {
            if !(1..=last_event).contains(&event.event_id.value()) {
                return Err(format!("event {} was never allocated", event.event_id));
            }
            let count = minted.get(&event.event_id).copied().unwrap_or(0);
            if count != event.tickets_sold {
                return Err(format!(
                    "event {} counts {} sold but has {count} tickets",
                    event.event_id, event.tickets_sold
                ));
            }
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn tickets_mut(&mut self) -> &mut TicketLedger {
        &mut self.tickets
    }
}

/// Collaborators the hosting ledger supplies
#[derive(Clone)]
pub struct TicketingEnvironment {
    /// Ledger height source
    pub clock: Arc<dyn LedgerClock>,
    /// Currency transfers
    pub payments: Arc<dyn PaymentPrimitive>,
}

impl TicketingEnvironment {
    /// Creates an environment
    #[must_use]
    pub fn new(clock: Arc<dyn LedgerClock>, payments: Arc<dyn PaymentPrimitive>) -> Self {
        Self { clock, payments }
    }
}

// ============================================================================
// Reducer
// ============================================================================

/// Reducer for [`TicketingCommand`]
#[derive(Clone, Copy, Debug, Default)]
pub struct TicketingReducer;

impl TicketingReducer {
    /// Creates the reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn check_seat_zone(seat_zone: &str) -> TicketingResult<()> {
        let len = seat_zone.chars().count();
        if len > MAX_SEAT_ZONE_LEN {
            return Err(TicketingError::InvalidParams(format!(
                "seat zone is {len} characters, limit is {MAX_SEAT_ZONE_LEN}"
            )));
        }
        Ok(())
    }

    fn purchase(
        state: &mut TicketingState,
        env: &TicketingEnvironment,
        caller: Principal,
        event_id: EventId,
        seat_zone: String,
    ) -> TicketingResult<Transition<TicketingOutput, LedgerEvent>> {
        Self::check_seat_zone(&seat_zone)?;
        let sale = state.events.ensure_on_sale(event_id)?;

        let receipt = env
            .payments
            .transfer(sale.ticket_price(), &caller, sale.organizer())?;
        tracing::debug!(event_id = %event_id, reference = receipt.reference, "Payment taken");

        state.events.commit_sale(sale);
        let ticket = state.tickets.mint(
            &mut state.ids,
            event_id,
            caller,
            seat_zone,
            env.clock.block_height(),
        );
        Ok(Transition::new(
            TicketingOutput::TicketIssued(ticket.ticket_id),
            smallvec![
                LedgerEvent::PaymentSettled {
                    event_id,
                    payer: receipt.from,
                    payee: receipt.to,
                    amount: receipt.amount,
                    reference: receipt.reference,
                },
                LedgerEvent::TicketMinted { ticket, paid: true },
            ],
        ))
    }
}

impl Reducer for TicketingReducer {
    type State = TicketingState;
    type Command = TicketingCommand;
    type Event = LedgerEvent;
    type Output = TicketingOutput;
    type Error = TicketingError;
    type Environment = TicketingEnvironment;

    fn reduce(
        &self,
        state: &mut TicketingState,
        command: TicketingCommand,
        env: &TicketingEnvironment,
    ) -> TicketingResult<Transition<TicketingOutput, LedgerEvent>> {
        match command {
            TicketingCommand::AuthorizeOrganizer { caller, organizer } => {
                state.registry.authorize(&caller, &organizer)?;
                Ok(Transition::new(
                    TicketingOutput::Unit,
                    smallvec![LedgerEvent::OrganizerAuthorized { organizer }],
                ))
            }

            TicketingCommand::RevokeOrganizer { caller, organizer } => {
                state.registry.revoke(&caller, &organizer)?;
                Ok(Transition::new(
                    TicketingOutput::Unit,
                    smallvec![LedgerEvent::OrganizerRevoked { organizer }],
                ))
            }

            TicketingCommand::CreateEvent {
                caller,
                event_name,
                total_supply,
                ticket_price,
                royalty_percent,
            } => {
                if !state.registry.may_create_events(&caller) {
                    return Err(TicketingError::Unauthorized(format!(
                        "{caller} is not an authorized organizer"
                    )));
                }
                let params = NewEvent {
                    event_name,
                    total_supply,
                    ticket_price,
                    royalty_percent,
                };
                let event = state.events.create(
                    &mut state.ids,
                    caller,
                    params,
                    env.clock.block_height(),
                )?;
                Ok(Transition::new(
                    TicketingOutput::EventCreated(event.event_id),
                    smallvec![LedgerEvent::EventCreated { event }],
                ))
            }

            TicketingCommand::MintTicket {
                caller,
                event_id,
                seat_zone,
            } => {
                Self::check_seat_zone(&seat_zone)?;
                state.events.record_sale(event_id)?;
                let ticket = state.tickets.mint(
                    &mut state.ids,
                    event_id,
                    caller,
                    seat_zone,
                    env.clock.block_height(),
                );
                Ok(Transition::new(
                    TicketingOutput::TicketIssued(ticket.ticket_id),
                    smallvec![LedgerEvent::TicketMinted {
                        ticket,
                        paid: false
                    }],
                ))
            }

            TicketingCommand::PurchaseTicket {
                caller,
                event_id,
                seat_zone,
            } => Self::purchase(state, env, caller, event_id, seat_zone),

            TicketingCommand::TransferTicket {
                caller,
                ticket_id,
                sender,
                recipient,
            } => {
                state
                    .tickets
                    .transfer(caller == sender, &sender, &recipient, ticket_id)?;
                Ok(Transition::new(
                    TicketingOutput::Unit,
                    smallvec![LedgerEvent::TicketTransferred {
                        ticket_id,
                        from: sender,
                        to: recipient,
                    }],
                ))
            }

            TicketingCommand::DeactivateEvent { caller, event_id } => {
                state.events.deactivate(&caller, event_id)?;
                Ok(Transition::new(
                    TicketingOutput::Unit,
                    smallvec![LedgerEvent::EventDeactivated { event_id }],
                ))
            }
        }
    }
}
