//! The ledger facade.
//!
//! [`TicketingLedger`] is what integrators call. It turns each wire
//! operation into a [`TicketingCommand`], sends it through the store, and
//! records logs and business metrics for the outcome. Reads go straight to
//! the current state and never fail.

use crate::config::Config;
use crate::error::{TicketingError, TicketingResult};
use crate::metrics;
use crate::service::{
    LedgerEvent, TicketingCommand, TicketingEnvironment, TicketingOutput, TicketingReducer,
    TicketingState,
};
use crate::types::{Event, EventId, Ticket, TicketId};
use std::sync::Arc;
use ticket_ledger_core::environment::{BlockCounter, BlockHeight};
use ticket_ledger_core::journal::Committed;
use ticket_ledger_core::payment::PaymentPrimitive;
use ticket_ledger_core::{Money, Principal};
use ticket_ledger_runtime::{Store, StoreConfig};
use tokio::sync::broadcast;

/// Snapshot encode/decode failures
pub use ticket_ledger_runtime::StoreError as SnapshotError;

/// Async handle onto one ticketing ledger
///
/// Cloning is cheap; every clone drives the same ledger.
#[derive(Clone)]
pub struct TicketingLedger {
    store: Store<TicketingReducer>,
    token_uri_base: Arc<str>,
    blocks: Option<Arc<BlockCounter>>,
}

impl TicketingLedger {
    /// Creates an empty ledger run by the given environment
    #[must_use]
    pub fn new(config: &Config, environment: TicketingEnvironment) -> Self {
        let store = Store::with_config(
            TicketingState::new(config.contract_owner.clone()),
            TicketingReducer::new(),
            environment,
            Self::store_config(config),
        );
        Self::assemble(store, config, None)
    }

    /// Creates an empty ledger that keeps its own block counter
    ///
    /// Every command runs in the next block, starting from height 1.
    #[must_use]
    pub fn in_memory<P>(config: &Config, payments: P) -> Self
    where
        P: PaymentPrimitive + 'static,
    {
        let blocks = Arc::new(BlockCounter::starting_at(BlockHeight::GENESIS));
        let environment = TicketingEnvironment::new(blocks.clone(), Arc::new(payments));
        let store = Store::with_config(
            TicketingState::new(config.contract_owner.clone()),
            TicketingReducer::new(),
            environment,
            Self::store_config(config),
        );
        Self::assemble(store, config, Some(blocks))
    }

    /// Rebuilds a ledger from bytes produced by [`snapshot`](Self::snapshot)
    ///
    /// The contract owner comes from the snapshot, not from `config`. The
    /// decoded state must pass [`TicketingState::validate`].
    ///
    /// # Errors
    ///
    /// - [`SnapshotError::SnapshotDecode`] if the bytes are not a ledger snapshot
    /// - [`SnapshotError::InvalidSnapshot`] if the decoded state breaks a ledger invariant
    pub fn restore(
        bytes: &[u8],
        config: &Config,
        environment: TicketingEnvironment,
    ) -> Result<Self, SnapshotError> {
        let store = Store::restore(
            bytes,
            TicketingState::validate,
            TicketingReducer::new(),
            environment,
            &Self::store_config(config),
        )?;
        Ok(Self::assemble(store, config, None))
    }

    fn store_config(config: &Config) -> StoreConfig {
        StoreConfig::default()
            .with_broadcast_capacity(config.journal_capacity)
            .with_journal_retention(config.journal_retention)
    }

    fn assemble(
        store: Store<TicketingReducer>,
        config: &Config,
        blocks: Option<Arc<BlockCounter>>,
    ) -> Self {
        Self {
            store,
            token_uri_base: Arc::from(config.token_uri_base.as_str()),
            blocks,
        }
    }

    /// Runs a command that hands back an id, converting the output to it
    async fn execute_for<T>(&self, command: TicketingCommand) -> TicketingResult<T>
    where
        T: TryFrom<TicketingOutput, Error = TicketingOutput>,
    {
        let name = command.name();
        let output = self.execute(command).await?;
        T::try_from(output).map_err(|other| {
            tracing::error!(command = name, output = ?other, "Command committed an unexpected output");
            TicketingError::NotFound(format!("id from {name}, got {other:?}"))
        })
    }

    async fn execute(&self, command: TicketingCommand) -> TicketingResult<TicketingOutput> {
        let name = command.name();
        if let Some(blocks) = &self.blocks {
            blocks.advance();
        }

        match self.store.send(command).await {
            Ok(commit) => {
                metrics::record_committed(&commit.entries);
                for entry in &commit.entries {
                    tracing::info!(
                        command = name,
                        sequence = entry.sequence,
                        event_type = entry.event_type(),
                        "Committed"
                    );
                }
                Ok(commit.output)
            }
            Err(error) => {
                metrics::record_rejection(name, error.code());
                tracing::warn!(command = name, code = error.code(), %error, "Command rejected");
                Err(error)
            }
        }
    }

    // ========================================================================
    // Organizer authorization
    // ========================================================================

    /// Allow `organizer` to create events
    ///
    /// # Errors
    ///
    /// [`OwnerOnly`](crate::TicketingError::OwnerOnly) unless `caller` is the contract owner.
    pub async fn authorize_organizer(
        &self,
        caller: &Principal,
        organizer: &Principal,
    ) -> TicketingResult<()> {
        self.execute(TicketingCommand::AuthorizeOrganizer {
            caller: caller.clone(),
            organizer: organizer.clone(),
        })
        .await
        .map(|_| ())
    }

    /// Withdraw `organizer`'s permission to create events
    ///
    /// Events the organizer already created are unaffected.
    ///
    /// # Errors
    ///
    /// [`OwnerOnly`](crate::TicketingError::OwnerOnly) unless `caller` is the contract owner.
    pub async fn revoke_organizer(
        &self,
        caller: &Principal,
        organizer: &Principal,
    ) -> TicketingResult<()> {
        self.execute(TicketingCommand::RevokeOrganizer {
            caller: caller.clone(),
            organizer: organizer.clone(),
        })
        .await
        .map(|_| ())
    }

    // ========================================================================
    // Events
    // ========================================================================

    /// Create an event organized by `caller`
    ///
    /// # Errors
    ///
    /// - [`Unauthorized`](crate::TicketingError::Unauthorized) unless `caller`
    ///   is the contract owner or an authorized organizer
    /// - [`InvalidParams`](crate::TicketingError::InvalidParams) for an empty or
    ///   over-long name, zero supply, zero price, or royalty above 50
    pub async fn create_event(
        &self,
        caller: &Principal,
        event_name: &str,
        total_supply: u64,
        ticket_price: Money,
        royalty_percent: u8,
    ) -> TicketingResult<EventId> {
        self.execute_for(TicketingCommand::CreateEvent {
            caller: caller.clone(),
            event_name: event_name.to_string(),
            total_supply,
            ticket_price,
            royalty_percent,
        })
        .await
    }

    /// Take an event off sale permanently
    ///
    /// # Errors
    ///
    /// - [`NotFound`](crate::TicketingError::NotFound) if the event does not exist
    /// - [`Unauthorized`](crate::TicketingError::Unauthorized) unless `caller` organizes it
    pub async fn deactivate_event(
        &self,
        caller: &Principal,
        event_id: EventId,
    ) -> TicketingResult<()> {
        self.execute(TicketingCommand::DeactivateEvent {
            caller: caller.clone(),
            event_id,
        })
        .await
        .map(|_| ())
    }

    // ========================================================================
    // Tickets
    // ========================================================================

    /// Mint a ticket to `caller` without collecting payment
    ///
    /// Anyone may call this for any active event. Deployments that need every
    /// ticket paid for must keep this entry point behind a trusted organizer
    /// flow and expose only [`purchase_ticket`](Self::purchase_ticket) publicly.
    ///
    /// # Errors
    ///
    /// - [`NotFound`](crate::TicketingError::NotFound) if the event is missing or inactive
    /// - [`SoldOut`](crate::TicketingError::SoldOut) if no tickets remain
    /// - [`InvalidParams`](crate::TicketingError::InvalidParams) if `seat_zone` is over 20 characters
    pub async fn mint_ticket(
        &self,
        caller: &Principal,
        event_id: EventId,
        seat_zone: &str,
    ) -> TicketingResult<TicketId> {
        self.execute_for(TicketingCommand::MintTicket {
            caller: caller.clone(),
            event_id,
            seat_zone: seat_zone.to_string(),
        })
        .await
    }

    /// Pay the ticket price to the organizer and mint a ticket to `caller`
    ///
    /// # Errors
    ///
    /// As [`mint_ticket`](Self::mint_ticket), plus
    /// [`InsufficientPayment`](crate::TicketingError::InsufficientPayment)
    /// when the payment primitive refuses the transfer. No money moves on any error.
    pub async fn purchase_ticket(
        &self,
        caller: &Principal,
        event_id: EventId,
        seat_zone: &str,
    ) -> TicketingResult<TicketId> {
        self.execute_for(TicketingCommand::PurchaseTicket {
            caller: caller.clone(),
            event_id,
            seat_zone: seat_zone.to_string(),
        })
        .await
    }

    /// Move a ticket from `sender` to `recipient`
    ///
    /// # Errors
    ///
    /// - [`NotFound`](crate::TicketingError::NotFound) if the ticket does not exist
    /// - [`Unauthorized`](crate::TicketingError::Unauthorized) if `caller` is not
    ///   `sender`, `sender` does not hold the ticket, or it has been used
    pub async fn transfer_ticket(
        &self,
        caller: &Principal,
        ticket_id: TicketId,
        sender: &Principal,
        recipient: &Principal,
    ) -> TicketingResult<()> {
        self.execute(TicketingCommand::TransferTicket {
            caller: caller.clone(),
            ticket_id,
            sender: sender.clone(),
            recipient: recipient.clone(),
        })
        .await
        .map(|_| ())
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Event record, if it exists
    pub async fn get_event_info(&self, event_id: EventId) -> Option<Event> {
        self.store
            .state(|state| state.events().get(event_id).cloned())
            .await
    }

    /// Ticket record, if it exists
    pub async fn get_ticket_info(&self, ticket_id: TicketId) -> Option<Ticket> {
        self.store
            .state(|state| state.tickets().get(ticket_id).cloned())
            .await
    }

    /// Tickets left for an event, 0 if the event does not exist
    pub async fn get_tickets_remaining(&self, event_id: EventId) -> u64 {
        self.store
            .state(|state| state.events().remaining(event_id))
            .await
    }

    /// Current holder of a ticket
    pub async fn get_ticket_owner(&self, ticket_id: TicketId) -> Option<Principal> {
        self.store
            .state(|state| state.tickets().owner_of(ticket_id).cloned())
            .await
    }

    /// Id of the most recently minted ticket, 0 if none
    pub async fn get_last_token_id(&self) -> u64 {
        self.store.state(|state| state.ids().last_ticket_id()).await
    }

    /// Metadata URI of a ticket, if it exists
    pub async fn get_token_uri(&self, ticket_id: TicketId) -> Option<String> {
        let base = Arc::clone(&self.token_uri_base);
        self.store
            .state(move |state| state.tickets().token_uri(&base, ticket_id))
            .await
    }

    /// Whether `principal` is registered as an organizer
    ///
    /// The contract owner is not registered unless authorized explicitly,
    /// but may create events regardless.
    pub async fn is_authorized_organizer(&self, principal: &Principal) -> bool {
        self.store
            .state(|state| state.registry().is_authorized_organizer(principal))
            .await
    }

    /// The contract owner
    pub async fn contract_owner(&self) -> Principal {
        self.store
            .state(|state| state.registry().contract_owner().clone())
            .await
    }

    /// Tickets held by `owner`, in id order
    pub async fn tickets_of(&self, owner: &Principal) -> Vec<TicketId> {
        self.store.state(|state| state.tickets().tickets_of(owner)).await
    }

    // ========================================================================
    // Journal & snapshots
    // ========================================================================

    /// Retained ledger events with a sequence number above `after`
    ///
    /// The journal keeps the last `journal_retention` events.
    pub async fn journal_since(&self, after: u64) -> Vec<Committed<LedgerEvent>> {
        self.store.journal_since(after).await
    }

    /// Stream of ledger events committed from now on
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Committed<LedgerEvent>> {
        self.store.subscribe()
    }

    /// Encode the whole ledger state
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::SnapshotEncode`] if encoding fails.
    pub async fn snapshot(&self) -> Result<Vec<u8>, SnapshotError> {
        self.store.snapshot().await
    }
}
