//! Organizer authorization.

use crate::error::{TicketingError, TicketingResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ticket_ledger_core::Principal;

/// Which principals may create events
///
/// The contract owner is fixed when the ledger is created and may always
/// create events, whatever the map says.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizerRegistry {
    contract_owner: Principal,
    organizers: BTreeMap<Principal, bool>,
}

impl OrganizerRegistry {
    /// Creates an empty registry owned by `contract_owner`
    #[must_use]
    pub const fn new(contract_owner: Principal) -> Self {
        Self {
            contract_owner,
            organizers: BTreeMap::new(),
        }
    }

    /// The contract owner
    #[must_use]
    pub const fn contract_owner(&self) -> &Principal {
        &self.contract_owner
    }

    /// Marks `organizer` as authorized
    ///
    /// # Errors
    ///
    /// Returns [`TicketingError::OwnerOnly`] unless `caller` is the contract owner.
    pub fn authorize(&mut self, caller: &Principal, organizer: &Principal) -> TicketingResult<()> {
        self.set(caller, organizer, true)
    }

    /// Marks `organizer` as not authorized
    ///
    /// # Errors
    ///
    /// Returns [`TicketingError::OwnerOnly`] unless `caller` is the contract owner.
    pub fn revoke(&mut self, caller: &Principal, organizer: &Principal) -> TicketingResult<()> {
        self.set(caller, organizer, false)
    }

    /// The stored flag, `false` when the principal was never registered
    #[must_use]
    pub fn is_authorized_organizer(&self, principal: &Principal) -> bool {
        self.organizers.get(principal).copied().unwrap_or(false)
    }

    /// True for the contract owner and for authorized organizers
    #[must_use]
    pub fn may_create_events(&self, principal: &Principal) -> bool {
        *principal == self.contract_owner || self.is_authorized_organizer(principal)
    }

    fn set(&mut self, caller: &Principal, organizer: &Principal, flag: bool) -> TicketingResult<()> {
        if *caller != self.contract_owner {
            return Err(TicketingError::OwnerOnly);
        }
        self.organizers.insert(organizer.clone(), flag);
        Ok(())
    }
}
