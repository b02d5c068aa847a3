//! Errors returned by ticketing commands.

use thiserror::Error;
use ticket_ledger_core::payment::PaymentError;

/// Result type for ticketing commands
pub type TicketingResult<T> = Result<T, TicketingError>;

/// Why a ticketing command was rejected
///
/// Every variant aborts the whole command; the ledger is left exactly as it
/// was before the command ran.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TicketingError {
    /// The caller is not the contract owner
    #[error("Only the contract owner may do this")]
    OwnerOnly,

    /// The event or ticket does not exist (or the event is no longer on sale)
    #[error("{0} not found")]
    NotFound(String),

    /// Reserved for duplicate registrations
    #[error("{0} already exists")]
    AlreadyExists(String),

    /// The payment primitive refused the transfer
    #[error("Payment failed: {0}")]
    InsufficientPayment(#[from] PaymentError),

    /// Every ticket for the event has been minted
    #[error("Event {0} is sold out")]
    SoldOut(u64),

    /// Malformed input
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    /// The caller lacks permission on this event or ticket
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

impl TicketingError {
    /// Stable numeric code for this error kind
    #[must_use]
    pub const fn code(&self) -> u32 {
        match self {
            Self::OwnerOnly => 100,
            Self::NotFound(_) => 101,
            Self::AlreadyExists(_) => 102,
            Self::InsufficientPayment(_) => 103,
            Self::SoldOut(_) => 104,
            Self::InvalidParams(_) => 105,
            Self::Unauthorized(_) => 106,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(TicketingError::OwnerOnly.code(), 100);
        assert_eq!(TicketingError::NotFound("event 1".into()).code(), 101);
        assert_eq!(TicketingError::AlreadyExists("event 1".into()).code(), 102);
        assert_eq!(
            TicketingError::from(PaymentError::NonPositiveAmount).code(),
            103
        );
        assert_eq!(TicketingError::SoldOut(1).code(), 104);
        assert_eq!(TicketingError::InvalidParams("name".into()).code(), 105);
        assert_eq!(TicketingError::Unauthorized("not owner".into()).code(), 106);
    }

    #[test]
    fn test_payment_error_is_kept_as_source() {
        let error = TicketingError::from(PaymentError::NonPositiveAmount);
        assert!(std::error::Error::source(&error).is_some());
    }
}
