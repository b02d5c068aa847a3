//! Payment primitive offered by the hosting ledger.
//!
//! The ticketing ledger never holds balances itself. Settlement of a ticket
//! purchase is delegated to whatever moves currency between accounts on the
//! hosting ledger; this module is the seam.

use crate::principal::{Money, Principal};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Payment primitive result
pub type PaymentResult<T> = Result<T, PaymentError>;

/// Reasons the payment primitive can refuse a transfer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaymentError {
    /// The payer cannot cover the amount
    #[error("insufficient funds: {account} holds {available}, needs {needed}")]
    InsufficientFunds {
        /// Account that was debited
        account: Principal,
        /// Balance held
        available: Money,
        /// Amount requested
        needed: Money,
    },

    /// Zero-amount transfers are refused
    #[error("transfer amount must be positive")]
    NonPositiveAmount,

    /// Payer and payee are the same account
    #[error("sender and recipient are the same account: {0}")]
    SameAccount(Principal),
}

/// Proof that a transfer was applied
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    /// Primitive-assigned reference, unique per issued receipt
    pub reference: u64,
    /// Amount moved
    pub amount: Money,
    /// Debited account
    pub from: Principal,
    /// Credited account
    pub to: Principal,
}

/// Payment primitive trait
///
/// `transfer` must leave no side effect when it fails. A successful transfer
/// is final, so the ledger calls it only once nothing else in the operation
/// can fail.
pub trait PaymentPrimitive: Send + Sync {
    /// Move `amount` from `from` to `to`
    ///
    /// # Errors
    ///
    /// Returns a [`PaymentError`] if the transfer cannot be applied; nothing
    /// has moved in that case.
    fn transfer(
        &self,
        amount: Money,
        from: &Principal,
        to: &Principal,
    ) -> PaymentResult<PaymentReceipt>;
}
