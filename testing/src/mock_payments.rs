//! Scriptable in-memory payment primitive
//!
//! [`MockPayments`] keeps balances per principal and records every receipt it
//! issues, so tests can assert exactly what the ledger asked the payment
//! layer to do.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use ticket_ledger_core::payment::{PaymentError, PaymentPrimitive, PaymentReceipt, PaymentResult};
use ticket_ledger_core::{Money, Principal};

#[derive(Debug, Default)]
struct Book {
    balances: HashMap<Principal, Money>,
    unlimited: bool,
    refuse_all: bool,
    next_reference: u64,
    issued: Vec<PaymentReceipt>,
}

/// In-memory payment primitive for tests.
///
/// Clones share the same book, so a test can keep one handle while the
/// environment owns another.
///
/// # Example
///
/// ```
/// use ticket_ledger_testing::MockPayments;
/// use ticket_ledger_core::payment::PaymentPrimitive;
/// use ticket_ledger_core::{Money, Principal};
///
/// let payments = MockPayments::with_balances([("ST1BUYER", 100)]);
/// let buyer = Principal::from("ST1BUYER");
/// let seller = Principal::from("ST1SELLER");
///
/// assert!(payments.transfer(Money::from_units(60), &buyer, &seller).is_ok());
/// assert!(payments.transfer(Money::from_units(60), &buyer, &seller).is_err());
/// assert_eq!(payments.balance_of(&seller), Money::from_units(60));
/// ```
#[derive(Clone, Debug, Default)]
pub struct MockPayments {
    book: Arc<Mutex<Book>>,
}

impl MockPayments {
    /// A primitive that accepts every well-formed transfer without tracking funds
    #[must_use]
    pub fn unlimited() -> Self {
        let payments = Self::default();
        payments.with_book(|book| book.unlimited = true);
        payments
    }

    /// A primitive that refuses every transfer with `InsufficientFunds`
    #[must_use]
    pub fn refusing() -> Self {
        let payments = Self::default();
        payments.with_book(|book| book.refuse_all = true);
        payments
    }

    /// A primitive seeded with the given balances (smallest units)
    #[must_use]
    pub fn with_balances<'a>(balances: impl IntoIterator<Item = (&'a str, u64)>) -> Self {
        let payments = Self::default();
        payments.with_book(|book| {
            for (account, units) in balances {
                book.balances
                    .insert(Principal::from(account), Money::from_units(units));
            }
        });
        payments
    }

    /// Credit an account
    pub fn fund(&self, account: &Principal, amount: Money) {
        self.with_book(|book| {
            let balance = book.balances.entry(account.clone()).or_default();
            *balance = balance.checked_add(amount).unwrap_or(Money::from_units(u64::MAX));
        });
    }

    /// Current balance of an account (zero if never funded)
    #[must_use]
    pub fn balance_of(&self, account: &Principal) -> Money {
        self.with_book(|book| book.balances.get(account).copied().unwrap_or_default())
    }

    /// Receipts issued so far, in issue order
    #[must_use]
    pub fn settled(&self) -> Vec<PaymentReceipt> {
        self.with_book(|book| book.issued.clone())
    }

    fn with_book<T>(&self, f: impl FnOnce(&mut Book) -> T) -> T {
        let mut book = self.book.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut book)
    }
}

impl PaymentPrimitive for MockPayments {
    fn transfer(
        &self,
        amount: Money,
        from: &Principal,
        to: &Principal,
    ) -> PaymentResult<PaymentReceipt> {
        self.with_book(|book| {
            if amount.is_zero() {
                return Err(PaymentError::NonPositiveAmount);
            }
            if from == to {
                return Err(PaymentError::SameAccount(from.clone()));
            }

            let available = book.balances.get(from).copied().unwrap_or_default();
            if book.refuse_all || (!book.unlimited && available < amount) {
                return Err(PaymentError::InsufficientFunds {
                    account: from.clone(),
                    available,
                    needed: amount,
                });
            }

            if !book.unlimited {
                book.balances
                    .insert(from.clone(), available.checked_sub(amount).unwrap_or_default());
                let credited = book.balances.entry(to.clone()).or_default();
                *credited = credited.checked_add(amount).unwrap_or(Money::from_units(u64::MAX));
            }

            book.next_reference += 1;
            let receipt = PaymentReceipt {
                reference: book.next_reference,
                amount,
                from: from.clone(),
                to: to.clone(),
            };
            book.issued.push(receipt.clone());
            Ok(receipt)
        })
    }

}
