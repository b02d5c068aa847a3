//! # Ticket Ledger Testing
//!
//! Testing utilities and helpers for the NFT ticketing ledger.
//!
//! This crate provides:
//! - Mock implementations of Environment traits (clock, payment primitive)
//! - A Given-When-Then harness for reducers
//! - Property-based testing strategies
//! - Tracing setup for tests
//!
//! ## Example
//!
//! ```ignore
//! use ticket_ledger_testing::{MockPayments, test_clock};
//! use ticket_ledger_runtime::Store;
//!
//! #[tokio::test]
//! async fn test_purchase_flow() {
//!     let payments = MockPayments::with_balances([("ST1BUYER", 500)]);
//!     let env = TicketingEnvironment::new(Arc::new(test_clock()), Arc::new(payments.clone()));
//!     let store = Store::new(TicketingState::new(owner), TicketingReducer::new(), env);
//!     // ...
//! }
//! ```

use ticket_ledger_core::environment::{BlockHeight, LedgerClock};

pub mod mock_payments;
pub mod reducer_test;

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{BlockHeight, LedgerClock};

    pub use crate::mock_payments::MockPayments;

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same height, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use ticket_ledger_testing::mocks::FixedClock;
    /// use ticket_ledger_core::environment::{BlockHeight, LedgerClock};
    ///
    /// let clock = FixedClock::new(BlockHeight::new(42));
    /// assert_eq!(clock.block_height(), clock.block_height());
    /// ```
    #[derive(Debug, Clone, Copy)]
    pub struct FixedClock {
        height: BlockHeight,
    }

    impl FixedClock {
        /// Create a new fixed clock at the given height
        #[must_use]
        pub const fn new(height: BlockHeight) -> Self {
            Self { height }
        }
    }

    impl LedgerClock for FixedClock {
        fn block_height(&self) -> BlockHeight {
            self.height
        }
    }

    /// Create a default fixed clock for tests (height 1000)
    #[must_use]
    pub const fn test_clock() -> FixedClock {
        FixedClock::new(BlockHeight::new(1000))
    }
}

/// Test helpers and utilities
pub mod helpers {
    /// Install a test-friendly tracing subscriber
    ///
    /// Honors `RUST_LOG` and writes through the test harness's captured
    /// output. Safe to call from every test; only the first call installs.
    pub fn init_test_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "warn".into()),
            )
            .with_test_writer()
            .try_init();
    }
}

/// Property-based testing utilities using proptest.
pub mod properties {
    use proptest::prelude::*;
    use proptest::sample::select;
    use ticket_ledger_core::Principal;

    /// A fixed pool of principals, so generated commands collide on identities
    #[must_use]
    pub fn principal_pool(size: usize) -> Vec<Principal> {
        (1..=size)
            .map(|i| Principal::new(format!("ST{i:04}TESTACCOUNT")))
            .collect()
    }

    /// Any principal from a pool of `size` accounts
    pub fn principal(size: usize) -> impl Strategy<Value = Principal> {
        select(principal_pool(size.max(1)))
    }

    /// Event names that pass validation (1 to 50 characters)
    pub fn event_name() -> impl Strategy<Value = String> {
        "[A-Za-z][A-Za-z0-9 ]{0,49}"
    }

    /// Seat zones that pass validation (at most 20 characters)
    pub fn seat_zone() -> impl Strategy<Value = String> {
        "[A-Z][0-9]{1,3}"
    }
}

// Re-export commonly used items
pub use mocks::{FixedClock, MockPayments, test_clock};
pub use reducer_test::ReducerTest;
