//! # Ticket Ledger Core
//!
//! Substrate interfaces for the NFT ticketing ledger.
//!
//! This crate holds the abstractions the ticketing domain is written against,
//! without any of the domain rules themselves:
//!
//! - **Reducer**: `(State, Command, Environment) → Result<Transition, Error>`
//! - **Transition**: the output of a successful command plus the ledger events it committed
//! - **Environment**: injected collaborators ([`environment::LedgerClock`],
//!   [`payment::PaymentPrimitive`])
//! - **Journal**: the [`journal::Committed`] envelope every committed event is wrapped in
//!
//! ## Execution model
//!
//! The hosting ledger runs one command at a time in a total order. A reducer
//! either returns `Ok(Transition)` and every mutation it made is kept, or it
//! returns `Err` without having mutated anything. Reducers never block and
//! never suspend.
//!
//! ## Example
//!
//! ```
//! use ticket_ledger_core::reducer::{Reducer, Transition};
//! use ticket_ledger_core::smallvec;
//!
//! #[derive(Clone, Default)]
//! struct Tally {
//!     count: u64,
//! }
//!
//! enum TallyCommand {
//!     Bump,
//! }
//!
//! struct TallyReducer;
//!
//! impl Reducer for TallyReducer {
//!     type State = Tally;
//!     type Command = TallyCommand;
//!     type Event = u64;
//!     type Output = u64;
//!     type Error = std::convert::Infallible;
//!     type Environment = ();
//!
//!     fn reduce(
//!         &self,
//!         state: &mut Tally,
//!         command: TallyCommand,
//!         _env: &(),
//!     ) -> Result<Transition<u64, u64>, Self::Error> {
//!         match command {
//!             TallyCommand::Bump => {
//!                 state.count += 1;
//!                 Ok(Transition::new(state.count, smallvec![state.count]))
//!             }
//!         }
//!     }
//! }
//!
//! let mut state = Tally::default();
//! let transition = TallyReducer.reduce(&mut state, TallyCommand::Bump, &()).unwrap_or_default();
//! assert_eq!(transition.output, 1);
//! ```

pub mod journal;
pub mod payment;
pub mod principal;

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};
pub use smallvec::{SmallVec, smallvec};

pub use principal::{Money, Principal};

/// Reducer module - The core trait for ledger business logic
///
/// Reducers are deterministic functions over owned state. Given the same
/// state, command, and environment answers they produce the same transition
/// or the same error.
pub mod reducer {
    use smallvec::SmallVec;

    /// Ledger events committed by a single command.
    ///
    /// Most commands commit one or two events, so four inline slots avoid a
    /// heap allocation on the hot path.
    pub type Events<E> = SmallVec<[E; 4]>;

    /// The result of a successful command
    ///
    /// # Type Parameters
    ///
    /// - `O`: The value returned to the caller (an allocated id, `()`, ...)
    /// - `E`: The ledger event type recorded in the journal
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct Transition<O, E> {
        /// Value handed back to the caller
        pub output: O,
        /// Events describing every state change the command made
        pub events: Events<E>,
    }

    impl<O, E> Transition<O, E> {
        /// Creates a transition from an output and the events it committed
        #[must_use]
        pub const fn new(output: O, events: Events<E>) -> Self {
            Self { output, events }
        }
    }

    impl<O: Default, E> Default for Transition<O, E> {
        fn default() -> Self {
            Self {
                output: O::default(),
                events: SmallVec::new(),
            }
        }
    }

    /// The Reducer trait - core abstraction for ledger business logic
    ///
    /// # Type Parameters
    ///
    /// - `State`: The ledger state this reducer operates on
    /// - `Command`: The command type this reducer processes
    /// - `Event`: The event type committed on success
    /// - `Output`: The value returned to the caller on success
    /// - `Error`: The rejection type
    /// - `Environment`: The injected collaborators this reducer needs
    ///
    /// # Atomicity
    ///
    /// A reducer checks every rejection condition before it mutates `state`,
    /// so returning `Err` leaves the state exactly as it was. The runtime
    /// relies on this and keeps no copy of the state to fall back to.
    /// Collaborator calls reached through the environment (payments) must be
    /// the last fallible step, so nothing can fail after they take effect.
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The command type this reducer processes
        type Command;

        /// The event type committed on success
        type Event;

        /// The value returned to the caller on success
        type Output;

        /// The rejection type
        type Error;

        /// The environment type with injected dependencies
        type Environment;

        /// Apply a command to the state
        ///
        /// # Errors
        ///
        /// Returns the reducer's error type when the command is rejected, with
        /// `state` untouched.
        fn reduce(
            &self,
            state: &mut Self::State,
            command: Self::Command,
            env: &Self::Environment,
        ) -> Result<Transition<Self::Output, Self::Event>, Self::Error>;
    }
}

/// Environment module - Dependency injection traits
///
/// All answers a reducer needs from the hosting ledger are abstracted behind
/// traits and injected via the Environment parameter.
pub mod environment {
    use serde::{Deserialize, Serialize};
    use std::fmt;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Logical ledger height at which an operation executes
    #[derive(
        Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
    )]
    pub struct BlockHeight(u64);

    impl BlockHeight {
        /// The height of the genesis block
        pub const GENESIS: Self = Self(0);

        /// Creates a height from its raw value
        #[must_use]
        pub const fn new(height: u64) -> Self {
            Self(height)
        }

        /// Returns the raw height
        #[must_use]
        pub const fn value(&self) -> u64 {
            self.0
        }
    }

    impl fmt::Display for BlockHeight {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}", self.0)
        }
    }

    /// Clock trait - supplies the ledger height an operation executes at
    ///
    /// # Examples
    ///
    /// ```
    /// use ticket_ledger_core::environment::{BlockCounter, BlockHeight, LedgerClock};
    ///
    /// let clock = BlockCounter::starting_at(BlockHeight::new(10));
    /// assert_eq!(clock.block_height(), BlockHeight::new(10));
    /// clock.advance();
    /// assert_eq!(clock.block_height(), BlockHeight::new(11));
    /// ```
    pub trait LedgerClock: Send + Sync {
        /// Get the current ledger height
        fn block_height(&self) -> BlockHeight;
    }

    /// In-process block counter
    ///
    /// Stands in for the hosting ledger's height when the ledger runs
    /// embedded in a single process. The height only moves when
    /// [`advance`](Self::advance) is called.
    #[derive(Debug, Default)]
    pub struct BlockCounter {
        height: AtomicU64,
    }

    impl BlockCounter {
        /// Creates a counter at the given height
        #[must_use]
        pub const fn starting_at(height: BlockHeight) -> Self {
            Self {
                height: AtomicU64::new(height.value()),
            }
        }

        /// Moves to the next block and returns the new height
        pub fn advance(&self) -> BlockHeight {
            BlockHeight(self.height.fetch_add(1, Ordering::AcqRel) + 1)
        }
    }

    impl LedgerClock for BlockCounter {
        fn block_height(&self) -> BlockHeight {
            BlockHeight(self.height.load(Ordering::Acquire))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::environment::{BlockCounter, BlockHeight, LedgerClock};

    #[test]
    fn test_block_counter_advances_by_one() {
        let clock = BlockCounter::starting_at(BlockHeight::GENESIS);
        assert_eq!(clock.block_height(), BlockHeight::new(0));
        assert_eq!(clock.advance(), BlockHeight::new(1));
        assert_eq!(clock.advance(), BlockHeight::new(2));
        assert_eq!(clock.block_height(), BlockHeight::new(2));
    }
}
