//! # Ticket Ledger Runtime
//!
//! The single-writer [`Store`] that executes ledger commands.
//!
//! ## Core Components
//!
//! - **Store**: owns the ledger state and runs one command at a time
//! - **Journal**: the most recent committed events, in commit order, with their sequence numbers
//! - **Broadcast**: live stream of committed events for observers
//! - **Snapshots**: `bincode` encoding of the full state for export and restore
//!
//! ## Atomicity
//!
//! Each command runs under the store's write lock. Reducers reject before
//! they mutate (see [`Reducer`]), so observers only ever see the state before
//! the command or the state after all of it. The store keeps no copy of the
//! state, which keeps a command's cost independent of the ledger's size.
//!
//! ## Example
//!
//! ```ignore
//! use ticket_ledger_runtime::Store;
//!
//! let store = Store::new(initial_state, my_reducer, environment);
//!
//! // Send a command
//! let commit = store.send(Command::DoSomething).await?;
//! println!("{:?} committed {} events", commit.output, commit.entries.len());
//!
//! // Read state
//! let value = store.state(|s| s.some_field).await;
//! ```

use chrono::Utc;
use serde::{Serialize, de::DeserializeOwned};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;
use ticket_ledger_core::journal::{Committed, JournalEvent};
use ticket_ledger_core::reducer::{Events, Reducer};
use tokio::sync::{RwLock, broadcast};

/// Prometheus metrics for observability
pub mod metrics;

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations outside command execution
    ///
    /// Command rejections are the reducer's own error type and are returned
    /// unchanged from [`Store::send`](crate::Store::send).
    #[derive(Error, Debug)]
    pub enum StoreError {
        /// The state could not be encoded into a snapshot
        #[error("Failed to encode snapshot: {0}")]
        SnapshotEncode(#[source] bincode::Error),

        /// A snapshot could not be decoded
        #[error("Failed to decode snapshot: {0}")]
        SnapshotDecode(#[source] bincode::Error),

        /// A snapshot decoded to a state that breaks the ledger's invariants
        #[error("Snapshot state is inconsistent: {0}")]
        InvalidSnapshot(String),
    }
}

pub use error::StoreError;

/// The result of a committed command
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Commit<O, E> {
    /// Value the reducer handed back to the caller
    pub output: O,
    /// Journal entries appended for this command, in order
    pub entries: Vec<Committed<E>>,
}

/// Configuration for a [`Store`]
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Number of committed events buffered for slow subscribers
    pub broadcast_capacity: usize,
    /// Number of most recent committed events kept for [`Store::journal_since`]
    pub journal_retention: usize,
}

impl StoreConfig {
    /// Sets the broadcast buffer size
    #[must_use]
    pub const fn with_broadcast_capacity(mut self, capacity: usize) -> Self {
        self.broadcast_capacity = capacity;
        self
    }

    /// Sets how many committed events the journal keeps
    #[must_use]
    pub const fn with_journal_retention(mut self, retention: usize) -> Self {
        self.journal_retention = retention;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            broadcast_capacity: 256,
            journal_retention: 10_000,
        }
    }
}

/// State plus journal, guarded together so a commit updates both at once
struct LedgerCell<S, E> {
    state: S,
    journal: VecDeque<Committed<E>>,
    retention: usize,
    last_sequence: u64,
}

impl<S, E: JournalEvent> LedgerCell<S, E> {
    fn append(&mut self, events: Events<E>) -> Vec<Committed<E>> {
        let recorded_at = Utc::now();
        let mut committed = Vec::with_capacity(events.len());
        for event in events {
            self.last_sequence += 1;
            let entry = Committed::new(self.last_sequence, recorded_at, event);
            self.journal.push_back(entry.clone());
            committed.push(entry);
        }

        let excess = self.journal.len().saturating_sub(self.retention);
        if excess > 0 {
            self.journal.drain(..excess);
            metrics::counter!("ledger_journal_evicted_total").increment(excess as u64);
        }
        committed
    }
}

/// The Store - single-writer runtime for a ledger reducer
///
/// Cloning a store is cheap and yields another handle onto the same ledger.
///
/// # Type Parameters
///
/// - `R`: Reducer implementation; its associated types fix the state,
///   command, event, output, error and environment types
pub struct Store<R: Reducer> {
    cell: Arc<RwLock<LedgerCell<R::State, R::Event>>>,
    reducer: Arc<R>,
    environment: Arc<R::Environment>,
    committed: broadcast::Sender<Committed<R::Event>>,
}

impl<R: Reducer> Clone for Store<R> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
            reducer: Arc::clone(&self.reducer),
            environment: Arc::clone(&self.environment),
            committed: self.committed.clone(),
        }
    }
}

impl<R> Store<R>
where
    R: Reducer,
    R::Event: JournalEvent,
    R::Error: std::fmt::Display,
{
    /// Create a new store with initial state, reducer, and environment
    ///
    /// Uses [`StoreConfig::default`] (broadcast capacity 256, journal retention 10 000).
    #[must_use]
    pub fn new(initial_state: R::State, reducer: R, environment: R::Environment) -> Self {
        Self::with_config(initial_state, reducer, environment, StoreConfig::default())
    }

    /// Create a new store with custom configuration
    #[must_use]
    pub fn with_config(
        initial_state: R::State,
        reducer: R,
        environment: R::Environment,
        config: StoreConfig,
    ) -> Self {
        Self::assemble(initial_state, 0, reducer, environment, &config)
    }

    fn assemble(
        state: R::State,
        last_sequence: u64,
        reducer: R,
        environment: R::Environment,
        config: &StoreConfig,
    ) -> Self {
        let (committed, _) = broadcast::channel(config.broadcast_capacity.max(1));

        Self {
            cell: Arc::new(RwLock::new(LedgerCell {
                state,
                journal: VecDeque::new(),
                retention: config.journal_retention,
                last_sequence,
            })),
            reducer: Arc::new(reducer),
            environment: Arc::new(environment),
            committed,
        }
    }

    /// Rebuild a store from a snapshot produced by [`Store::snapshot`]
    ///
    /// The decoded state is handed to `check` before the store is built, so
    /// a state the reducer could never have produced is refused rather than
    /// served. The journal of the restored store starts empty; sequence
    /// numbers continue from where the snapshotted store left off.
    ///
    /// # Errors
    ///
    /// - [`StoreError::SnapshotDecode`] if the bytes are not a valid snapshot
    /// - [`StoreError::InvalidSnapshot`] with `check`'s reason if it refuses the state
    pub fn restore<F>(
        bytes: &[u8],
        check: F,
        reducer: R,
        environment: R::Environment,
        config: &StoreConfig,
    ) -> Result<Self, StoreError>
    where
        R::State: DeserializeOwned,
        F: FnOnce(&R::State) -> Result<(), String>,
    {
        let (last_sequence, state): (u64, R::State) =
            bincode::deserialize(bytes).map_err(StoreError::SnapshotDecode)?;
        if let Err(reason) = check(&state) {
            tracing::warn!(%reason, "Refusing inconsistent snapshot");
            return Err(StoreError::InvalidSnapshot(reason));
        }
        tracing::info!(last_sequence, "Restored store from snapshot");
        Ok(Self::assemble(
            state,
            last_sequence,
            reducer,
            environment,
            config,
        ))
    }

    /// Execute a command atomically
    ///
    /// The command runs under the write lock. On success the committed events
    /// are appended to the journal and broadcast before the lock is released,
    /// so subscribers observe events in commit order. On rejection the
    /// reducer has left the state untouched and nothing is journaled.
    ///
    /// # Errors
    ///
    /// Returns the reducer's error unchanged when the command is rejected.
    #[tracing::instrument(skip(self, command), name = "store_send")]
    pub async fn send(
        &self,
        command: R::Command,
    ) -> Result<Commit<R::Output, R::Event>, R::Error> {
        metrics::counter!("ledger_commands_total").increment(1);

        let mut cell = self.cell.write().await;
        tracing::trace!("Acquired write lock on ledger");

        let start = Instant::now();
        let result = {
            let span = tracing::debug_span!("reducer_execution");
            let _enter = span.enter();
            self.reducer
                .reduce(&mut cell.state, command, &self.environment)
        };
        metrics::histogram!("ledger_reducer_duration_seconds")
            .record(start.elapsed().as_secs_f64());

        match result {
            Ok(transition) => {
                let committed = cell.append(transition.events);
                metrics::counter!("ledger_events_committed_total")
                    .increment(committed.len() as u64);
                tracing::trace!(events = committed.len(), "Command committed");

                for entry in &committed {
                    if self.committed.send(entry.clone()).is_err() {
                        tracing::trace!("No subscribers for committed event");
                    }
                }
                Ok(Commit {
                    output: transition.output,
                    entries: committed,
                })
            }
            Err(error) => {
                metrics::counter!("ledger_commands_rejected_total").increment(1);
                tracing::debug!(%error, "Command rejected");
                Err(error)
            }
        }
    }

    /// Read current state via a closure
    ///
    /// ```ignore
    /// let event_count = store.state(|s| s.events.len()).await;
    /// ```
    pub async fn state<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&R::State) -> T,
    {
        let cell = self.cell.read().await;
        f(&cell.state)
    }

    /// Retained committed events with a sequence number greater than `after`
    ///
    /// Only the most recent `journal_retention` events are kept; older ones
    /// are gone even if `after` asks for them.
    pub async fn journal_since(&self, after: u64) -> Vec<Committed<R::Event>> {
        let cell = self.cell.read().await;
        let start = cell.journal.partition_point(|entry| entry.sequence <= after);
        cell.journal.range(start..).cloned().collect()
    }

    /// Sequence number of the most recently committed event (0 if none)
    pub async fn last_sequence(&self) -> u64 {
        self.cell.read().await.last_sequence
    }

    /// Subscribe to events committed from now on
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Committed<R::Event>> {
        self.committed.subscribe()
    }

    /// Encode the current state with `bincode`
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::SnapshotEncode`] if the state cannot be serialized.
    pub async fn snapshot(&self) -> Result<Vec<u8>, StoreError>
    where
        R::State: Serialize,
    {
        let cell = self.cell.read().await;
        let bytes = bincode::serialize(&(cell.last_sequence, &cell.state))
            .map_err(StoreError::SnapshotEncode)?;
        metrics::counter!("ledger_snapshots_taken_total").increment(1);
        tracing::debug!(bytes = bytes.len(), "Snapshot encoded");
        Ok(bytes)
    }
}
