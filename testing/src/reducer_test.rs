//! Ergonomic testing utilities for reducers
//!
//! This module provides a fluent API for testing reducers with readable Given-When-Then syntax.

#![allow(clippy::module_name_repetitions)] // ReducerTest is the natural name

use std::fmt::Debug;
use ticket_ledger_core::reducer::{Reducer, Transition};

type Outcome<R> = Result<
    Transition<<R as Reducer>::Output, <R as Reducer>::Event>,
    <R as Reducer>::Error,
>;

/// Type alias for state assertion functions
type StateAssertion<S> = Box<dyn FnOnce(&S)>;

/// Type alias for outcome assertion functions
type OutcomeAssertion<R> = Box<dyn FnOnce(&Outcome<R>)>;

/// Fluent API for testing reducers with Given-When-Then syntax
///
/// State assertions see the state exactly as the reducer left it. On
/// rejection that must be the initial state, so a `then_state` next to a
/// `then_error` checks that the reducer did not mutate before failing.
///
/// # Example
///
/// ```ignore
/// use ticket_ledger_testing::ReducerTest;
///
/// ReducerTest::new(TicketingReducer::new())
///     .with_env(test_environment())
///     .given_state(TicketingState::new(owner))
///     .when_command(TicketingCommand::CreateEvent { .. })
///     .then_output(|event_id| assert_eq!(*event_id, EventId::new(1)))
///     .then_events(|events| assert_eq!(events.len(), 1))
///     .run();
/// ```
pub struct ReducerTest<R>
where
    R: Reducer,
{
    reducer: R,
    environment: Option<R::Environment>,
    initial_state: Option<R::State>,
    command: Option<R::Command>,
    state_assertions: Vec<StateAssertion<R::State>>,
    outcome_assertions: Vec<OutcomeAssertion<R>>,
}

impl<R> ReducerTest<R>
where
    R: Reducer,
    R::Output: Debug + 'static,
    R::Event: Debug + 'static,
    R::Error: Debug + 'static,
{
    /// Create a new reducer test with the given reducer
    #[must_use]
    pub const fn new(reducer: R) -> Self {
        Self {
            reducer,
            environment: None,
            initial_state: None,
            command: None,
            state_assertions: Vec::new(),
            outcome_assertions: Vec::new(),
        }
    }

    /// Set the environment for the test
    #[must_use]
    pub fn with_env(mut self, env: R::Environment) -> Self {
        self.environment = Some(env);
        self
    }

    /// Set the initial state (Given)
    #[must_use]
    pub fn given_state(mut self, state: R::State) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Set the command to test (When)
    #[must_use]
    pub fn when_command(mut self, command: R::Command) -> Self {
        self.command = Some(command);
        self
    }

    /// Add an assertion about the resulting state (Then)
    #[must_use]
    pub fn then_state<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&R::State) + 'static,
    {
        self.state_assertions.push(Box::new(assertion));
        self
    }

    /// Assert the command succeeded and inspect its output (Then)
    #[must_use]
    #[allow(clippy::panic)] // Test assertion
    pub fn then_output<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&R::Output) + 'static,
    {
        self.outcome_assertions.push(Box::new(move |outcome: &Outcome<R>| match outcome {
            Ok(transition) => assertion(&transition.output),
            Err(error) => panic!("Expected success, but command was rejected: {error:?}"),
        }));
        self
    }

    /// Assert the command succeeded and inspect its committed events (Then)
    #[must_use]
    #[allow(clippy::panic)] // Test assertion
    pub fn then_events<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&[R::Event]) + 'static,
    {
        self.outcome_assertions.push(Box::new(move |outcome: &Outcome<R>| match outcome {
            Ok(transition) => assertion(transition.events.as_slice()),
            Err(error) => panic!("Expected events, but command was rejected: {error:?}"),
        }));
        self
    }

    /// Assert the command was rejected and inspect the error (Then)
    #[must_use]
    #[allow(clippy::panic)] // Test assertion
    pub fn then_error<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&R::Error) + 'static,
    {
        self.outcome_assertions.push(Box::new(move |outcome: &Outcome<R>| match outcome {
            Ok(transition) => panic!(
                "Expected rejection, but command succeeded with {:?} ({:?})",
                transition.output, transition.events
            ),
            Err(error) => assertion(error),
        }));
        self
    }

    /// Run the test and execute all assertions
    ///
    /// # Panics
    ///
    /// Panics if initial state, command, or environment is not set,
    /// or if any assertions fail.
    #[allow(clippy::expect_used)] // Test code can use expect
    pub fn run(self) {
        let initial = self
            .initial_state
            .expect("Initial state must be set with given_state()");

        let command = self.command.expect("Command must be set with when_command()");

        let env = self
            .environment
            .expect("Environment must be set with with_env()");

        let mut state = initial;
        let outcome = self.reducer.reduce(&mut state, command, &env);

        for assertion in self.state_assertions {
            assertion(&state);
        }

        for assertion in self.outcome_assertions {
            assertion(&outcome);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ticket_ledger_core::smallvec;

    #[derive(Clone, Debug)]
    struct Gauge {
        level: u8,
    }

    #[derive(Clone, Debug)]
    enum GaugeCommand {
        Raise(u8),
    }

    #[derive(Debug, PartialEq, Eq)]
    enum GaugeError {
        Overflow,
    }

    struct GaugeReducer;

    impl Reducer for GaugeReducer {
        type State = Gauge;
        type Command = GaugeCommand;
        type Event = u8;
        type Output = u8;
        type Error = GaugeError;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut Gauge,
            command: GaugeCommand,
            _env: &(),
        ) -> Result<Transition<u8, u8>, GaugeError> {
            match command {
                GaugeCommand::Raise(by) => {
                    let level = state.level.saturating_add(by);
                    if level > 10 {
                        return Err(GaugeError::Overflow);
                    }
                    state.level = level;
                    Ok(Transition::new(level, smallvec![by]))
                }
            }
        }
    }

    #[test]
    fn test_success_path() {
        ReducerTest::new(GaugeReducer)
            .with_env(())
            .given_state(Gauge { level: 2 })
            .when_command(GaugeCommand::Raise(3))
            .then_state(|state| assert_eq!(state.level, 5))
            .then_output(|level| assert_eq!(*level, 5))
            .then_events(|events| assert_eq!(events, &[3]))
            .run();
    }

    #[test]
    fn test_rejection_leaves_state_untouched() {
        ReducerTest::new(GaugeReducer)
            .with_env(())
            .given_state(Gauge { level: 9 })
            .when_command(GaugeCommand::Raise(5))
            .then_state(|state| assert_eq!(state.level, 9))
            .then_error(|error| assert_eq!(*error, GaugeError::Overflow))
            .run();
    }
}
