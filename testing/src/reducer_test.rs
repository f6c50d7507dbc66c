//! Ergonomic testing utilities for reducers
//!
//! This module provides a fluent API for testing reducers with readable
//! Given-When-Then syntax. Because reducers either apply a command or reject
//! it, the harness has two terminal shapes: `then_state`/`then_effects` for
//! applied commands and `then_error` for rejections.

#![allow(clippy::module_name_repetitions)] // ReducerTest is the natural name

use todolist_core::effect::Effect;
use todolist_core::reducer::Reducer;

/// Type alias for state assertion functions
type StateAssertion<S> = Box<dyn FnOnce(&S)>;

/// Type alias for effect assertion functions
type EffectAssertion = Box<dyn FnOnce(&[Effect])>;

/// Type alias for rejection assertion functions
type ErrorAssertion<E> = Box<dyn FnOnce(&E)>;

/// Fluent API for testing reducers with Given-When-Then syntax
///
/// # Example
///
/// ```
/// use todolist_core::command::TodoCommand;
/// use todolist_core::todo::{TodoId, TodoListState};
/// use todolist_core::reducer::TodoReducer;
/// use todolist_testing::{ReducerTest, assertions, test_environment};
///
/// let id = TodoId::new();
/// ReducerTest::new(TodoReducer::new())
///     .with_env(test_environment())
///     .given_state(TodoListState::new())
///     .when_command(TodoCommand::Create {
///         id: id.clone(),
///         title: "Buy milk".to_string(),
///         description: "2%".to_string(),
///     })
///     .then_state(move |state| {
///         assert_eq!(state.len(), 1);
///         assert!(state.contains(&id));
///     })
///     .then_effects(assertions::assert_persists)
///     .run();
/// ```
pub struct ReducerTest<R, S, C, X, E>
where
    R: Reducer<State = S, Command = C, Error = X, Environment = E>,
{
    reducer: R,
    environment: Option<E>,
    initial_state: Option<S>,
    command: Option<C>,
    state_assertions: Vec<StateAssertion<S>>,
    effect_assertions: Vec<EffectAssertion>,
    error_assertions: Vec<ErrorAssertion<X>>,
}

impl<R, S, C, X, E> ReducerTest<R, S, C, X, E>
where
    R: Reducer<State = S, Command = C, Error = X, Environment = E>,
    X: std::fmt::Debug,
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
            effect_assertions: Vec::new(),
            error_assertions: Vec::new(),
        }
    }

    /// Set the environment for the test
    #[must_use]
    pub fn with_env(mut self, env: E) -> Self {
        self.environment = Some(env);
        self
    }

    /// Set the initial state (Given)
    #[must_use]
    pub fn given_state(mut self, state: S) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Set the command to test (When)
    #[must_use]
    pub fn when_command(mut self, command: C) -> Self {
        self.command = Some(command);
        self
    }

    /// Add an assertion about the resulting state (Then)
    ///
    /// Runs for applied and rejected commands alike, since a rejection must
    /// leave the state untouched, and that is worth asserting too.
    #[must_use]
    pub fn then_state<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&S) + 'static,
    {
        self.state_assertions.push(Box::new(assertion));
        self
    }

    /// Add an assertion about the resulting effects (Then)
    #[must_use]
    pub fn then_effects<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&[Effect]) + 'static,
    {
        self.effect_assertions.push(Box::new(assertion));
        self
    }

    /// Assert that the command is rejected, and inspect the rejection (Then)
    #[must_use]
    pub fn then_error<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&X) + 'static,
    {
        self.error_assertions.push(Box::new(assertion));
        self
    }

    /// Run the test and execute all assertions
    ///
    /// # Panics
    ///
    /// Panics if initial state, command, or environment is not set, if the
    /// outcome (applied vs. rejected) does not match the registered
    /// assertions, or if any assertion fails.
    #[allow(clippy::panic)] // Test code can panic
    #[allow(clippy::expect_used)] // Test code can use expect
    pub fn run(self) {
        let mut state = self
            .initial_state
            .expect("Initial state must be set with given_state()");

        let command = self
            .command
            .expect("Command must be set with when_command()");

        let env = self
            .environment
            .expect("Environment must be set with with_env()");

        let expect_rejection = !self.error_assertions.is_empty();

        // Execute reducer
        match self.reducer.reduce(&mut state, command, &env) {
            Ok(effects) => {
                assert!(
                    !expect_rejection,
                    "Expected the command to be rejected, but it was applied with {} effects",
                    effects.len()
                );

                for assertion in self.effect_assertions {
                    assertion(&effects);
                }
            }
            Err(error) => {
                assert!(
                    expect_rejection,
                    "Command was rejected unexpectedly: {error:?}"
                );

                for assertion in self.error_assertions {
                    assertion(&error);
                }
            }
        }

        // Run state assertions
        for assertion in self.state_assertions {
            assertion(&state);
        }
    }
}

/// Helper assertions for effects
pub mod assertions {
    use todolist_core::effect::Effect;

    /// Assert that there are no effects
    ///
    /// # Panics
    ///
    /// Panics if effects is not empty.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_no_effects(effects: &[Effect]) {
        assert!(
            effects.is_empty() || matches!(effects, [Effect::None]),
            "Expected no effects, but found {}: {:?}",
            effects.len(),
            effects
        );
    }

    /// Assert that the effects schedule a persistence write
    ///
    /// # Panics
    ///
    /// Panics if no persist effect is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_persists(effects: &[Effect]) {
        assert!(
            effects.iter().any(|e| e.is_persist()),
            "Expected a persist effect, but found {effects:?}"
        );
    }

    /// Assert the number of effects
    ///
    /// # Panics
    ///
    /// Panics if the number of effects doesn't match expected.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_effects_count(effects: &[Effect], expected: usize) {
        assert_eq!(
            effects.len(),
            expected,
            "Expected {} effects, but found {}",
            expected,
            effects.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_environment;
    use todolist_core::command::{TodoCommand, TodoError};
    use todolist_core::todo::{Todo, TodoId, TodoListState};
    use todolist_core::TodoReducer;

    #[test]
    fn harness_runs_applied_commands() {
        let id = TodoId::new();
        ReducerTest::new(TodoReducer::new())
            .with_env(test_environment())
            .given_state(TodoListState::new())
            .when_command(TodoCommand::Create {
                id: id.clone(),
                title: "Buy milk".to_string(),
                description: String::new(),
            })
            .then_state(move |state| {
                assert!(state.contains(&id));
            })
            .then_effects(assertions::assert_persists)
            .run();
    }

    #[test]
    fn harness_runs_rejections() {
        let id = TodoId::new();
        let existing = Todo::new(id.clone(), "Existing".to_string(), String::new());

        ReducerTest::new(TodoReducer::new())
            .with_env(test_environment())
            .given_state(TodoListState::from_todos(vec![existing]))
            .when_command(TodoCommand::Create {
                id: id.clone(),
                title: "Duplicate".to_string(),
                description: String::new(),
            })
            .then_error(move |error| {
                assert!(matches!(error, TodoError::DuplicateId(e) if *e == id));
            })
            .then_state(|state| {
                assert_eq!(state.len(), 1); // Still only one todo
            })
            .run();
    }

    #[test]
    fn idempotent_remove_produces_no_effects() {
        ReducerTest::new(TodoReducer::new())
            .with_env(test_environment())
            .given_state(TodoListState::new())
            .when_command(TodoCommand::Remove { id: TodoId::new() })
            .then_state(|state| assert!(state.is_empty()))
            .then_effects(assertions::assert_no_effects)
            .run();
    }
}
