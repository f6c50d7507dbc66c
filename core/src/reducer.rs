//! The reducer trait and the todo reducer implementation.
//!
//! Reducers are pure functions `(State, Command, Environment) → Effects`.
//! They contain all business logic, are deterministic, and never perform
//! I/O; persistence is described by the returned effects and executed by
//! the store runtime.

use crate::command::{TodoCommand, TodoError};
use crate::effect::{Effect, Effects};
use crate::environment::TodoEnvironment;
use crate::todo::{Todo, TodoId, TodoListState};
use smallvec::smallvec;

/// The Reducer trait - core abstraction for business logic
///
/// # Type Parameters
///
/// - `State`: The domain state this reducer operates on
/// - `Command`: The command type this reducer processes
/// - `Error`: The rejection type returned to the caller
/// - `Environment`: The injected dependencies this reducer needs
///
/// # Contract
///
/// `reduce` either applies the command and returns the effects to execute,
/// or rejects it with an error and leaves the state exactly as it was.
/// Rejections are ordinary return values, meant to reach the
/// caller of `send`, not to be swallowed inside an async task.
pub trait Reducer {
    /// The state type this reducer operates on
    type State;

    /// The command type this reducer processes
    type Command;

    /// The rejection type surfaced to callers
    type Error;

    /// The environment type with injected dependencies
    type Environment;

    /// Reduce a command into state changes and effects
    ///
    /// # Errors
    ///
    /// Returns the domain rejection when the command cannot be applied; the
    /// state is untouched in that case.
    fn reduce(
        &self,
        state: &mut Self::State,
        command: Self::Command,
        env: &Self::Environment,
    ) -> Result<Effects, Self::Error>;
}

/// Reducer for the todo collection
#[derive(Clone, Copy, Debug, Default)]
pub struct TodoReducer;

impl TodoReducer {
    /// Creates a new `TodoReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates a create command
    fn validate_create(state: &TodoListState, id: &TodoId) -> Result<(), TodoError> {
        if id.is_nil() {
            return Err(TodoError::EmptyId);
        }

        if state.contains(id) {
            return Err(TodoError::DuplicateId(id.clone()));
        }

        Ok(())
    }
}

impl Reducer for TodoReducer {
    type State = TodoListState;
    type Command = TodoCommand;
    type Error = TodoError;
    type Environment = TodoEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        command: Self::Command,
        _env: &Self::Environment,
    ) -> Result<Effects, Self::Error> {
        match command {
            TodoCommand::Create {
                id,
                title,
                description,
            } => {
                Self::validate_create(state, &id)?;
                state.push(Todo::new(id, title, description));
                Ok(smallvec![Effect::Persist])
            }

            TodoCommand::Update { id, fields } => {
                if fields.is_empty() {
                    // Nothing to replace; existence is still checked so a
                    // stale id surfaces to the caller.
                    return if state.contains(&id) {
                        Ok(Effects::new())
                    } else {
                        Err(TodoError::NotFound(id))
                    };
                }

                if state.modify(&id, |todo| fields.apply(todo)) {
                    Ok(smallvec![Effect::Persist])
                } else {
                    Err(TodoError::NotFound(id))
                }
            }

            TodoCommand::ToggleCompleted { id } => {
                if state.modify(&id, |todo| todo.completed = !todo.completed) {
                    Ok(smallvec![Effect::Persist])
                } else {
                    Err(TodoError::NotFound(id))
                }
            }

            TodoCommand::Remove { id } => {
                // Idempotent: removing an absent id is a successful no-op
                // and schedules no write.
                if state.remove(&id) {
                    Ok(smallvec![Effect::Persist])
                } else {
                    Ok(Effects::new())
                }
            }
        }
    }
}
