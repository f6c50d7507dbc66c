//! Commands accepted by the todo reducer, and the errors they can be
//! rejected with.
//!
//! Commands are explicit value objects; there is no dynamic action registry.
//! The UI layer constructs a command, the store boundary dispatches it, and
//! the reducer either applies it or rejects it with a [`TodoError`] that
//! travels back to the caller.

use crate::todo::{TodoId, TodoPatch};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Common behavior every command type exposes to the runtime.
///
/// The store uses this for logging and metrics labels only; business logic
/// never dispatches on the name.
pub trait Command {
    /// Stable, lowercase name of the command variant
    fn name(&self) -> &'static str;
}

/// All state transitions of the todo collection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TodoCommand {
    /// Append a new todo at the end of the collection.
    ///
    /// The id is assigned at the store boundary (via the environment's id
    /// generator), never chosen by the UI caller. The reducer still rejects
    /// a nil or duplicate id defensively.
    Create {
        /// Identifier for the new item
        id: TodoId,
        /// Title of the todo (non-empty by UI contract)
        title: String,
        /// Free-form details
        description: String,
    },

    /// Replace the named fields of an existing todo
    Update {
        /// Item to update
        id: TodoId,
        /// Fields to replace
        fields: TodoPatch,
    },

    /// Flip the completion flag of an existing todo
    ToggleCompleted {
        /// Item to toggle
        id: TodoId,
    },

    /// Delete a todo. Removing an id that is already gone is a no-op, so a
    /// double-tap in the UI cannot fail.
    Remove {
        /// Item to remove
        id: TodoId,
    },
}

impl TodoCommand {
    /// The id the command refers to
    #[must_use]
    pub const fn id(&self) -> &TodoId {
        match self {
            Self::Create { id, .. }
            | Self::Update { id, .. }
            | Self::ToggleCompleted { id }
            | Self::Remove { id } => id,
        }
    }
}

impl Command for TodoCommand {
    fn name(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::Update { .. } => "update",
            Self::ToggleCompleted { .. } => "toggle_completed",
            Self::Remove { .. } => "remove",
        }
    }
}

/// Reasons a command is rejected.
///
/// All of these are recoverable: the state is left untouched and the error
/// is returned to the caller of `send`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TodoError {
    /// The command referenced an id that is not in the collection
    #[error("todo not found: {0}")]
    NotFound(TodoId),

    /// A create command carried the nil id
    #[error("todo id must not be empty")]
    EmptyId,

    /// A create command carried an id that is already in the collection
    #[error("duplicate todo id: {0}")]
    DuplicateId(TodoId),
}
