//! Domain types for the todo collection.
//!
//! The collection is an ordered sequence: insertion order is the implicit
//! creation-order key and is preserved by every operation except removal.
//! State snapshots are immutable: mutating operations always allocate a
//! fresh inner `Arc`, so two snapshots compare equal by pointer exactly when
//! nothing changed in between. The selector layer relies on that contract.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Unique identifier for a todo item.
///
/// Assigned when the item is created and immutable afterwards. The nil UUID
/// is treated as the "empty" id and rejected by the reducer.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TodoId(Uuid);

impl TodoId {
    /// Creates a new random `TodoId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a `TodoId` from a UUID
    #[must_use]
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Returns the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// The nil id, which no stored item may carry
    #[must_use]
    pub const fn nil() -> Self {
        Self(Uuid::nil())
    }

    /// Whether this is the nil id
    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for TodoId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TodoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single todo item.
///
/// The fields mirror the persisted wire shape exactly; creation order is
/// carried by the position in the collection, not by a timestamp field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    /// Unique identifier
    pub id: TodoId,
    /// Title of the todo
    pub title: String,
    /// Free-form details, may be empty
    pub description: String,
    /// Whether the todo is completed
    pub completed: bool,
}

impl Todo {
    /// Creates a new, not yet completed todo item
    #[must_use]
    pub const fn new(id: TodoId, title: String, description: String) -> Self {
        Self {
            id,
            title,
            description,
            completed: false,
        }
    }
}

/// Field replacements applied by an update command.
///
/// Named fields replace the current value; `None` fields are left untouched.
/// The identity of the item is never part of a patch.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoPatch {
    /// Replacement title
    pub title: Option<String>,
    /// Replacement description
    pub description: Option<String>,
    /// Replacement completion flag
    pub completed: Option<bool>,
}

impl TodoPatch {
    /// Creates an empty patch
    #[must_use]
    pub const fn new() -> Self {
        Self {
            title: None,
            description: None,
            completed: None,
        }
    }

    /// Sets the replacement title
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the replacement description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the replacement completion flag
    #[must_use]
    pub const fn with_completed(mut self, completed: bool) -> Self {
        self.completed = Some(completed);
        self
    }

    /// Whether the patch names no fields at all
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.completed.is_none()
    }

    pub(crate) fn apply(self, todo: &mut Todo) {
        if let Some(title) = self.title {
            todo.title = title;
        }
        if let Some(description) = self.description {
            todo.description = description;
        }
        if let Some(completed) = self.completed {
            todo.completed = completed;
        }
    }
}

/// The ordered todo collection, the single source of truth.
///
/// Readers receive the snapshot behind an [`Arc`]; every mutating operation
/// replaces the `Arc` with a freshly allocated one instead of writing through
/// it. A reader holding a previous snapshot therefore never observes a
/// partially applied mutation, and `Arc::ptr_eq` on two snapshots is a sound
/// "nothing changed" check for memoization.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TodoListState {
    todos: Arc<Vec<Todo>>,
}

impl TodoListState {
    /// Creates an empty collection
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a collection from already ordered items
    #[must_use]
    pub fn from_todos(todos: Vec<Todo>) -> Self {
        Self {
            todos: Arc::new(todos),
        }
    }

    /// Returns the full ordered snapshot.
    ///
    /// This is an `Arc` clone of the current collection: the same allocation
    /// is returned until the next mutation, and holding it keeps the
    /// snapshot alive independently of later state changes.
    #[must_use]
    pub fn todos(&self) -> Arc<Vec<Todo>> {
        Arc::clone(&self.todos)
    }

    /// Returns the number of todos
    #[must_use]
    pub fn len(&self) -> usize {
        self.todos.len()
    }

    /// Whether the collection is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.todos.is_empty()
    }

    /// Returns the number of completed todos
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.todos.iter().filter(|t| t.completed).count()
    }

    /// Returns a todo by ID
    #[must_use]
    pub fn get(&self, id: &TodoId) -> Option<&Todo> {
        self.todos.iter().find(|t| &t.id == id)
    }

    /// Checks if a todo exists
    #[must_use]
    pub fn contains(&self, id: &TodoId) -> bool {
        self.todos.iter().any(|t| &t.id == id)
    }

    /// Appends a new item at the end of the collection.
    pub(crate) fn push(&mut self, todo: Todo) {
        let mut next = (*self.todos).clone();
        next.push(todo);
        self.todos = Arc::new(next);
    }

    /// Rewrites the item with the given id in place (position preserved).
    /// Returns `false` without touching the snapshot when the id is absent.
    pub(crate) fn modify(&mut self, id: &TodoId, f: impl FnOnce(&mut Todo)) -> bool {
        let Some(pos) = self.todos.iter().position(|t| &t.id == id) else {
            return false;
        };
        let mut next = (*self.todos).clone();
        f(&mut next[pos]);
        self.todos = Arc::new(next);
        true
    }

    /// Removes the item with the given id, keeping the relative order of the
    /// survivors. Returns `false` without touching the snapshot when absent.
    pub(crate) fn remove(&mut self, id: &TodoId) -> bool {
        let Some(pos) = self.todos.iter().position(|t| &t.id == id) else {
            return false;
        };
        let mut next = (*self.todos).clone();
        next.remove(pos);
        self.todos = Arc::new(next);
        true
    }
}
