//! Serialized snapshot codec.
//!
//! A snapshot is the whole ordered collection serialized as one JSON blob:
//! a sequence of `{id, title, description, completed}` records in collection
//! order. There is no version field: any shape the decoder does not
//! recognize is corruption, and corruption is recovered from by starting
//! over with an empty collection (the orchestrator's job, not this one).

use crate::todo::{Todo, TodoListState};
use std::collections::HashSet;
use thiserror::Error;

/// Errors from encoding or decoding a snapshot.
#[derive(Error, Debug)]
pub enum SnapshotError {
    /// Persisted bytes do not decode into the expected shape.
    ///
    /// Covers invalid JSON, unexpected record shapes, unparsable ids, and
    /// decoded collections that violate the id-uniqueness invariant. All of
    /// these are treated as corruption by the rehydration path.
    #[error("malformed snapshot: {0}")]
    Malformed(String),

    /// The in-memory state could not be serialized
    #[error("snapshot encoding failed: {0}")]
    Encode(String),
}

/// State that can round-trip through the storage adapter as a byte blob.
pub trait Persistable: Sized {
    /// Serialize the full snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Encode`] when serialization fails.
    fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError>;

    /// Deserialize a snapshot previously produced by [`Persistable::to_bytes`].
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Malformed`] when the bytes are not a valid
    /// snapshot.
    fn from_bytes(bytes: &[u8]) -> Result<Self, SnapshotError>;
}

impl Persistable for TodoListState {
    fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        serde_json::to_vec(&*self.todos()).map_err(|e| SnapshotError::Encode(e.to_string()))
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, SnapshotError> {
        let todos: Vec<Todo> =
            serde_json::from_slice(bytes).map_err(|e| SnapshotError::Malformed(e.to_string()))?;

        // A decoded snapshot must already satisfy the collection invariants;
        // anything else is corruption, not a state to limp along with.
        let mut seen = HashSet::new();
        for todo in &todos {
            if todo.id.is_nil() {
                return Err(SnapshotError::Malformed("nil todo id".to_string()));
            }
            if !seen.insert(todo.id.clone()) {
                return Err(SnapshotError::Malformed(format!(
                    "duplicate todo id {}",
                    todo.id
                )));
            }
        }

        Ok(Self::from_todos(todos))
    }
}
