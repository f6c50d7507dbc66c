//! # Todolist Core
//!
//! Domain model and pure state-transition logic for the todolist state core.
//!
//! This crate provides everything that does not need an async runtime:
//!
//! - **State**: the ordered todo collection ([`todo::TodoListState`])
//! - **Command**: all possible inputs to the reducer ([`command::TodoCommand`])
//! - **Reducer**: pure function `(State, Command, Environment) → (State, Effects)`
//! - **Effect**: side-effect descriptions (not execution)
//! - **Environment**: injected dependencies via traits (clock, id generation)
//! - **Storage**: the durable key-value contract the runtime persists through
//! - **Snapshot**: the serialized wire shape of the collection
//!
//! ## Architecture Principles
//!
//! - Functional Core, Imperative Shell
//! - Unidirectional Data Flow
//! - Explicit Effects (no hidden I/O)
//! - Dependency Injection via Environment
//!
//! The async store runtime and the persistence orchestration live in the
//! `todolist-runtime` crate; deterministic mocks live in `todolist-testing`.
//!
//! ## Example
//!
//! ```
//! use todolist_core::command::TodoCommand;
//! use todolist_core::environment::TodoEnvironment;
//! use todolist_core::reducer::{Reducer, TodoReducer};
//! use todolist_core::todo::{TodoId, TodoListState};
//!
//! let reducer = TodoReducer::new();
//! let env = TodoEnvironment::production();
//! let mut state = TodoListState::new();
//!
//! let id = TodoId::new();
//! let effects = reducer
//!     .reduce(
//!         &mut state,
//!         TodoCommand::Create {
//!             id: id.clone(),
//!             title: "Buy milk".to_string(),
//!             description: "2%".to_string(),
//!         },
//!         &env,
//!     )
//!     .map_err(|e| e.to_string())?;
//!
//! assert_eq!(state.len(), 1);
//! assert!(!effects.is_empty());
//! # Ok::<(), String>(())
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use smallvec::{SmallVec, smallvec};

pub mod command;
pub mod effect;
pub mod environment;
pub mod reducer;
pub mod snapshot;
pub mod storage;
pub mod todo;

pub use command::{Command, TodoCommand, TodoError};
pub use effect::{Effect, Effects};
pub use reducer::{Reducer, TodoReducer};
pub use todo::{Todo, TodoId, TodoListState, TodoPatch};
