//! Memoized read-only views over the todo collection.
//!
//! Selectors are the query side of the store: they derive data for the UI
//! without touching the write path. The memoization contract is pointer
//! identity: a mutation always puts the collection behind a fresh `Arc`,
//! so `Arc::ptr_eq` on the input snapshot is a complete "did anything
//! change" check. As long as nothing changed, a selector returns the *same*
//! allocation, which is what shallow-equality re-render checks in the UI
//! layer depend on.

use std::sync::{Arc, Mutex, PoisonError};
use todolist_core::todo::{Todo, TodoListState};

/// Returns the full ordered snapshot.
///
/// Referentially stable: the same `Arc` allocation comes back until the
/// next mutation.
#[must_use]
pub fn select_all(state: &TodoListState) -> Arc<Vec<Todo>> {
    state.todos()
}

/// Single-slot memo keyed on the pointer identity of its input.
///
/// Holding the cached input `Arc` keeps that allocation alive, so a pointer
/// can never be reused for different data while it is the cache key.
pub struct Memoized<I: ?Sized, O: ?Sized> {
    cache: Mutex<Option<(Arc<I>, Arc<O>)>>,
}

impl<I: ?Sized, O: ?Sized> Memoized<I, O> {
    /// Creates an empty memo
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cache: Mutex::new(None),
        }
    }

    /// Returns the cached output when `input` is the same allocation as the
    /// cached input; otherwise recomputes and replaces the slot.
    pub fn select(&self, input: &Arc<I>, compute: impl FnOnce(&I) -> O) -> Arc<O>
    where
        O: Sized,
    {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some((cached_input, cached_output)) = &*cache {
            if Arc::ptr_eq(cached_input, input) {
                return Arc::clone(cached_output);
            }
        }

        let output = Arc::new(compute(input));
        *cache = Some((Arc::clone(input), Arc::clone(&output)));
        output
    }
}

impl<I: ?Sized, O: ?Sized> Default for Memoized<I, O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: ?Sized, O: ?Sized> std::fmt::Debug for Memoized<I, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memoized").finish_non_exhaustive()
    }
}

/// Completed-only view, composed from [`select_all`]
#[derive(Debug, Default)]
pub struct CompletedSelector {
    memo: Memoized<Vec<Todo>, Vec<Todo>>,
}

impl CompletedSelector {
    /// Creates the selector with an empty memo
    #[must_use]
    pub const fn new() -> Self {
        Self {
            memo: Memoized::new(),
        }
    }

    /// The completed todos, in collection order
    pub fn select(&self, state: &TodoListState) -> Arc<Vec<Todo>> {
        let all = select_all(state);
        self.memo.select(&all, |todos| {
            todos.iter().filter(|t| t.completed).cloned().collect()
        })
    }
}

/// Not-yet-completed view, composed from [`select_all`]
#[derive(Debug, Default)]
pub struct ActiveSelector {
    memo: Memoized<Vec<Todo>, Vec<Todo>>,
}

impl ActiveSelector {
    /// Creates the selector with an empty memo
    #[must_use]
    pub const fn new() -> Self {
        Self {
            memo: Memoized::new(),
        }
    }

    /// The todos still to do, in collection order
    pub fn select(&self, state: &TodoListState) -> Arc<Vec<Todo>> {
        let all = select_all(state);
        self.memo.select(&all, |todos| {
            todos.iter().filter(|t| !t.completed).cloned().collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use todolist_core::command::TodoCommand;
    use todolist_core::environment::TodoEnvironment;
    use todolist_core::reducer::{Reducer, TodoReducer};
    use todolist_core::todo::TodoId;

    fn state_with(titles_completed: &[(&str, bool)]) -> TodoListState {
        let env = TodoEnvironment::production();
        let reducer = TodoReducer::new();
        let mut state = TodoListState::new();
        for (title, completed) in titles_completed {
            let id = TodoId::new();
            reducer
                .reduce(
                    &mut state,
                    TodoCommand::Create {
                        id: id.clone(),
                        title: (*title).to_string(),
                        description: String::new(),
                    },
                    &env,
                )
                .unwrap();
            if *completed {
                reducer
                    .reduce(&mut state, TodoCommand::ToggleCompleted { id }, &env)
                    .unwrap();
            }
        }
        state
    }

    #[test]
    fn select_all_is_referentially_stable() {
        let state = state_with(&[("a", false), ("b", true)]);
        assert!(Arc::ptr_eq(&select_all(&state), &select_all(&state)));
    }

    #[test]
    fn completed_view_filters_and_keeps_order() {
        let state = state_with(&[("a", true), ("b", false), ("c", true)]);
        let selector = CompletedSelector::new();

        let completed = selector.select(&state);
        let titles: Vec<&str> = completed.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "c"]);
    }

    #[test]
    fn derived_view_is_cached_until_the_state_changes() {
        let mut state = state_with(&[("a", true), ("b", false)]);
        let selector = CompletedSelector::new();

        let first = selector.select(&state);
        let second = selector.select(&state);
        assert!(Arc::ptr_eq(&first, &second));

        let env = TodoEnvironment::production();
        TodoReducer::new()
            .reduce(
                &mut state,
                TodoCommand::Create {
                    id: TodoId::new(),
                    title: "c".to_string(),
                    description: String::new(),
                },
                &env,
            )
            .unwrap();

        let third = selector.select(&state);
        assert!(!Arc::ptr_eq(&second, &third));
        assert_eq!(*second, *third);
    }

    #[test]
    fn active_and_completed_partition_the_collection() {
        let state = state_with(&[("a", true), ("b", false), ("c", false)]);
        let completed = CompletedSelector::new().select(&state);
        let active = ActiveSelector::new().select(&state);

        assert_eq!(completed.len() + active.len(), state.len());
        assert!(active.iter().all(|t| !t.completed));
        assert!(completed.iter().all(|t| t.completed));
    }
}
