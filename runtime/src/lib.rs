//! # Todolist Runtime
//!
//! Runtime implementation for the todolist state core.
//!
//! This crate provides the store that coordinates reducer execution and
//! persistence:
//!
//! - **Store**: the single source of truth, mutated through commands
//! - **Persistence orchestrator**: startup rehydration and serialized,
//!   last-writer-wins snapshot writes against a [`StorageAdapter`]
//! - **Selectors**: memoized, referentially stable read-only views
//!
//! [`StorageAdapter`]: todolist_core::storage::StorageAdapter
//!
//! ## Example
//!
//! ```ignore
//! use todolist_runtime::{StoreConfig, TodoStore};
//! use todolist_core::environment::TodoEnvironment;
//!
//! let store = TodoStore::open(adapter, TodoEnvironment::production(), StoreConfig::default());
//!
//! // Wait for rehydration before the first UI read
//! store.wait_ready().await;
//!
//! let id = store.create("Buy milk", "2%").await?;
//! store.toggle_completed(id.clone()).await?;
//!
//! // Read state
//! let todos = store.all().await;
//! println!("todos: {}", todos.len());
//! ```

use std::time::Duration;
use todolist_core::storage::StorageKey;

/// Persistence orchestration: rehydration, writes, readiness and health
pub mod persistence;

/// Retry policy for the snapshot write path
pub mod retry;

/// Memoized read-only views
pub mod selector;

/// The store runtime and the todo boundary
pub mod store;

/// Error types for the store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can surface from store operations.
    ///
    /// Persistence failures are deliberately absent: they are downgraded to
    /// warnings on the health channel and never block a mutation.
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum StoreError<E>
    where
        E: std::error::Error,
    {
        /// The reducer rejected the command; state is unchanged
        #[error("command rejected: {0}")]
        Rejected(E),

        /// `send` was called after shutdown was initiated
        #[error("store is shutting down")]
        ShutdownInProgress,

        /// Shutdown timed out with a write still pending
        #[error("flush timed out with a write still pending")]
        FlushTimeout,
    }

    impl<E> StoreError<E>
    where
        E: std::error::Error,
    {
        /// The domain rejection, if that is what this error is
        pub fn rejection(&self) -> Option<&E> {
            match self {
                Self::Rejected(error) => Some(error),
                _ => None,
            }
        }
    }
}

/// Configuration for store instances
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use todolist_runtime::{RetryPolicy, StoreConfig};
///
/// let config = StoreConfig::default()
///     .with_debounce(Duration::from_millis(100))
///     .with_retry_policy(RetryPolicy::new().with_max_attempts(3));
/// ```
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Well-known key the snapshot is persisted under
    pub storage_key: StorageKey,
    /// Retry policy for failed snapshot writes
    pub retry_policy: retry::RetryPolicy,
    /// Window during which rapid successive mutations coalesce into one write
    pub debounce: Duration,
}

impl StoreConfig {
    /// Set the storage key
    #[must_use]
    pub fn with_storage_key(mut self, key: StorageKey) -> Self {
        self.storage_key = key;
        self
    }

    /// Set the write retry policy
    #[must_use]
    pub fn with_retry_policy(mut self, policy: retry::RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Set the write debounce window
    #[must_use]
    pub const fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            storage_key: StorageKey::default(),
            retry_policy: retry::RetryPolicy::default(),
            debounce: Duration::from_millis(50),
        }
    }
}

pub use error::StoreError;
pub use persistence::{HealthStatus, PersistenceHealth, Readiness};
pub use retry::RetryPolicy;
pub use selector::{ActiveSelector, CompletedSelector, Memoized, select_all};
pub use store::{Store, TodoStore, TodoStoreError};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_the_app_key() {
        let config = StoreConfig::default();
        assert_eq!(config.storage_key.as_str(), "todos_app_key");
        assert_eq!(config.retry_policy.max_attempts(), 2);
    }
}
