//! Durable key-value storage contract.
//!
//! This is the seam between the persistence orchestrator and whatever the
//! platform offers as device storage (an on-disk file, a mobile key-value
//! store, an in-memory map in tests). Only the contract lives here; the
//! orchestrator in `todolist-runtime` drives it.
//!
//! # Ordering
//!
//! Implementations guarantee nothing about the ordering of concurrent writes
//! to the same key. The orchestrator serializes writes itself and never has
//! more than one in flight.
//!
//! # Dyn Compatibility
//!
//! The trait uses explicit `Pin<Box<dyn Future>>` returns instead of
//! `async fn` to enable trait object usage (`Arc<dyn StorageAdapter>`), which
//! the runtime needs to hold the adapter inside a spawned writer task.

use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Well-known key a persisted snapshot lives under.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StorageKey(String);

impl StorageKey {
    /// Creates a key from its string form
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The key as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for StorageKey {
    /// The application's well-known snapshot key.
    fn default() -> Self {
        Self::new("todos_app_key")
    }
}

impl std::fmt::Display for StorageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors the storage layer can fail with.
///
/// Both are transient from the application's point of view: the runtime
/// retries once and then degrades to memory-only operation rather than
/// propagating a failure into the UI flow.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The backing medium could not be reached
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// A write was rejected because the device quota is exhausted
    #[error("storage quota exceeded: {0}")]
    QuotaExceeded(String),
}

/// Boxed future returned by [`StorageAdapter`] methods.
pub type StorageFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, StorageError>> + Send + 'a>>;

/// Durable key-value byte storage with async get/set.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so the runtime can share one
/// adapter between the rehydration path and the writer task.
pub trait StorageAdapter: Send + Sync {
    /// Read the bytes stored under `key`, or `None` if the key is absent.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Unavailable`] when the medium cannot be
    /// reached. Absence of the key is not an error.
    fn read<'a>(&'a self, key: &'a StorageKey) -> StorageFuture<'a, Option<Vec<u8>>>;

    /// Replace the bytes stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Unavailable`] or
    /// [`StorageError::QuotaExceeded`].
    fn write<'a>(&'a self, key: &'a StorageKey, bytes: Vec<u8>) -> StorageFuture<'a, ()>;
}
