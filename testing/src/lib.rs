//! # Todolist Testing
//!
//! Testing utilities and mocks for the todolist state core.
//!
//! This crate provides:
//! - Deterministic implementations of the environment traits
//! - In-memory and fault-injecting storage adapters
//! - The [`ReducerTest`] given/when/then harness
//!
//! ## Example
//!
//! ```ignore
//! use todolist_testing::{mocks::MemoryStorage, test_environment};
//! use todolist_runtime::{StoreConfig, TodoStore};
//! use std::sync::Arc;
//!
//! #[tokio::test]
//! async fn create_persists_a_snapshot() {
//!     let storage = Arc::new(MemoryStorage::new());
//!     let store = TodoStore::open(storage.clone(), test_environment(), StoreConfig::default());
//!
//!     store.wait_ready().await;
//!     store.create("Buy milk", "2%").await.unwrap();
//!     store.flush().await;
//!
//!     assert_eq!(storage.write_count(), 1);
//! }
//! ```

pub mod reducer_test;

pub use reducer_test::{ReducerTest, assertions};

/// Deterministic mock implementations of the environment and storage traits.
pub mod mocks {
    use chrono::{DateTime, Utc};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
    use std::sync::{Mutex, PoisonError};
    use todolist_core::environment::{Clock, IdGenerator};
    use todolist_core::storage::{StorageAdapter, StorageError, StorageFuture, StorageKey};
    use todolist_core::todo::TodoId;
    use uuid::Uuid;

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    #[derive(Clone, Copy, Debug)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Creates a clock pinned to the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Id generator that counts upwards, for predictable ids in tests
    #[derive(Debug, Default)]
    pub struct SequentialIdGenerator {
        next: AtomicU64,
    }

    impl SequentialIdGenerator {
        /// Creates a generator that starts at id 1
        #[must_use]
        pub const fn new() -> Self {
            Self {
                next: AtomicU64::new(0),
            }
        }

        /// The id the next call to `generate` will return
        #[must_use]
        pub fn peek(&self) -> TodoId {
            TodoId::from_uuid(Uuid::from_u128(
                u128::from(self.next.load(Ordering::SeqCst)) + 1,
            ))
        }
    }

    impl IdGenerator for SequentialIdGenerator {
        fn generate(&self) -> TodoId {
            let n = self.next.fetch_add(1, Ordering::SeqCst) + 1;
            TodoId::from_uuid(Uuid::from_u128(u128::from(n)))
        }
    }

    /// In-memory storage adapter with call counting
    ///
    /// The counters let tests assert *how many* writes actually reached
    /// storage; the superseding write queue makes that number interesting.
    #[derive(Debug, Default)]
    pub struct MemoryStorage {
        entries: Mutex<HashMap<StorageKey, Vec<u8>>>,
        reads: AtomicUsize,
        writes: AtomicUsize,
    }

    impl MemoryStorage {
        /// Creates empty storage
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Creates storage pre-seeded with bytes under `key`
        #[must_use]
        pub fn with_bytes(key: StorageKey, bytes: Vec<u8>) -> Self {
            let storage = Self::new();
            storage
                .entries
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(key, bytes);
            storage
        }

        /// The bytes currently stored under `key`
        #[must_use]
        pub fn bytes(&self, key: &StorageKey) -> Option<Vec<u8>> {
            self.entries
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .get(key)
                .cloned()
        }

        /// Number of reads served
        #[must_use]
        pub fn read_count(&self) -> usize {
            self.reads.load(Ordering::SeqCst)
        }

        /// Number of writes accepted
        #[must_use]
        pub fn write_count(&self) -> usize {
            self.writes.load(Ordering::SeqCst)
        }
    }

    impl StorageAdapter for MemoryStorage {
        fn read<'a>(&'a self, key: &'a StorageKey) -> StorageFuture<'a, Option<Vec<u8>>> {
            Box::pin(async move {
                self.reads.fetch_add(1, Ordering::SeqCst);
                Ok(self
                    .entries
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .get(key)
                    .cloned())
            })
        }

        fn write<'a>(&'a self, key: &'a StorageKey, bytes: Vec<u8>) -> StorageFuture<'a, ()> {
            Box::pin(async move {
                self.writes.fetch_add(1, Ordering::SeqCst);
                self.entries
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(key.clone(), bytes);
                Ok(())
            })
        }
    }

    /// Storage that fails a configured number of writes before recovering.
    ///
    /// Reads always pass through to the inner [`MemoryStorage`].
    #[derive(Debug)]
    pub struct FlakyStorage {
        inner: MemoryStorage,
        failing_writes: AtomicUsize,
        error: StorageError,
    }

    impl FlakyStorage {
        /// Creates storage whose next `failing_writes` writes fail with
        /// [`StorageError::Unavailable`]
        #[must_use]
        pub fn new(failing_writes: usize) -> Self {
            Self::with_error(
                failing_writes,
                StorageError::Unavailable("injected failure".to_string()),
            )
        }

        /// Creates storage whose next `failing_writes` writes fail with the
        /// given error
        #[must_use]
        pub fn with_error(failing_writes: usize, error: StorageError) -> Self {
            Self {
                inner: MemoryStorage::new(),
                failing_writes: AtomicUsize::new(failing_writes),
                error,
            }
        }

        /// Arms the next `n` writes to fail
        pub fn fail_next_writes(&self, n: usize) {
            self.failing_writes.store(n, Ordering::SeqCst);
        }

        /// The inner storage, for asserting on what got through
        #[must_use]
        pub const fn storage(&self) -> &MemoryStorage {
            &self.inner
        }
    }

    impl StorageAdapter for FlakyStorage {
        fn read<'a>(&'a self, key: &'a StorageKey) -> StorageFuture<'a, Option<Vec<u8>>> {
            self.inner.read(key)
        }

        fn write<'a>(&'a self, key: &'a StorageKey, bytes: Vec<u8>) -> StorageFuture<'a, ()> {
            Box::pin(async move {
                let armed = self
                    .failing_writes
                    .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                    .is_ok();
                if armed {
                    return Err(self.error.clone());
                }
                self.inner.write(key, bytes).await
            })
        }
    }

    /// Storage whose reads and writes always fail with
    /// [`StorageError::Unavailable`]
    #[derive(Debug, Default)]
    pub struct DownStorage;

    impl DownStorage {
        /// Creates the adapter
        #[must_use]
        pub const fn new() -> Self {
            Self
        }
    }

    impl StorageAdapter for DownStorage {
        fn read<'a>(&'a self, _key: &'a StorageKey) -> StorageFuture<'a, Option<Vec<u8>>> {
            Box::pin(async {
                Err(StorageError::Unavailable("storage is down".to_string()))
            })
        }

        fn write<'a>(&'a self, _key: &'a StorageKey, _bytes: Vec<u8>) -> StorageFuture<'a, ()> {
            Box::pin(async {
                Err(StorageError::Unavailable("storage is down".to_string()))
            })
        }
    }
}

/// Test helpers and builders
pub mod helpers {
    use super::mocks::{FixedClock, SequentialIdGenerator};
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;
    use todolist_core::environment::TodoEnvironment;

    /// A clock pinned to a fixed, arbitrary date
    ///
    /// # Panics
    ///
    /// Never panics; the embedded date is valid.
    #[must_use]
    #[allow(clippy::unwrap_used)] // Fixed date is known valid
    pub fn test_clock() -> FixedClock {
        FixedClock::new(Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap())
    }

    /// Environment wired with the fixed clock and sequential ids
    #[must_use]
    pub fn test_environment() -> TodoEnvironment {
        TodoEnvironment::new(
            Arc::new(test_clock()),
            Arc::new(SequentialIdGenerator::new()),
        )
    }
}

pub use helpers::{test_clock, test_environment};
