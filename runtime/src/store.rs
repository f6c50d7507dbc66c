//! The store runtime: the single source of truth and the boundary the UI
//! layer talks to.
//!
//! The store coordinates four things:
//!
//! 1. State (behind `RwLock` for concurrent access)
//! 2. Reducer (business logic)
//! 3. Environment (injected dependencies)
//! 4. The persistence orchestrator (rehydration + durable writes)
//!
//! Mutations go through [`Store::send`]: the reducer runs synchronously
//! under the write lock, and persistence is the only suspension point:
//! it happens on the writer task, never while the lock is held.

use crate::StoreConfig;
use crate::error::StoreError;
use crate::persistence::{PersistenceHealth, Persistor, Readiness};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use todolist_core::command::{Command, TodoCommand, TodoError};
use todolist_core::environment::TodoEnvironment;
use todolist_core::reducer::{Reducer, TodoReducer};
use todolist_core::snapshot::Persistable;
use todolist_core::storage::StorageAdapter;
use todolist_core::todo::{Todo, TodoId, TodoListState, TodoPatch};
use tokio::sync::{RwLock, watch};

/// The Store - runtime coordinator for a reducer
///
/// # Type Parameters
///
/// - `S`: State type
/// - `C`: Command type
/// - `E`: Environment type
/// - `R`: Reducer implementation
///
/// # Concurrency
///
/// - The reducer executes synchronously while holding the write lock
/// - Sequential `send` calls apply in call order; concurrent ones serialize
///   at the lock
/// - Readers only ever observe fully applied snapshots
pub struct Store<S, C, E, R>
where
    R: Reducer<State = S, Command = C, Environment = E>,
{
    state: Arc<RwLock<S>>,
    reducer: R,
    environment: E,
    persistor: Persistor<S>,
    shutdown: Arc<AtomicBool>,
}

impl<S, C, E, R> Store<S, C, E, R>
where
    R: Reducer<State = S, Command = C, Environment = E>,
{
    /// Read current state via a closure
    ///
    /// Access state through a closure to ensure the lock is released
    /// promptly:
    ///
    /// ```ignore
    /// let count = store.state(|s| s.len()).await;
    /// ```
    pub async fn state<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&S) -> T,
    {
        let state = self.state.read().await;
        f(&state)
    }

    /// A receiver observing the rehydration lifecycle.
    ///
    /// The UI gates its first read on this signal.
    #[must_use]
    pub fn readiness(&self) -> watch::Receiver<Readiness> {
        self.persistor.readiness()
    }

    /// Waits until startup rehydration has completed (successfully or fail
    /// soft), then reports how it went.
    pub async fn wait_ready(&self) -> Readiness {
        self.persistor.wait_ready().await
    }

    /// Latest health report of the durable write path.
    ///
    /// Degraded means durability is temporarily lost while in-memory state
    /// keeps serving reads and writes. A warning, not a failure.
    #[must_use]
    pub fn persistence_health(&self) -> PersistenceHealth {
        self.persistor.health()
    }

    /// A receiver observing write-path health transitions
    #[must_use]
    pub fn health_watch(&self) -> watch::Receiver<PersistenceHealth> {
        self.persistor.health_watch()
    }

    /// Waits until every scheduled snapshot has had its write attempted.
    ///
    /// Superseded intermediate snapshots may never be written; after `flush`
    /// returns, the *latest* state has been attempted.
    pub async fn flush(&self) {
        self.persistor.flush().await;
    }
}

impl<S, C, E, R> Store<S, C, E, R>
where
    R: Reducer<State = S, Command = C, Environment = E>,
    R::Error: std::error::Error,
    S: Persistable + Clone + Default + Send + Sync + 'static,
    C: Command,
{
    /// Send a command to the store
    ///
    /// This is the primary way to mutate state:
    /// 1. Awaits readiness, so no mutation can race startup rehydration
    /// 2. Acquires the write lock and runs the reducer
    /// 3. On success, hands the fresh snapshot to the persistence
    ///    orchestrator (after releasing the lock)
    /// 4. On rejection, returns the domain error with state untouched
    ///
    /// # Errors
    ///
    /// - [`StoreError::Rejected`] with the reducer's rejection
    /// - [`StoreError::ShutdownInProgress`] after [`Store::shutdown`]
    #[tracing::instrument(skip(self, command), fields(command = command.name()), name = "store_send")]
    pub async fn send(&self, command: C) -> Result<(), StoreError<R::Error>> {
        if self.shutdown.load(Ordering::Acquire) {
            tracing::warn!("rejected command: store is shutting down");
            metrics::counter!("store.shutdown.rejected_commands").increment(1);
            return Err(StoreError::ShutdownInProgress);
        }

        self.persistor.wait_ready().await;

        metrics::counter!("store.commands.total", "command" => command.name()).increment(1);

        let snapshot = {
            let mut state = self.state.write().await;

            let start = std::time::Instant::now();
            let result = self.reducer.reduce(&mut state, command, &self.environment);
            metrics::histogram!("store.reducer.duration_seconds")
                .record(start.elapsed().as_secs_f64());

            match result {
                Ok(effects) => effects
                    .iter()
                    .any(|effect| effect.is_persist())
                    .then(|| state.clone()),
                Err(error) => {
                    tracing::debug!(error = %error, "command rejected");
                    metrics::counter!("store.commands.rejected").increment(1);
                    return Err(StoreError::Rejected(error));
                }
            }
        };

        if let Some(snapshot) = snapshot {
            self.persistor.schedule(snapshot);
        }

        Ok(())
    }

    /// Initiate graceful shutdown of the store
    ///
    /// Rejects further commands, then flushes the write queue so the latest
    /// state is attempted durably before the process exits.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::FlushTimeout`] if the deadline expires with a
    /// write still pending.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError<R::Error>> {
        tracing::info!("initiating graceful shutdown");
        metrics::counter!("store.shutdown.initiated").increment(1);

        self.shutdown.store(true, Ordering::Release);

        tokio::time::timeout(timeout, self.flush())
            .await
            .map_err(|_| StoreError::FlushTimeout)?;

        metrics::counter!("store.shutdown.completed").increment(1);
        Ok(())
    }
}

impl<S, C, E, R> Clone for Store<S, C, E, R>
where
    R: Reducer<State = S, Command = C, Environment = E> + Clone,
    E: Clone,
{
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            reducer: self.reducer.clone(),
            environment: self.environment.clone(),
            persistor: self.persistor.clone(),
            shutdown: Arc::clone(&self.shutdown),
        }
    }
}

/// The store specialized to the todo domain
pub type TodoStore = Store<TodoListState, TodoCommand, TodoEnvironment, TodoReducer>;

/// Error surface of the todo boundary operations
pub type TodoStoreError = StoreError<TodoError>;

impl TodoStore {
    /// Opens the todo store on top of a storage adapter.
    ///
    /// Returns immediately; rehydration runs on the writer task and the
    /// store reports readiness through [`Store::wait_ready`] /
    /// [`Store::readiness`]. Must be called within a tokio runtime.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let store = TodoStore::open(adapter, TodoEnvironment::production(), StoreConfig::default());
    /// store.wait_ready().await;
    /// let id = store.create("Buy milk", "2%").await?;
    /// ```
    #[must_use]
    pub fn open(
        adapter: Arc<dyn StorageAdapter>,
        environment: TodoEnvironment,
        config: StoreConfig,
    ) -> Self {
        let state = Arc::new(RwLock::new(TodoListState::default()));
        let persistor = Persistor::spawn(
            Arc::clone(&state),
            adapter,
            Arc::clone(&environment.clock),
            &config,
        );

        Self {
            state,
            reducer: TodoReducer::new(),
            environment,
            persistor,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Creates a todo and returns its store-assigned id.
    ///
    /// Title and description are expected non-empty per the UI contract;
    /// the id comes from the environment's generator, never from the caller.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Rejected`] on an id collision (which the
    /// generator makes vanishingly unlikely) and
    /// [`StoreError::ShutdownInProgress`] after shutdown.
    pub async fn create(
        &self,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<TodoId, TodoStoreError> {
        let id = self.environment.id_generator.generate();
        self.send(TodoCommand::Create {
            id: id.clone(),
            title: title.into(),
            description: description.into(),
        })
        .await?;
        Ok(id)
    }

    /// Replaces the named fields of an existing todo
    ///
    /// # Errors
    ///
    /// [`TodoError::NotFound`] (wrapped in [`StoreError::Rejected`]) when
    /// the id is absent.
    pub async fn update(&self, id: TodoId, fields: TodoPatch) -> Result<(), TodoStoreError> {
        self.send(TodoCommand::Update { id, fields }).await
    }

    /// Flips the completion flag of an existing todo
    ///
    /// # Errors
    ///
    /// [`TodoError::NotFound`] (wrapped in [`StoreError::Rejected`]) when
    /// the id is absent.
    pub async fn toggle_completed(&self, id: TodoId) -> Result<(), TodoStoreError> {
        self.send(TodoCommand::ToggleCompleted { id }).await
    }

    /// Deletes a todo. Removing an id that is already gone succeeds without
    /// doing anything, so double-taps are safe.
    ///
    /// # Errors
    ///
    /// Only [`StoreError::ShutdownInProgress`] after shutdown.
    pub async fn remove(&self, id: TodoId) -> Result<(), TodoStoreError> {
        self.send(TodoCommand::Remove { id }).await
    }

    /// The full ordered snapshot; no side effects
    pub async fn all(&self) -> Arc<Vec<Todo>> {
        self.state(TodoListState::todos).await
    }
}
