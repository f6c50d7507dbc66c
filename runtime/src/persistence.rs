//! Persistence orchestration: startup rehydration, serialized snapshot
//! writes, and the readiness/health signals the UI layer consumes.
//!
//! One writer task owns the storage adapter. It rehydrates exactly once at
//! startup, then services a single-slot write queue: a `watch` channel holds
//! only the most recently scheduled snapshot, so a write scheduled while
//! another is in flight supersedes it: last-writer-wins at snapshot
//! granularity. At most one write is ever in flight.
//!
//! Failures never propagate into the mutation path. A failed write is
//! retried once immediately; if the retry also fails, the orchestrator
//! downgrades to [`HealthStatus::Degraded`] and in-memory state stays
//! authoritative until a later write succeeds.

use crate::StoreConfig;
use crate::retry::RetryPolicy;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use todolist_core::environment::Clock;
use todolist_core::snapshot::Persistable;
use todolist_core::storage::{StorageAdapter, StorageKey};
use tokio::sync::{RwLock, watch};

/// Lifecycle of the orchestrator as observed by the UI layer.
///
/// The machine only ever moves forward:
/// `Uninitialized → Rehydrating → Ready | ReadyWithWarning`, and the ready
/// states are terminal for the process lifetime. Write activity after that
/// point is reported through [`PersistenceHealth`], not through readiness.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Readiness {
    /// The writer task has not started yet
    Uninitialized,

    /// The startup read of the well-known key is in progress
    Rehydrating,

    /// Rehydration finished; the store serves the persisted (or empty) state
    Ready,

    /// Rehydration failed soft: the persisted bytes were unreadable or
    /// corrupt and the store started from an empty collection
    ReadyWithWarning(String),
}

impl Readiness {
    /// Whether rehydration has completed (with or without a warning)
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready | Self::ReadyWithWarning(_))
    }

    /// The rehydration warning, if any
    #[must_use]
    pub fn warning(&self) -> Option<&str> {
        match self {
            Self::ReadyWithWarning(warning) => Some(warning),
            _ => None,
        }
    }
}

impl std::fmt::Display for Readiness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "uninitialized"),
            Self::Rehydrating => write!(f, "rehydrating"),
            Self::Ready => write!(f, "ready"),
            Self::ReadyWithWarning(warning) => write!(f, "ready (warning: {warning})"),
        }
    }
}

/// Health of the durable write path
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum HealthStatus {
    /// The latest attempted write succeeded
    Healthy,

    /// The latest attempted write failed after its retry; memory is ahead
    /// of storage until a later write succeeds
    Degraded,
}

impl HealthStatus {
    /// Check if status is healthy
    #[must_use]
    pub const fn is_healthy(self) -> bool {
        matches!(self, Self::Healthy)
    }

    /// Check if status is degraded
    #[must_use]
    pub const fn is_degraded(self) -> bool {
        matches!(self, Self::Degraded)
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Degraded => write!(f, "degraded"),
        }
    }
}

/// Snapshot-write health report published on a watch channel.
///
/// Degraded is a warning, never an error: mutations keep working against
/// memory and every later mutation is another chance to regain durability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistenceHealth {
    /// Current status of the write path
    pub status: HealthStatus,

    /// When the last successful write completed
    pub last_persisted_at: Option<DateTime<Utc>>,

    /// The error text of the last failed write, cleared on success
    pub last_error: Option<String>,
}

impl PersistenceHealth {
    /// The initial, healthy report
    #[must_use]
    pub const fn healthy() -> Self {
        Self {
            status: HealthStatus::Healthy,
            last_persisted_at: None,
            last_error: None,
        }
    }
}

impl Default for PersistenceHealth {
    fn default() -> Self {
        Self::healthy()
    }
}

/// Handle to the writer task. Owned by the store; cheap to clone.
pub(crate) struct Persistor<S> {
    queue_tx: watch::Sender<Option<(u64, S)>>,
    generation: Arc<AtomicU64>,
    readiness_rx: watch::Receiver<Readiness>,
    acked_rx: watch::Receiver<u64>,
    health_rx: watch::Receiver<PersistenceHealth>,
}

impl<S> Persistor<S>
where
    S: Persistable + Clone + Default + Send + Sync + 'static,
{
    /// Spawns the writer task: rehydrates `state` once, then services the
    /// write queue until the last handle is dropped.
    pub(crate) fn spawn(
        state: Arc<RwLock<S>>,
        adapter: Arc<dyn StorageAdapter>,
        clock: Arc<dyn Clock>,
        config: &StoreConfig,
    ) -> Self {
        let (readiness_tx, readiness_rx) = watch::channel(Readiness::Uninitialized);
        let (queue_tx, queue_rx) = watch::channel(None);
        let (acked_tx, acked_rx) = watch::channel(0u64);
        let (health_tx, health_rx) = watch::channel(PersistenceHealth::healthy());

        let task = WriterTask {
            state,
            adapter,
            key: config.storage_key.clone(),
            clock,
            retry: config.retry_policy.clone(),
            debounce: config.debounce,
            readiness_tx,
            queue_rx,
            acked_tx,
            health_tx,
        };
        tokio::spawn(task.run());

        Self {
            queue_tx,
            generation: Arc::new(AtomicU64::new(0)),
            readiness_rx,
            acked_rx,
            health_rx,
        }
    }

    /// Queues `snapshot` for a durable write, superseding any snapshot that
    /// is still waiting for the writer.
    pub(crate) fn schedule(&self, snapshot: S) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        metrics::counter!("store.persist.scheduled").increment(1);
        tracing::trace!(generation, "snapshot scheduled for persistence");
        self.queue_tx.send_replace(Some((generation, snapshot)));
    }
}

impl<S> Persistor<S> {
    /// A receiver that observes readiness transitions
    pub(crate) fn readiness(&self) -> watch::Receiver<Readiness> {
        self.readiness_rx.clone()
    }

    /// Waits until rehydration has completed, then reports how it went
    pub(crate) async fn wait_ready(&self) -> Readiness {
        let mut rx = self.readiness_rx.clone();
        match rx.wait_for(Readiness::is_ready).await {
            Ok(readiness) => readiness.clone(),
            // Writer gone before reaching ready only happens at runtime
            // teardown; report whatever was last observed.
            Err(_) => self.readiness_rx.borrow().clone(),
        }
    }

    /// Latest write-path health report
    pub(crate) fn health(&self) -> PersistenceHealth {
        self.health_rx.borrow().clone()
    }

    /// A receiver that observes health transitions
    pub(crate) fn health_watch(&self) -> watch::Receiver<PersistenceHealth> {
        self.health_rx.clone()
    }

    /// Waits until every scheduled snapshot has had its write attempted.
    ///
    /// "Attempted" includes writes that exhausted their retry, since a degraded
    /// write path must not turn shutdown into a hang.
    pub(crate) async fn flush(&self) {
        let target = self.generation.load(Ordering::SeqCst);
        if target == 0 {
            return;
        }
        let mut acked = self.acked_rx.clone();
        let _ = acked.wait_for(|generation| *generation >= target).await;
    }
}

impl<S> Clone for Persistor<S> {
    fn clone(&self) -> Self {
        Self {
            queue_tx: self.queue_tx.clone(),
            generation: Arc::clone(&self.generation),
            readiness_rx: self.readiness_rx.clone(),
            acked_rx: self.acked_rx.clone(),
            health_rx: self.health_rx.clone(),
        }
    }
}

/// State owned by the spawned writer task.
struct WriterTask<S> {
    state: Arc<RwLock<S>>,
    adapter: Arc<dyn StorageAdapter>,
    key: StorageKey,
    clock: Arc<dyn Clock>,
    retry: RetryPolicy,
    debounce: Duration,
    readiness_tx: watch::Sender<Readiness>,
    queue_rx: watch::Receiver<Option<(u64, S)>>,
    acked_tx: watch::Sender<u64>,
    health_tx: watch::Sender<PersistenceHealth>,
}

impl<S> WriterTask<S>
where
    S: Persistable + Clone + Default + Send + Sync + 'static,
{
    async fn run(mut self) {
        self.rehydrate().await;

        loop {
            if self.queue_rx.changed().await.is_err() {
                // Every store handle dropped; nothing can schedule anymore.
                break;
            }

            // Coalesce bursts: whatever lands in the queue during the
            // debounce window replaces the snapshot we are about to write.
            if !self.debounce.is_zero() {
                tokio::time::sleep(self.debounce).await;
            }

            let latest = self.queue_rx.borrow_and_update().clone();
            let Some((generation, snapshot)) = latest else {
                continue;
            };

            self.write_snapshot(generation, &snapshot).await;
            let _ = self.acked_tx.send(generation);
        }

        tracing::debug!("persistence writer stopped");
    }

    /// The single startup read. Corrupt or unreadable snapshots fail soft to
    /// the empty collection; the warning travels out via [`Readiness`].
    async fn rehydrate(&self) {
        let _ = self.readiness_tx.send(Readiness::Rehydrating);
        tracing::debug!(key = %self.key, "rehydrating snapshot");

        let (initial, readiness) = match self.adapter.read(&self.key).await {
            Ok(Some(bytes)) => match S::from_bytes(&bytes) {
                Ok(state) => {
                    metrics::counter!("store.rehydrate.success").increment(1);
                    tracing::info!(bytes = bytes.len(), "snapshot rehydrated");
                    (state, Readiness::Ready)
                }
                Err(error) => {
                    metrics::counter!("store.rehydrate.corrupt").increment(1);
                    tracing::warn!(
                        error = %error,
                        "corrupt snapshot, starting from an empty collection"
                    );
                    (S::default(), Readiness::ReadyWithWarning(error.to_string()))
                }
            },
            Ok(None) => {
                tracing::info!("no snapshot present, starting from an empty collection");
                (S::default(), Readiness::Ready)
            }
            Err(error) => {
                metrics::counter!("store.rehydrate.failed").increment(1);
                tracing::warn!(
                    error = %error,
                    "snapshot read failed, starting from an empty collection"
                );
                (S::default(), Readiness::ReadyWithWarning(error.to_string()))
            }
        };

        *self.state.write().await = initial;
        let _ = self.readiness_tx.send(readiness);
    }

    async fn write_snapshot(&self, generation: u64, snapshot: &S) {
        let bytes = match snapshot.to_bytes() {
            Ok(bytes) => bytes,
            Err(error) => {
                metrics::counter!("store.persist.failed", "reason" => "encode").increment(1);
                tracing::warn!(generation, error = %error, "snapshot encoding failed");
                self.mark_degraded(error.to_string());
                return;
            }
        };

        let mut attempts = 0u32;
        loop {
            attempts += 1;
            match self.adapter.write(&self.key, bytes.clone()).await {
                Ok(()) => {
                    metrics::counter!("store.persist.success").increment(1);
                    if attempts > 1 {
                        metrics::counter!("store.persist.retry_success").increment(1);
                        tracing::info!(generation, "snapshot write succeeded after retry");
                    }
                    let now = self.clock.now();
                    self.health_tx.send_modify(|health| {
                        health.status = HealthStatus::Healthy;
                        health.last_persisted_at = Some(now);
                        health.last_error = None;
                    });
                    tracing::debug!(generation, bytes = bytes.len(), "snapshot written");
                    return;
                }
                Err(error) if self.retry.should_retry(attempts) => {
                    metrics::counter!("store.persist.retry").increment(1);
                    tracing::warn!(generation, error = %error, "snapshot write failed, retrying");
                    if !self.retry.delay().is_zero() {
                        tokio::time::sleep(self.retry.delay()).await;
                    }
                }
                Err(error) => {
                    metrics::counter!("store.persist.failed", "reason" => "storage").increment(1);
                    tracing::warn!(
                        generation,
                        error = %error,
                        "snapshot write failed after retry, durability temporarily lost"
                    );
                    self.mark_degraded(error.to_string());
                    return;
                }
            }
        }
    }

    fn mark_degraded(&self, error: String) {
        self.health_tx.send_modify(|health| {
            health.status = HealthStatus::Degraded;
            health.last_error = Some(error);
        });
    }
}
