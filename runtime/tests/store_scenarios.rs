//! End-to-end flows through the todo store boundary.

use std::sync::Arc;
use std::time::Duration;
use todolist_core::command::TodoError;
use todolist_core::todo::{TodoId, TodoPatch};
use todolist_runtime::{Readiness, StoreConfig, StoreError, TodoStore};
use todolist_testing::mocks::MemoryStorage;
use todolist_testing::test_environment;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Store over fresh in-memory storage, with no write debounce so tests can
/// count writes deterministically.
fn open_store() -> (Arc<MemoryStorage>, TodoStore) {
    let storage = Arc::new(MemoryStorage::new());
    let config = StoreConfig::default().with_debounce(Duration::ZERO);
    let store = TodoStore::open(storage.clone(), test_environment(), config);
    (storage, store)
}

#[tokio::test]
async fn create_toggle_update_remove_flow() {
    init_tracing();
    let (_storage, store) = open_store();
    assert_eq!(store.wait_ready().await, Readiness::Ready);

    let id = store.create("Buy milk", "2%").await.unwrap();
    let todos = store.all().await;
    assert_eq!(todos.len(), 1);
    assert_eq!(todos[0].title, "Buy milk");
    assert!(!todos[0].completed);

    store.toggle_completed(id.clone()).await.unwrap();
    assert!(store.all().await[0].completed);
    assert_eq!(store.state(|s| s.completed_count()).await, 1);

    store
        .update(id.clone(), TodoPatch::new().with_title("Buy oat milk"))
        .await
        .unwrap();
    let todos = store.all().await;
    assert_eq!(todos[0].title, "Buy oat milk");
    assert_eq!(todos[0].description, "2%");
    assert!(todos[0].completed);

    store.remove(id.clone()).await.unwrap();
    assert!(store.all().await.is_empty());

    // Double-delete is a successful no-op
    store.remove(id).await.unwrap();
    assert!(store.all().await.is_empty());
}

#[tokio::test]
async fn ids_are_assigned_by_the_store() {
    let (_storage, store) = open_store();

    let first = store.create("a", "x").await.unwrap();
    let second = store.create("b", "y").await.unwrap();

    assert_ne!(first, second);
    let todos = store.all().await;
    assert_eq!(todos[0].id, first);
    assert_eq!(todos[1].id, second);
}

#[tokio::test]
async fn insertion_order_is_preserved() {
    let (_storage, store) = open_store();

    store.create("a", "").await.unwrap();
    let b = store.create("b", "").await.unwrap();
    store.create("c", "").await.unwrap();

    store.remove(b).await.unwrap();
    store.create("d", "").await.unwrap();

    let titles: Vec<String> = store.all().await.iter().map(|t| t.title.clone()).collect();
    assert_eq!(titles, vec!["a", "c", "d"]);
}

#[tokio::test]
async fn mutations_on_missing_ids_surface_not_found() {
    let (_storage, store) = open_store();
    let missing = TodoId::new();

    let err = store
        .update(missing.clone(), TodoPatch::new().with_title("x"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::Rejected(TodoError::NotFound(ref id)) if *id == missing
    ));

    let err = store.toggle_completed(missing.clone()).await.unwrap_err();
    assert!(err.rejection().is_some());

    // State untouched by the rejections
    assert!(store.all().await.is_empty());
}

#[tokio::test]
async fn snapshots_are_referentially_stable_between_mutations() {
    let (_storage, store) = open_store();
    store.create("a", "").await.unwrap();

    let first = store.all().await;
    let second = store.all().await;
    assert!(Arc::ptr_eq(&first, &second));

    store.create("b", "").await.unwrap();
    let third = store.all().await;
    assert!(!Arc::ptr_eq(&second, &third));

    // The old snapshot is unaffected by the mutation
    assert_eq!(first.len(), 1);
    assert_eq!(third.len(), 2);
}

#[tokio::test]
async fn shutdown_rejects_further_commands() {
    let (storage, store) = open_store();
    store.create("a", "").await.unwrap();

    store.shutdown(Duration::from_secs(1)).await.unwrap();

    let err = store.create("b", "").await.unwrap_err();
    assert!(matches!(err, StoreError::ShutdownInProgress));

    // The pre-shutdown state made it to storage
    assert_eq!(storage.write_count(), 1);
}

#[tokio::test]
async fn concurrent_sends_all_apply() {
    let (_storage, store) = open_store();

    let handles: Vec<_> = (0..10)
        .map(|i| {
            let store = store.clone();
            tokio::spawn(async move { store.create(format!("todo-{i}"), "").await })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let todos = store.all().await;
    assert_eq!(todos.len(), 10);
}
