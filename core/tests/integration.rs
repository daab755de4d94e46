//! Synchronizer lifecycle against the live mock store.
//!
//! # Design
//! Starts the mock store on a random port, then drives a `TaskSynchronizer`
//! over `HttpStore<ReqwestTransport>`. Validates that request building,
//! transport and response parsing work end-to-end with the actual server.

use task_sync::{
    HttpStore, NewTask, RecordStore, ReqwestTransport, StoreConfig, StoreError, SyncError,
    TaskPatch, TaskSynchronizer,
};

/// Start the mock store on a random port and return its base URL.
async fn start_store() -> String {
    let _ = env_logger::builder().is_test(true).try_init();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(mock_store::run(listener));
    format!("http://{addr}")
}

fn http_store(base_url: &str) -> HttpStore<ReqwestTransport> {
    HttpStore::new(&StoreConfig::new(base_url, "anon-key"), ReqwestTransport::new())
}

#[tokio::test]
async fn synchronizer_lifecycle() {
    let base_url = start_store().await;
    let mut sync = TaskSynchronizer::new(http_store(&base_url));

    // Step 1: load: should be empty.
    assert!(sync.load().await.unwrap().is_empty());

    // Step 2: create.
    let created = sync.create("Buy milk", None).await.unwrap().clone();
    assert_eq!(created.title, "Buy milk");
    assert!(!created.completed);
    assert_eq!(sync.len(), 1);

    // Step 3: toggle.
    let toggled = sync.toggle_complete(created.id).await.unwrap().unwrap().clone();
    assert!(toggled.completed);
    assert!(toggled.updated_at > created.updated_at);

    // Step 4: rename; completion is untouched.
    let renamed = sync
        .update(created.id, TaskPatch::title("Buy oat milk"))
        .await
        .unwrap()
        .unwrap()
        .clone();
    assert_eq!(renamed.title, "Buy oat milk");
    assert!(renamed.completed);

    // Step 5: a fresh synchronizer sees the same state.
    let mut other = TaskSynchronizer::new(http_store(&base_url));
    assert_eq!(other.load().await.unwrap(), sync.tasks());

    // Step 6: delete.
    sync.delete(created.id).await.unwrap();
    assert!(sync.is_empty());

    // Step 7: delete again: the store reports NotFound and state is unchanged.
    let err = sync.delete(created.id).await.unwrap_err();
    assert!(matches!(err, SyncError::Delete(StoreError::NotFound)));
    assert!(sync.is_empty());
}

#[tokio::test]
async fn load_returns_newest_first() {
    let base_url = start_store().await;
    let store = http_store(&base_url);
    for title in ["oldest", "middle", "newest"] {
        store.insert(&NewTask::new(title)).await.unwrap();
    }

    let mut sync = TaskSynchronizer::new(store);
    let titles: Vec<String> = sync.load().await.unwrap().iter().map(|t| t.title.clone()).collect();
    assert_eq!(titles, ["newest", "middle", "oldest"]);
}

#[tokio::test]
async fn unreachable_store_leaves_state_untouched() {
    let base_url = start_store().await;
    let mut sync = TaskSynchronizer::new(http_store(&base_url));
    sync.create("kept", None).await.unwrap();
    let snapshot = sync.tasks().to_vec();

    // Nothing listens on port 9 of the loopback interface.
    let mut offline = TaskSynchronizer::new(http_store("http://127.0.0.1:9"));
    let err = offline.load().await.unwrap_err();
    assert!(matches!(err, SyncError::Fetch(StoreError::Transport(_))));
    assert!(offline.is_empty());
    assert!(!offline.is_loading());

    assert_eq!(sync.tasks(), snapshot.as_slice());
}
