mod common;

use common::{photos, ManualSpawner};

use std::sync::Arc;

use gallery_feed::SnapshotStore;
use pretty_assertions::assert_eq;

#[tokio::test]
async fn test_older_save_never_lands_after_a_newer_request() {
  let dir = tempfile::tempdir().unwrap();
  let root = dir.path().join("PhotoCache");
  let spawner = Arc::new(ManualSpawner::default());
  let store = Arc::new(SnapshotStore::new(&root, spawner.clone()));
  assert!(store.load().await.is_none());

  store.save_in_background(photos(0..2));
  store.save_in_background(photos(0..4));
  let mut tasks = spawner.take();
  assert_eq!(tasks.len(), 2);
  let older = tasks.remove(0);
  let newer = tasks.remove(0);

  // The newer save runs first and fails: the directory is gone.
  std::fs::remove_dir_all(&root).unwrap();
  std::fs::write(&root, b"not a directory").unwrap();
  newer.await;

  std::fs::remove_file(&root).unwrap();
  std::fs::create_dir(&root).unwrap();
  older.await;

  assert!(store.load().await.is_none(), "a stale listing must not be written");
  store.flush().await;
}

#[tokio::test]
async fn test_latest_background_save_wins() {
  let dir = tempfile::tempdir().unwrap();
  let spawner = Arc::new(ManualSpawner::default());
  let store = Arc::new(SnapshotStore::new(dir.path().join("PhotoCache"), spawner.clone()));

  store.save_in_background(photos(0..1));
  store.save_in_background(photos(0..2));
  store.save_in_background(photos(0..3));
  for task in spawner.take().into_iter().rev() {
    task.await;
  }
  store.flush().await;

  assert_eq!(store.load().await, Some(photos(0..3)));
}
