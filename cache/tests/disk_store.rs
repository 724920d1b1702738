use std::sync::Arc;

use bytes::Bytes;
use gallery_cache::{CacheKey, DiskStore};

fn keys() -> Vec<CacheKey> {
  [
    "https://images.example.com/photo-1?w=200&fit=max",
    "https://images.example.com/photo-1?w=400&fit=max",
    "photo:abc/def",
    "a_b",
    "a/b",
  ]
  .iter()
  .map(|l| CacheKey::from_locator(l))
  .collect()
}

#[tokio::test]
async fn test_save_then_load_is_byte_identical() {
  let dir = tempfile::tempdir().unwrap();
  let store = DiskStore::new(dir.path().join("ImageCache"));

  for (i, key) in keys().iter().enumerate() {
    let payload: Vec<u8> = (0..(i * 997 + 1)).map(|b| (b % 251) as u8).collect();
    assert!(store.save(key, &payload).await);
    assert_eq!(store.load(key).await.as_deref(), Some(&payload[..]));
  }
}

#[tokio::test]
async fn test_directory_is_created_lazily() {
  let dir = tempfile::tempdir().unwrap();
  let root = dir.path().join("nested").join("ImageCache");
  let store = DiskStore::new(&root);
  assert!(!root.exists());

  assert!(store.load(&keys()[0]).await.is_none());
  assert!(root.is_dir());
}

#[tokio::test]
async fn test_unavailable_directory_degrades_to_no_op() {
  let dir = tempfile::tempdir().unwrap();
  // A regular file where the cache directory's parent should be.
  let blocker = dir.path().join("not-a-directory");
  std::fs::write(&blocker, b"x").unwrap();
  let store = DiskStore::new(blocker.join("ImageCache"));

  let key = CacheKey::from_locator("k");
  assert!(!store.save(&key, b"data").await);
  assert!(store.load(&key).await.is_none());
  assert!(!store.remove(&key).await);
  assert!(!store.is_available().await);
}

#[tokio::test]
async fn test_overwrite_replaces_entry() {
  let dir = tempfile::tempdir().unwrap();
  let store = DiskStore::new(dir.path());
  let key = &keys()[0];

  assert!(store.save(key, b"first").await);
  assert!(store.save(key, b"second, longer").await);
  assert_eq!(store.load(key).await, Some(Bytes::from_static(b"second, longer")));
}

#[tokio::test]
async fn test_corrupt_or_foreign_files_read_as_absent() {
  let dir = tempfile::tempdir().unwrap();
  let store = DiskStore::new(dir.path());
  let key = &keys()[1];

  assert!(store.save(key, b"valid payload").await);
  let path = dir.path().join(format!("{}.bin", key));
  let mut raw = std::fs::read(&path).unwrap();

  // Truncated write.
  std::fs::write(&path, &raw[..raw.len() - 3]).unwrap();
  assert!(store.load(key).await.is_none());

  // Bit rot.
  let last = raw.len() - 1;
  raw[last] ^= 0xff;
  std::fs::write(&path, &raw).unwrap();
  assert!(store.load(key).await.is_none());

  // Something that was never written by the store.
  std::fs::write(&path, b"<html>not an image</html>").unwrap();
  assert!(store.load(key).await.is_none());
}

#[tokio::test]
async fn test_remove_invalidates() {
  let dir = tempfile::tempdir().unwrap();
  let store = DiskStore::new(dir.path());
  let key = &keys()[2];

  assert!(store.save(key, b"bytes").await);
  assert!(store.remove(key).await);
  assert!(store.load(key).await.is_none());
  assert!(!store.remove(key).await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_writers_never_expose_partial_files() {
  let dir = tempfile::tempdir().unwrap();
  let store = Arc::new(DiskStore::new(dir.path()));
  let key = CacheKey::from_locator("https://images.example.com/contended");

  let big_a = vec![b'a'; 256 * 1024];
  let big_b = vec![b'b'; 128 * 1024];
  assert!(store.save(&key, &big_a).await);

  let mut tasks = vec![];
  for i in 0..8 {
    let store = store.clone();
    let key = key.clone();
    let payload = if i % 2 == 0 { big_a.clone() } else { big_b.clone() };
    tasks.push(tokio::spawn(async move {
      for _ in 0..10 {
        assert!(store.save(&key, &payload).await);
      }
    }));
  }
  for _ in 0..4 {
    let store = store.clone();
    let key = key.clone();
    let (a, b) = (big_a.clone(), big_b.clone());
    tasks.push(tokio::spawn(async move {
      for _ in 0..20 {
        let loaded = store.load(&key).await.expect("an entry always exists");
        assert!(loaded[..] == a[..] || loaded[..] == b[..], "observed a partial write");
      }
    }));
  }

  for task in tasks {
    task.await.unwrap();
  }

  // No temp files are left behind.
  let leftovers = std::fs::read_dir(dir.path())
    .unwrap()
    .filter_map(Result::ok)
    .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
    .count();
  assert_eq!(leftovers, 0);
}

#[tokio::test]
async fn test_stale_temp_files_are_swept_on_first_use() {
  let dir = tempfile::tempdir().unwrap();
  let stale = dir.path().join(".abc.4242.0.tmp");
  std::fs::write(&stale, b"half a write").unwrap();
  let unrelated = dir.path().join("notes.txt");
  std::fs::write(&unrelated, b"keep").unwrap();

  let store = DiskStore::new(dir.path());
  assert!(store.is_available().await);
  assert!(!stale.exists());
  assert!(unrelated.exists());
}
