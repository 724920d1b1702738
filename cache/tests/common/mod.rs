#![allow(dead_code)]

use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};

use bytes::Bytes;
use gallery_cache::{CacheKey, TieredCache, TieredCacheBuilder};
use tokio::time::{sleep, Duration};

pub const PHOTO_URL: &str = "https://images.example.com/photo-1500000000?w=400";

pub fn key() -> CacheKey {
  CacheKey::from_locator(PHOTO_URL)
}

// Helper to build a single-shard cache rooted in a test directory.
pub fn build_test_cache(dir: &Path, capacity: u64) -> TieredCache<Bytes> {
  TieredCacheBuilder::new()
    .capacity(capacity)
    .shards(1)
    .disk_directory(dir.join("ImageCache"))
    .build()
    .unwrap()
}

pub type BoxedFetch = Pin<Box<dyn Future<Output = Option<Bytes>> + Send>>;

/// A fetch that counts its invocations, waits `delay` and returns `body`.
/// An empty `body` simulates a failed request.
pub fn counting_fetch(
  counter: &Arc<AtomicUsize>,
  body: &'static [u8],
  delay: Duration,
) -> impl FnOnce() -> BoxedFetch + Send + 'static {
  let counter = counter.clone();
  move || {
    Box::pin(async move {
      counter.fetch_add(1, Ordering::SeqCst);
      sleep(delay).await;
      if body.is_empty() {
        None
      } else {
        Some(Bytes::from_static(body))
      }
    }) as BoxedFetch
  }
}

/// Polls `condition` for up to a second.
pub async fn eventually(mut condition: impl FnMut() -> bool) -> bool {
  for _ in 0..200 {
    if condition() {
      return true;
    }
    sleep(Duration::from_millis(5)).await;
  }
  condition()
}
