#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use gallery_cache::{TaskSpawner, TokioSpawner};
use gallery_feed::{FetchError, FetchRequest, Photo, PhotoSource, SnapshotStore, Transport};
use parking_lot::Mutex;
use tokio::sync::Notify;

pub fn photo(i: u32) -> Photo {
  Photo::new(
    format!("photo-{i}"),
    format!("author{i}"),
    format!("https://images.example.com/{i}?w=200"),
    format!("https://images.example.com/{i}"),
    400 + i,
    600,
  )
}

pub fn photos(range: std::ops::Range<u32>) -> Vec<Photo> {
  range.map(photo).collect()
}

/// A raw listing record as the API serves it.
pub fn raw_record(i: u32) -> serde_json::Value {
  serde_json::json!({
    "id": format!("photo-{i}"),
    "user": { "username": format!("author{i}"), "name": "ignored" },
    "urls": {
      "thumb": format!("https://images.example.com/{i}?w=200"),
      "full": format!("https://images.example.com/{i}"),
      "raw": "ignored"
    },
    "width": 400 + i,
    "height": 600,
    "likes": 12
  })
}

pub fn spawner() -> Arc<dyn TaskSpawner> {
  Arc::new(TokioSpawner::new())
}

pub fn snapshot_store(dir: &std::path::Path) -> Arc<SnapshotStore> {
  Arc::new(SnapshotStore::new(dir.join("PhotoCache"), spawner()))
}

/// Serves canned responses by url and records every request.
#[derive(Default)]
pub struct ScriptedTransport {
  responses: Mutex<HashMap<String, Result<Bytes, FetchError>>>,
  pub requests: Mutex<Vec<FetchRequest>>,
  pub calls: AtomicUsize,
  pub delay: Mutex<Duration>,
}

impl ScriptedTransport {
  pub fn new() -> Arc<Self> {
    Arc::new(Self::default())
  }

  pub fn respond(&self, url: &str, response: Result<Bytes, FetchError>) {
    self.responses.lock().insert(url.to_string(), response);
  }

  pub fn set_delay(&self, delay: Duration) {
    *self.delay.lock() = delay;
  }

  pub fn calls(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }
}

/// Lets a test keep a handle on the transport it hands to a fetcher.
pub struct SharedTransport(pub Arc<ScriptedTransport>);

#[async_trait]
impl Transport for SharedTransport {
  async fn execute(&self, request: &FetchRequest, _timeout: Duration) -> Result<Bytes, FetchError> {
    let transport = &self.0;
    transport.calls.fetch_add(1, Ordering::SeqCst);
    transport.requests.lock().push(request.clone());
    let delay = *transport.delay.lock();
    if !delay.is_zero() {
      tokio::time::sleep(delay).await;
    }
    let url = request.url().to_string();
    transport
      .responses
      .lock()
      .get(&url)
      .cloned()
      .unwrap_or(Err(FetchError::Status(404)))
  }
}

/// A photo source that replays queued pages, optionally holding each call
/// until released.
#[derive(Default)]
pub struct ScriptedSource {
  pages: Mutex<VecDeque<Option<Vec<Photo>>>>,
  pub calls: Mutex<Vec<(u32, Option<String>)>>,
  gated: std::sync::atomic::AtomicBool,
  pub started: Notify,
  pub release: Notify,
}

impl ScriptedSource {
  pub fn new(pages: Vec<Option<Vec<Photo>>>) -> Arc<Self> {
    Arc::new(Self {
      pages: Mutex::new(pages.into()),
      ..Default::default()
    })
  }

  pub fn gated(pages: Vec<Option<Vec<Photo>>>) -> Arc<Self> {
    let source = Self::new(pages);
    source.gated.store(true, Ordering::SeqCst);
    source
  }

  pub fn calls(&self) -> Vec<(u32, Option<String>)> {
    self.calls.lock().clone()
  }
}

pub struct SharedSource(pub Arc<ScriptedSource>);

#[async_trait]
impl PhotoSource for SharedSource {
  async fn list(&self, page: u32, query: Option<&str>) -> Option<Vec<Photo>> {
    let source = &self.0;
    source.calls.lock().push((page, query.map(str::to_owned)));
    if source.gated.load(Ordering::SeqCst) {
      source.started.notify_one();
      source.release.notified().await;
    }
    source.pages.lock().pop_front().flatten()
  }
}

type Task = std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send>>;

/// Holds spawned tasks so a test can run them in any order.
#[derive(Default)]
pub struct ManualSpawner {
  tasks: Mutex<Vec<Task>>,
}

impl ManualSpawner {
  pub fn take(&self) -> Vec<Task> {
    std::mem::take(&mut *self.tasks.lock())
  }
}

impl TaskSpawner for ManualSpawner {
  fn spawn(&self, future: Task) {
    self.tasks.lock().push(future);
  }
}
