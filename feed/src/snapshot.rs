use crate::photo::Photo;

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use gallery_cache::{CacheKey, DiskStore, TaskSpawner};
use tokio::sync::{watch, Mutex};
use tracing::{debug, warn};

const SNAPSHOT_LOCATOR: &str = "photos.json";

/// The last known-good default listing, persisted as JSON.
///
/// Background saves are versioned: only the most recently requested save is
/// written, so a stale listing never lands after a newer one was requested,
/// even if the newer save fails.
pub struct SnapshotStore {
  disk: DiskStore,
  key: CacheKey,
  spawner: Arc<dyn TaskSpawner>,
  requested: AtomicU64,
  written: Mutex<u64>,
  settled: watch::Sender<u64>,
}

impl SnapshotStore {
  pub fn new(directory: impl Into<PathBuf>, spawner: Arc<dyn TaskSpawner>) -> Self {
    let (settled, _) = watch::channel(0);
    Self {
      disk: DiskStore::new(directory),
      key: CacheKey::from_locator(SNAPSHOT_LOCATOR),
      spawner,
      requested: AtomicU64::new(0),
      written: Mutex::new(0),
      settled,
    }
  }

  pub fn directory(&self) -> &std::path::Path {
    self.disk.directory()
  }

  /// Writes `photos` now. Returns `false` if it could not be persisted.
  pub async fn save(&self, photos: &[Photo]) -> bool {
    let encoded = match serde_json::to_vec(photos) {
      Ok(encoded) => encoded,
      Err(error) => {
        warn!(%error, "failed to encode photo snapshot");
        return false;
      }
    };
    self.disk.save(&self.key, &encoded).await
  }

  /// The stored snapshot, or `None` if there is none or it does not decode.
  pub async fn load(&self) -> Option<Vec<Photo>> {
    let bytes = self.disk.load(&self.key).await?;
    match serde_json::from_slice(&bytes) {
      Ok(photos) => Some(photos),
      Err(error) => {
        debug!(%error, "discarding unreadable photo snapshot");
        None
      }
    }
  }

  pub async fn clear(&self) -> bool {
    self.disk.remove(&self.key).await
  }

  /// Saves `photos` on the spawner without blocking the caller.
  pub fn save_in_background(self: &Arc<Self>, photos: Vec<Photo>) {
    let version = self.requested.fetch_add(1, Ordering::AcqRel) + 1;
    let store = self.clone();
    self.spawner.spawn(Box::pin(async move {
      {
        let mut written = store.written.lock().await;
        let latest = store.requested.load(Ordering::Acquire);
        if version < latest || version <= *written {
          debug!(version, latest, "skipping superseded snapshot");
        } else if store.save(&photos).await {
          *written = version;
        } else {
          warn!(version, "photo snapshot was not persisted");
        }
      }
      store.settled.send_modify(|settled| *settled = (*settled).max(version));
    }));
  }

  /// Waits until every background save requested so far has finished.
  pub async fn flush(&self) {
    let target = self.requested.load(Ordering::Acquire);
    let mut settled = self.settled.subscribe();
    let _ = settled.wait_for(|v| *v >= target).await;
  }
}
