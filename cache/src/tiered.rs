use crate::codec::{BytesCodec, Codec};
use crate::disk::DiskStore;
use crate::key::CacheKey;
use crate::loader::LoadFuture;
use crate::memory::MemoryStore;
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::TaskSpawner;

use std::collections::HashMap;
use std::future::Future;
use std::hash::{BuildHasher, Hash, Hasher};
use std::sync::Arc;
use std::fmt;

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, trace};

type PendingLoads<V> = Box<[Mutex<HashMap<CacheKey, Arc<LoadFuture<V>>>>]>;

/// The internal, thread-safe core of the tiered cache.
pub(crate) struct TieredShared<V, C> {
  pub(crate) memory: MemoryStore<V>,
  pub(crate) disk: DiskStore,
  pub(crate) codec: C,
  pub(crate) metrics: Arc<Metrics>,
  pub(crate) spawner: Arc<dyn TaskSpawner>,
  pub(crate) pending_loads: PendingLoads<V>,
  pub(crate) hasher: ahash::RandomState,
  /// Number of write-backs spawned but not yet finished.
  pub(crate) pending_writes: watch::Sender<usize>,
}

impl<V, C> TieredShared<V, C> {
  fn pending_shard(&self, key: &CacheKey) -> &Mutex<HashMap<CacheKey, Arc<LoadFuture<V>>>> {
    let mut state = self.hasher.build_hasher();
    key.hash(&mut state);
    let index = state.finish() as usize & (self.pending_loads.len() - 1);
    &self.pending_loads[index]
  }
}

/// Resolves keys through memory, then disk, then a caller-supplied fetch.
///
/// Cloning is cheap; all clones share the same tiers. At most one fetch per
/// key is outstanding at any time and every caller waiting on it observes the
/// same outcome. Fetched bytes are written back to disk in the background.
pub struct TieredCache<V, C = BytesCodec> {
  pub(crate) shared: Arc<TieredShared<V, C>>,
}

impl<V, C> Clone for TieredCache<V, C> {
  fn clone(&self) -> Self {
    Self {
      shared: self.shared.clone(),
    }
  }
}

impl<V, C> fmt::Debug for TieredCache<V, C> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("TieredCache")
      .field("memory", &self.shared.memory)
      .field("disk", &self.shared.disk)
      .field("metrics", &self.shared.metrics.snapshot())
      .finish_non_exhaustive()
  }
}

impl<V, C> TieredCache<V, C>
where
  V: Send + Sync + 'static,
  C: Codec<V>,
{
  pub fn metrics(&self) -> MetricsSnapshot {
    self.shared.metrics.snapshot()
  }

  /// Returns the memory-tier value for `key` without touching disk or network.
  pub fn peek(&self, key: &CacheKey) -> Option<Arc<V>> {
    self.shared.memory.get(key)
  }

  /// The disk tier backing this cache.
  pub fn disk(&self) -> &DiskStore {
    &self.shared.disk
  }

  /// Resolves `key` through memory, disk and finally `fetch`.
  ///
  /// `fetch` is only called on a miss in both local tiers and only if no
  /// other resolution of `key` is already in flight. It runs on the cache's
  /// spawner, so dropping this future does not abandon other waiters.
  /// Returns `None` when the fetch fails or its bytes do not decode.
  pub async fn resolve<F, Fut>(&self, key: &CacheKey, fetch: F) -> Option<Arc<V>>
  where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Option<Bytes>> + Send + 'static,
  {
    if let Some(value) = self.shared.memory.get(key) {
      return Some(value);
    }
    if let Some(value) = self.load_from_disk(key).await {
      return Some(value);
    }
    self.load_value_awaiting(key, fetch).await
  }

  async fn load_from_disk(&self, key: &CacheKey) -> Option<Arc<V>> {
    let decoded = match self.shared.disk.load(key).await {
      Some(bytes) => self.shared.codec.decode(&bytes),
      None => None,
    };
    let Some(value) = decoded else {
      Metrics::incr(&self.shared.metrics.disk_misses);
      return None;
    };

    Metrics::incr(&self.shared.metrics.disk_hits);
    trace!(%key, "disk hit");
    let cost = self.shared.codec.cost(&value);
    let value = Arc::new(value);
    self.shared.memory.insert(key.clone(), value.clone(), cost);
    Some(value)
  }

  /// The miss path: joins an in-flight load or becomes its leader.
  async fn load_value_awaiting<F, Fut>(&self, key: &CacheKey, fetch: F) -> Option<Arc<V>>
  where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Option<Bytes>> + Send + 'static,
  {
    let (future, leader) = {
      let mut pending = self.shared.pending_shard(key).lock();

      // A load may have finished between the tier checks and taking the lock.
      if let Some(value) = self.shared.memory.get_uncounted(key) {
        return Some(value);
      }

      match pending.get(key) {
        Some(future) => {
          Metrics::incr(&self.shared.metrics.coalesced);
          trace!(%key, "joining in-flight load");
          (future.clone(), false)
        }
        None => {
          let future = Arc::new(LoadFuture::new());
          pending.insert(key.clone(), future.clone());
          (future, true)
        }
      }
    };

    // Spawned outside the lock: the load task takes it again to clear the marker.
    if leader {
      self.spawn_load(key.clone(), future.clone(), fetch);
    }
    (&*future).await
  }

  fn spawn_load<F, Fut>(&self, key: CacheKey, future: Arc<LoadFuture<V>>, fetch: F)
  where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Option<Bytes>> + Send + 'static,
  {
    let cache = self.clone();
    let task = async move {
      let guard = InFlight {
        shared: cache.shared.clone(),
        key: key.clone(),
        future: Some(future),
      };

      Metrics::incr(&cache.shared.metrics.fetches);
      let fetched = fetch().await;
      let decoded = fetched.and_then(|bytes| {
        let value = cache.shared.codec.decode(&bytes)?;
        Some((Arc::new(value), bytes))
      });

      match decoded {
        Some((value, bytes)) => {
          let cost = cache.shared.codec.cost(&value);
          cache.shared.memory.insert(key.clone(), value.clone(), cost);
          // Registered before waiters wake so a `flush` after `resolve` covers it.
          cache.write_back(key, bytes);
          guard.finish(Some(value));
        }
        None => {
          Metrics::incr(&cache.shared.metrics.fetch_failures);
          debug!(%key, "fetch produced no usable value");
          guard.finish(None);
        }
      }
    };
    self.shared.spawner.spawn(Box::pin(task));
  }

  /// Persists `bytes` for `key` to the disk tier in the background.
  ///
  /// Fire-and-forget: the outcome only shows up in the metrics and logs.
  /// Use [`flush`](Self::flush) to wait for outstanding write-backs.
  pub fn write_back(&self, key: CacheKey, bytes: Bytes) {
    let pending = PendingWrite::register(self.shared.clone());
    self.shared.spawner.spawn(Box::pin(async move {
      let shared = &pending.shared;
      if shared.disk.save(&key, &bytes).await {
        Metrics::incr(&shared.metrics.write_backs);
        trace!(%key, len = bytes.len(), "written back to disk");
      } else {
        Metrics::incr(&shared.metrics.write_back_failures);
        debug!(%key, "write-back to disk failed");
      }
    }));
  }

  /// Waits until no write-back is outstanding. Call before shutting the
  /// runtime down so queued saves are not dropped.
  pub async fn flush(&self) {
    let mut pending = self.shared.pending_writes.subscribe();
    let _ = pending.wait_for(|n| *n == 0).await;
  }

  /// Removes `key` from memory and disk.
  pub async fn invalidate(&self, key: &CacheKey) {
    self.shared.memory.invalidate(key);
    self.shared.disk.remove(key).await;
  }

  /// Evicts memory entries down to `target_cost`. Call on memory pressure.
  pub fn shrink_memory_to(&self, target_cost: u64) {
    self.shared.memory.shrink_to(target_cost);
  }

  /// Drops the whole memory tier; disk entries are kept.
  pub fn clear_memory(&self) {
    self.shared.memory.clear();
  }
}

/// Owns a key's in-flight marker for the duration of a load.
///
/// The marker is removed before waiters are woken, and also when the load
/// task is dropped without finishing, so a key can never stay in flight.
struct InFlight<V, C> {
  shared: Arc<TieredShared<V, C>>,
  key: CacheKey,
  future: Option<Arc<LoadFuture<V>>>,
}

impl<V, C> InFlight<V, C> {
  fn finish(mut self, value: Option<Arc<V>>) {
    self.release(value);
  }

  fn release(&mut self, value: Option<Arc<V>>) {
    if let Some(future) = self.future.take() {
      self.shared.pending_shard(&self.key).lock().remove(&self.key);
      future.complete(value);
    }
  }
}

impl<V, C> Drop for InFlight<V, C> {
  fn drop(&mut self) {
    self.release(None);
  }
}

/// Counts one outstanding write-back; the count drops when the task ends,
/// whether it finished or was dropped by the runtime.
struct PendingWrite<V, C> {
  shared: Arc<TieredShared<V, C>>,
}

impl<V, C> PendingWrite<V, C> {
  fn register(shared: Arc<TieredShared<V, C>>) -> Self {
    shared.pending_writes.send_modify(|n| *n += 1);
    Self { shared }
  }
}

impl<V, C> Drop for PendingWrite<V, C> {
  fn drop(&mut self) {
    self.shared.pending_writes.send_modify(|n| *n = n.saturating_sub(1));
  }
}
