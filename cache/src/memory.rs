use crate::error::BuildError;
use crate::key::CacheKey;
use crate::lru_list::LruList;
use crate::metrics::{Metrics, MetricsSnapshot};

use core::fmt;
use std::hash::{BuildHasher, Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_utils::CachePadded;
use parking_lot::Mutex;
use tracing::trace;

#[inline]
fn hash_key<K: Hash, H: BuildHasher>(hasher: &H, key: &K) -> u64 {
  let mut state = hasher.build_hasher();
  key.hash(&mut state);
  state.finish()
}

/// The volatile tier: decoded values bounded by a total cost.
///
/// Keys are spread over independently locked shards, each holding an LRU
/// list. The cost budget is shared by all shards: an insert that pushes the
/// total over capacity evicts least recently used entries, starting with its
/// own shard and moving on to the others. Eviction is silent and only
/// observable as a later miss (and in the metrics).
pub struct MemoryStore<V, H = ahash::RandomState> {
  shards: Box<[CachePadded<Mutex<LruList<CacheKey, V>>>]>,
  capacity: u64,
  total_cost: CachePadded<AtomicU64>,
  hasher: H,
  metrics: Arc<Metrics>,
}

impl<V, H> fmt::Debug for MemoryStore<V, H> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("MemoryStore")
      .field("num_shards", &self.shards.len())
      .field("capacity", &self.capacity)
      .field("total_cost", &self.total_cost.load(Ordering::Relaxed))
      .finish_non_exhaustive()
  }
}

impl<V> MemoryStore<V> {
  /// Creates a store holding at most `capacity` total cost over `shards` shards.
  pub fn new(capacity: u64, shards: usize) -> Result<Self, BuildError> {
    Self::with_metrics(capacity, shards, ahash::RandomState::new(), Arc::new(Metrics::new()))
  }
}

impl<V, H: BuildHasher> MemoryStore<V, H> {
  pub(crate) fn with_metrics(
    capacity: u64,
    shards: usize,
    hasher: H,
    metrics: Arc<Metrics>,
  ) -> Result<Self, BuildError> {
    if capacity == 0 {
      return Err(BuildError::ZeroCapacity);
    }
    if shards == 0 {
      return Err(BuildError::ZeroShards);
    }
    let shards = (0..shards.next_power_of_two())
      .map(|_| CachePadded::new(Mutex::new(LruList::new())))
      .collect::<Vec<_>>()
      .into_boxed_slice();

    Ok(Self {
      shards,
      capacity,
      total_cost: CachePadded::new(AtomicU64::new(0)),
      hasher,
      metrics,
    })
  }

  #[inline]
  fn shard_index(&self, key: &CacheKey) -> usize {
    hash_key(&self.hasher, key) as usize & (self.shards.len() - 1)
  }

  #[inline]
  fn shard(&self, key: &CacheKey) -> &Mutex<LruList<CacheKey, V>> {
    &self.shards[self.shard_index(key)]
  }

  /// Total cost this store may hold.
  pub fn capacity(&self) -> u64 {
    self.capacity
  }

  /// Returns the value for `key`, marking it recently used.
  pub fn get(&self, key: &CacheKey) -> Option<Arc<V>> {
    let value = self.shard(key).lock().get(key);
    match value {
      Some(_) => Metrics::incr(&self.metrics.memory_hits),
      None => Metrics::incr(&self.metrics.memory_misses),
    }
    value
  }

  // Re-check used under the single-flight lock; must not skew hit/miss counts.
  pub(crate) fn get_uncounted(&self, key: &CacheKey) -> Option<Arc<V>> {
    self.shard(key).lock().get(key)
  }

  /// Inserts a value with the given cost, then evicts until the store is
  /// back within capacity.
  ///
  /// Returns `false` if the entry alone is larger than the whole capacity;
  /// such entries are never admitted.
  pub fn insert(&self, key: CacheKey, value: Arc<V>, cost: u64) -> bool {
    if cost > self.capacity {
      trace!(%key, cost, capacity = self.capacity, "entry larger than memory capacity, not admitted");
      Metrics::incr(&self.metrics.rejected);
      return false;
    }

    let home = self.shard_index(&key);
    {
      let mut shard = self.shards[home].lock();
      let before = shard.current_total_cost();
      shard.push_front(key, value, cost);
      let after = shard.current_total_cost();
      self.apply_cost_delta(before, after);
    }
    Metrics::incr(&self.metrics.inserts);

    // The new entry is the most recent in its shard and is kept there.
    self.evict_until(self.capacity, home, 1);
    true
  }

  /// Removes `key`, returning `true` if it was present.
  pub fn invalidate(&self, key: &CacheKey) -> bool {
    let removed = self.shard(key).lock().remove(key);
    match removed {
      Some(cost) => {
        self.sub_cost(cost);
        Metrics::incr(&self.metrics.invalidations);
        true
      }
      None => false,
    }
  }

  /// Evicts least recently used entries until the total cost is at most
  /// `target_cost`. Hook for platform memory-pressure signals.
  pub fn shrink_to(&self, target_cost: u64) {
    self.evict_until(target_cost, 0, 0);
  }

  /// Drops every entry.
  pub fn clear(&self) {
    for shard in self.shards.iter() {
      let mut shard = shard.lock();
      let cost = shard.current_total_cost();
      shard.clear();
      drop(shard);
      self.sub_cost(cost);
    }
  }

  /// Number of entries across all shards.
  pub fn len(&self) -> usize {
    self.shards.iter().map(|s| s.lock().len()).sum()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Total cost currently held.
  pub fn current_cost(&self) -> u64 {
    self.shards.iter().map(|s| s.lock().current_total_cost()).sum()
  }

  pub fn metrics(&self) -> MetricsSnapshot {
    self.metrics.snapshot()
  }

  /// Walks the shards once, starting at `home`, popping LRU entries while the
  /// total is above `target`. The first `keep_home` entries of the home shard
  /// are never popped.
  fn evict_until(&self, target: u64, home: usize, keep_home: usize) {
    let num_shards = self.shards.len();
    for offset in 0..num_shards {
      if self.total_cost.load(Ordering::Acquire) <= target {
        return;
      }
      let index = (home + offset) & (num_shards - 1);
      let keep = if offset == 0 { keep_home } else { 0 };

      let mut shard = self.shards[index].lock();
      let mut evicted = 0;
      while self.total_cost.load(Ordering::Acquire) > target && shard.len() > keep {
        match shard.pop_back() {
          Some((victim, cost)) => {
            trace!(key = %victim, "evicted from memory");
            self.sub_cost(cost);
            evicted += 1;
          }
          None => break,
        }
      }
      drop(shard);
      self
        .metrics
        .evicted_by_capacity
        .fetch_add(evicted, Ordering::Relaxed);
    }
  }

  fn sub_cost(&self, cost: u64) {
    self.total_cost.fetch_sub(cost, Ordering::AcqRel);
    self.metrics.current_cost.fetch_sub(cost, Ordering::Relaxed);
  }

  fn apply_cost_delta(&self, before: u64, after: u64) {
    if after >= before {
      self.total_cost.fetch_add(after - before, Ordering::AcqRel);
      self
        .metrics
        .current_cost
        .fetch_add(after - before, Ordering::Relaxed);
    } else {
      self.sub_cost(before - after);
    }
  }
}
